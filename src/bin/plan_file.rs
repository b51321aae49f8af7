use fieldroute::config::{Config, PlannerConfig};
use fieldroute::models::{Coordinates, RoutePlan};
use fieldroute::AppState;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        "\
Usage: plan_file <input.json> [OPTIONS]

The input is a JSON array of client records or an object with a `clientes` array.

Options:
  --days=N              Number of days to plan (default: 10)
  --start=LAT,LON       Fixed starting point for every day
  --offline             Skip VROOM and ORS; use local tours and straight lines
  --json                Print the plan as JSON
  --help                Show this help message"
    );
}

fn parse_start(raw: &str) -> Result<Coordinates, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("Expected LAT,LON, got '{}'", raw))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("Invalid latitude '{}'", lat))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("Invalid longitude '{}'", lon))?;
    Coordinates::new(lat, lon)
}

fn client_records(input: Value) -> Result<Vec<Value>, String> {
    match input {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("clientes") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err("Input object has no `clientes` array".to_string()),
        },
        _ => Err("Input must be an array or an object with `clientes`".to_string()),
    }
}

fn print_summary(plan: &RoutePlan) {
    let summary = &plan.summary;
    println!(
        "{} clients, {} days (requested {}, target {} per day{})",
        summary.total_clients,
        summary.effective_days,
        summary.requested_days,
        summary.target_per_day,
        if summary.clamped { ", adjusted" } else { "" }
    );
    println!("{}", "-".repeat(60));
    for day in &plan.days {
        let first = day.clients.first().map(|c| c.client.name.as_str()).unwrap_or("-");
        let last = day.clients.last().map(|c| c.client.name.as_str()).unwrap_or("-");
        println!(
            "{:<8} {:>4} clients {:>6} path points  {} -> {}",
            day.label,
            day.clients.len(),
            day.geometry.len(),
            first,
            last
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (quiet unless something goes wrong)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldroute=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let Some(path) = args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from) else {
        print_help();
        return Err("Missing input file".into());
    };
    let days: Option<usize> = args
        .iter()
        .find_map(|a| a.strip_prefix("--days="))
        .map(|s| s.parse().map_err(|_| format!("Invalid --days value '{}'", s)))
        .transpose()?;
    let start = args
        .iter()
        .find_map(|a| a.strip_prefix("--start="))
        .map(parse_start)
        .transpose()?;
    let offline = args.iter().any(|a| a == "--offline");
    let json_output = args.iter().any(|a| a == "--json");

    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let records = client_records(serde_json::from_str(&text)?)?;

    let state = if offline {
        dotenv::dotenv().ok();
        AppState::offline(PlannerConfig::from_env()?)
    } else {
        let config = Config::from_env().map_err(|e| format!("Config error: {}", e))?;
        AppState::from_config(&config)
    };

    let plan = state.planner.plan(&records, days, start).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_summary(&plan);
    }

    Ok(())
}
