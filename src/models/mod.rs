pub mod client;
pub mod coordinates;
pub mod invasion;
pub mod route;

pub use client::{normalize_clients, Client};
pub use coordinates::Coordinates;
pub use invasion::{Invasion, InvasionStats, Seller, SellerInvasions};
pub use route::{enumerate, PlanSummary, RouteDay, RoutePlan, SequencedClient};
