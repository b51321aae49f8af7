pub mod collaborators;
pub mod invasions;
pub mod ors;
pub mod planner;
pub mod route_geometry;
pub mod vroom;
