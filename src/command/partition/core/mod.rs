pub mod core;
pub mod params;
pub mod state;
