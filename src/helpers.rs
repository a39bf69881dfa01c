pub mod guard;
pub mod params;
