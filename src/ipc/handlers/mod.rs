pub mod classrooms;
pub mod core;
pub mod documents;
pub mod params;
pub mod plan;
pub mod roster;
pub mod session;
