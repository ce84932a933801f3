pub mod controller;
pub mod distance;
pub mod geocode;
pub mod hubs;
pub mod map;
mod suggester;

pub use suggester::Suggester;
