mod controller;
mod events;
pub mod scoring;
mod stations;

pub use controller::{GameState, Phase, RoundController, Selection};
pub use events::{GameEvent, RoundOutcome};
pub use stations::{default_stations, station_bounds, Station};
