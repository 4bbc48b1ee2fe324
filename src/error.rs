use std::time::Duration;

use thiserror::Error;

/// Failures that end the game before it can be played
#[derive(Debug, Error)]
pub enum GameError {
    #[error("map failed to initialize: {0}")]
    MapInit(String),
    #[error("map not ready after {}ms, check the basemap and try again", .0.as_millis())]
    MapNotReady(Duration),
    #[error("no stations configured")]
    NoStations,
    #[error("need at least two stations to play, got {0}")]
    TooFewStations(usize),
}
