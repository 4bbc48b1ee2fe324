//! Pick the Appliance: a terminal map game. An emergency appears somewhere
//! among a fixed set of fire stations and the player picks the two stations
//! they think are closest to it.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod game;
pub mod geo;
pub mod logging;
pub mod map;
pub mod ui;
