use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Pick the two fire stations closest to each emergency
#[derive(Debug, Parser)]
#[command(name = "pick-the-appliance", version, about)]
pub struct Args {
    /// Number of rounds in a game
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub rounds: u32,
    /// Seed for emergency placement (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Margin around the markers when fitting the view, as a fraction of the span
    #[arg(long, default_value_t = 0.2)]
    pub padding: f64,
    /// GeoJSON file drawn under the markers
    #[arg(long)]
    pub basemap: Option<PathBuf>,
    /// How long to wait for the map before giving up
    #[arg(long, default_value_t = 1500)]
    pub startup_timeout_ms: u64,
    /// Write logs here (the terminal is taken by the map)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Game settings derived from the command line
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub max_rounds: u32,
    pub padding: f64,
    pub seed: Option<u64>,
    pub startup_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            padding: 0.2,
            seed: None,
            startup_timeout: Duration::from_millis(1500),
        }
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            max_rounds: args.rounds,
            // Negative padding would shrink the view below the markers
            padding: args.padding.max(0.0),
            seed: args.seed,
            startup_timeout: Duration::from_millis(args.startup_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pick-the-appliance"]).unwrap();
        assert_eq!(GameConfig::from(&args), GameConfig::default());
        assert!(args.basemap.is_none());
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "pick-the-appliance",
            "--rounds",
            "3",
            "--seed",
            "42",
            "--padding",
            "0.5",
            "--startup-timeout-ms",
            "250",
            "--basemap",
            "data/coast.geojson",
        ])
        .unwrap();
        let config = GameConfig::from(&args);
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.padding, 0.5);
        assert_eq!(config.startup_timeout, Duration::from_millis(250));
        assert_eq!(args.basemap, Some(PathBuf::from("data/coast.geojson")));
    }

    #[test]
    fn test_zero_rounds_rejected() {
        assert!(Args::try_parse_from(["pick-the-appliance", "--rounds", "0"]).is_err());
    }

    #[test]
    fn test_negative_padding_clamped() {
        let args = Args::try_parse_from(["pick-the-appliance", "--padding=-1"]).unwrap();
        assert_eq!(GameConfig::from(&args).padding, 0.0);
    }
}
