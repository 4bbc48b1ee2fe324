use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::events::{GameEvent, RoundOutcome};
use crate::game::scoring::{is_correct_pair, rank_by_distance, round_points};
use crate::game::stations::{station_bounds, Station};
use crate::geo::{BoundingBox, LatLng};
use crate::map::{MapSurface, Marker, MarkerId};

const EMERGENCY_POPUP: &str = "Fire Emergency! Select the two closest stations.";

/// Where the game is in its round cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the map to come up
    NotStarted,
    AwaitingFirstPick,
    AwaitingSecondPick,
    /// Both picks scored, next round not started yet
    Evaluated,
    GameOver,
}

/// A station the player clicked this round
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub station: usize,
    pub name: String,
    pub pos: LatLng,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameState {
    pub score: i64,
    /// 1-indexed once the first round starts
    pub round: u32,
    pub selections: Vec<Selection>,
}

/// Owns the game and drives a [`MapSurface`] through each round
pub struct RoundController<R = StdRng> {
    stations: Vec<Station>,
    bounds: BoundingBox,
    config: GameConfig,
    rng: R,
    state: GameState,
    phase: Phase,
    emergency: Option<LatLng>,
    station_markers: Vec<MarkerId>,
    history: Vec<RoundOutcome>,
}

impl RoundController<StdRng> {
    /// Controller seeded from `config.seed`, or from entropy without one
    pub fn from_config(stations: Vec<Station>, config: GameConfig) -> Result<Self, GameError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(stations, config, rng)
    }
}

impl<R: Rng> RoundController<R> {
    pub fn new(stations: Vec<Station>, config: GameConfig, rng: R) -> Result<Self, GameError> {
        let bounds = station_bounds(&stations).ok_or(GameError::NoStations)?;
        if stations.len() < 2 {
            return Err(GameError::TooFewStations(stations.len()));
        }

        Ok(Self {
            stations,
            bounds,
            config,
            rng,
            state: GameState::default(),
            phase: Phase::NotStarted,
            emergency: None,
            station_markers: Vec::new(),
            history: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn score(&self) -> i64 {
        self.state.score
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.config.max_rounds
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn emergency(&self) -> Option<LatLng> {
        self.emergency
    }

    pub fn history(&self) -> &[RoundOutcome] {
        &self.history
    }

    pub fn is_selected(&self, station: usize) -> bool {
        self.state.selections.iter().any(|s| s.station == station)
    }

    /// Start the next round with a random emergency inside the station box
    pub fn start_round(&mut self, map: &mut impl MapSurface) -> Vec<GameEvent> {
        let emergency = self.bounds.sample(&mut self.rng);
        self.start_round_at(map, emergency)
    }

    /// Start the next round with the emergency at `emergency`
    pub fn start_round_at(&mut self, map: &mut impl MapSurface, emergency: LatLng) -> Vec<GameEvent> {
        if self.phase == Phase::GameOver {
            return Vec::new();
        }
        if self.state.round == 0 {
            self.state.round = 1;
        }

        map.clear_markers();
        self.station_markers.clear();
        self.state.selections.clear();
        self.emergency = Some(emergency);

        let emergency_marker = map.add_marker(Marker::emergency(emergency, EMERGENCY_POPUP));
        map.open_popup(emergency_marker);

        let mut view = BoundingBox::from_points([emergency]).unwrap_or(self.bounds);
        for (index, station) in self.stations.iter().enumerate() {
            let id = map.add_marker(Marker::station(index, station.pos, station.name.clone()));
            self.station_markers.push(id);
            view.extend(station.pos);
        }
        map.fit_bounds(view, self.config.padding);

        self.phase = Phase::AwaitingFirstPick;
        info!(
            round = self.state.round,
            lat = emergency.lat,
            lon = emergency.lon,
            "round started"
        );

        vec![GameEvent::RoundStarted {
            round: self.state.round,
            max_rounds: self.config.max_rounds,
        }]
    }

    /// Record a pick. Returns no events when the click is ignored.
    pub fn handle_station_click(&mut self, map: &mut impl MapSurface, station: usize) -> Vec<GameEvent> {
        if !matches!(self.phase, Phase::AwaitingFirstPick | Phase::AwaitingSecondPick) {
            return Vec::new();
        }
        if self.state.selections.len() >= 2 || self.is_selected(station) {
            return Vec::new();
        }
        let Some(picked) = self.stations.get(station) else {
            return Vec::new();
        };

        self.state.selections.push(Selection {
            station,
            name: picked.name.clone(),
            pos: picked.pos,
        });
        if let Some(&id) = self.station_markers.get(station) {
            map.mark_selected(id);
            map.open_popup(id);
        }

        let ordinal = self.state.selections.len();
        debug!(station = %picked.name, ordinal, "station picked");
        let mut events = vec![GameEvent::StationPicked {
            name: picked.name.clone(),
            ordinal,
        }];

        if ordinal == 2 {
            events.extend(self.check_selections(map));
        } else {
            self.phase = Phase::AwaitingSecondPick;
        }
        events
    }

    /// Score the two picks against the true nearest pair, then move on to
    /// the next round or end the game
    pub fn check_selections(&mut self, map: &mut impl MapSurface) -> Vec<GameEvent> {
        if self.phase != Phase::AwaitingSecondPick {
            return Vec::new();
        }
        let Some(emergency) = self.emergency else {
            return Vec::new();
        };
        let [first, second] = match self.state.selections.as_slice() {
            [a, b] => [a.clone(), b.clone()],
            _ => return Vec::new(),
        };

        let ranked = rank_by_distance(&self.stations, emergency, |a, b| map.distance_m(a, b));
        let nearest = [ranked[0].name.clone(), ranked[1].name.clone()];
        let correct = is_correct_pair(
            [first.name.as_str(), second.name.as_str()],
            [nearest[0].as_str(), nearest[1].as_str()],
        );
        let average_distance_m =
            (map.distance_m(emergency, first.pos) + map.distance_m(emergency, second.pos)) / 2.0;
        let points = round_points(correct, average_distance_m);
        self.state.score += points;

        let outcome = RoundOutcome {
            round: self.state.round,
            picked: [first.name, second.name],
            nearest,
            emergency,
            correct,
            average_distance_m,
            points,
            total: self.state.score,
        };
        info!(
            round = outcome.round,
            correct,
            points,
            total = outcome.total,
            avg_m = average_distance_m,
            "round evaluated"
        );

        self.history.push(outcome.clone());
        self.phase = Phase::Evaluated;

        let mut events = vec![GameEvent::RoundEvaluated(outcome)];
        events.extend(self.advance(map));
        events
    }

    /// Leave `Evaluated`: start the next round or finish the game
    fn advance(&mut self, map: &mut impl MapSurface) -> Vec<GameEvent> {
        if self.state.round >= self.config.max_rounds {
            self.phase = Phase::GameOver;
            info!(score = self.state.score, rounds = self.state.round, "game over");
            return vec![GameEvent::GameOver {
                score: self.state.score,
                rounds: self.state.round,
            }];
        }
        self.state.round += 1;
        self.start_round(map)
    }

    /// Throw away the current game and start again from round 1
    pub fn restart(&mut self, map: &mut impl MapSurface) -> Vec<GameEvent> {
        self.state = GameState::default();
        self.history.clear();
        self.phase = Phase::NotStarted;
        self.start_round(map)
    }
}
