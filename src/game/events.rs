use crate::geo::LatLng;

/// Result of one evaluated round
#[derive(Clone, Debug, PartialEq)]
pub struct RoundOutcome {
    pub round: u32,
    /// Picked station names in click order
    pub picked: [String; 2],
    /// True nearest two, closest first
    pub nearest: [String; 2],
    pub emergency: LatLng,
    pub correct: bool,
    /// Mean distance from the emergency to the two picked stations
    pub average_distance_m: f64,
    pub points: i64,
    /// Running score after this round
    pub total: i64,
}

/// Everything the controller tells the presentation layer
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RoundStarted { round: u32, max_rounds: u32 },
    StationPicked { name: String, ordinal: usize },
    RoundEvaluated(RoundOutcome),
    GameOver { score: i64, rounds: u32 },
}

impl GameEvent {
    /// Replacement text for the status line, if this event changes it
    pub fn status(&self) -> Option<String> {
        match self {
            GameEvent::RoundStarted { round, max_rounds } => Some(format!(
                "Round {round}/{max_rounds}: Select the TWO closest fire stations to the emergency (click one, then the next)."
            )),
            GameEvent::GameOver { .. } => Some("Game over. Press n to play again.".to_string()),
            _ => None,
        }
    }

    /// Modal alert text, if this event warrants one
    pub fn alert(&self) -> Option<String> {
        match self {
            GameEvent::StationPicked { name, ordinal: 1 } => Some(format!(
                "Selected {name} as #1. Now pick the next closest."
            )),
            // the second pick is answered by the evaluation
            GameEvent::RoundStarted { .. } | GameEvent::StationPicked { .. } => None,
            GameEvent::RoundEvaluated(outcome) => {
                let nearest = outcome.nearest.join(", ");
                Some(if outcome.correct {
                    format!(
                        "Correct! The two closest are {nearest}. Round score: {}",
                        outcome.points
                    )
                } else {
                    format!("No Radar!! – Wrong! The two closest are {nearest}.")
                })
            }
            GameEvent::GameOver { score, .. } => Some(format!(
                "Game Over! Total Score: {score}. Thanks for playing!"
            )),
        }
    }
}
