use std::cmp::Ordering;

use crate::game::stations::Station;
use crate::geo::LatLng;

/// Points for a correct pick at zero distance, before the bonus
pub const BASE_POINTS: i64 = 100;
/// Added to every correct pick
pub const CORRECT_BONUS: i64 = 20;
/// Flat penalty for a wrong pick
pub const WRONG_PENALTY: i64 = -50;
/// One point lost per this many meters of average distance
pub const METERS_PER_POINT: f64 = 100.0;

/// A station with its distance to the emergency
#[derive(Clone, Debug, PartialEq)]
pub struct Ranked {
    pub name: String,
    pub pos: LatLng,
    pub distance_m: f64,
}

/// Rank every station by distance to `emergency`, closest first.
/// Equal distances are ordered by name so the result does not depend on
/// the input order.
pub fn rank_by_distance(
    stations: &[Station],
    emergency: LatLng,
    distance: impl Fn(LatLng, LatLng) -> f64,
) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = stations
        .iter()
        .map(|s| Ranked {
            name: s.name.clone(),
            pos: s.pos,
            distance_m: distance(emergency, s.pos),
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_m
            .partial_cmp(&b.distance_m)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

/// Whether the picked names are exactly the two nearest, in any order
pub fn is_correct_pair(picked: [&str; 2], nearest: [&str; 2]) -> bool {
    let mut picked = picked;
    let mut nearest = nearest;
    picked.sort_unstable();
    nearest.sort_unstable();
    picked == nearest
}

/// Points for one round.
///
/// Correct: `max(0, 100 - floor(avg / 100)) + 20`, so 120 at zero distance
/// down to 20 for anything 10 km or more away. Wrong: -50 regardless of
/// distance.
pub fn round_points(correct: bool, average_distance_m: f64) -> i64 {
    if !correct {
        return WRONG_PENALTY;
    }
    let lost = (average_distance_m / METERS_PER_POINT).floor();
    // Saturating float->int cast keeps huge distances at the floor
    let lost = if lost.is_finite() { lost as i64 } else { i64::MAX };
    (BASE_POINTS.saturating_sub(lost)).max(0) + CORRECT_BONUS
}
