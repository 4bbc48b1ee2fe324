use crate::geo::{BoundingBox, LatLng};

/// A fire station on the board
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub name: String,
    pub pos: LatLng,
}

impl Station {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            pos: LatLng::new(lat, lon),
        }
    }
}

/// South-east Melbourne stations used by the default game
const DEFAULT_STATIONS: [(&str, f64, f64); 7] = [
    ("FRV 88 Hallam Fire Station", -38.004075, 145.274025),
    ("Devon Meadows Fire Station", -38.158238, 145.301785),
    ("FRV 92 Cranbourne Fire Station", -38.103696, 145.284140),
    ("Narre Warren Fire Station", -38.057891, 145.300831),
    ("Hampton Park Fire Station", -38.031041, 145.258489),
    ("Clyde North Fire Station", -38.091732, 145.340497),
    ("Berwick Fire Station", -38.037256, 145.344073),
];

pub fn default_stations() -> Vec<Station> {
    DEFAULT_STATIONS
        .iter()
        .map(|&(name, lat, lon)| Station::new(name, lat, lon))
        .collect()
}

/// Bounding box of all stations. Emergencies are drawn from inside it.
pub fn station_bounds(stations: &[Station]) -> Option<BoundingBox> {
    BoundingBox::from_points(stations.iter().map(|s| s.pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_stations_unique() {
        let stations = default_stations();
        assert_eq!(stations.len(), 7);
        let names: HashSet<_> = stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_station_bounds() {
        let bbox = station_bounds(&default_stations()).unwrap();
        assert_eq!(bbox.min_lat, -38.158238);
        assert_eq!(bbox.max_lat, -38.004075);
        assert_eq!(bbox.min_lon, 145.258489);
        assert_eq!(bbox.max_lon, 145.344073);
        assert!(station_bounds(&[]).is_none());
    }
}
