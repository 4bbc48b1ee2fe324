use crate::map::LineString;
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::{info, warn};

/// Readiness signal from the map loader
#[derive(Debug)]
pub enum MapEvent {
    Ready(Vec<LineString>),
    Failed(String),
}

/// Load the basemap off the UI thread. Exactly one event arrives on the
/// returned channel.
pub fn spawn_loader(basemap: Option<PathBuf>) -> Receiver<MapEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let event = match basemap {
            Some(path) => match load_basemap(&path) {
                Ok(lines) => {
                    info!(path = %path.display(), lines = lines.len(), "basemap loaded");
                    MapEvent::Ready(lines)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "basemap failed to load");
                    MapEvent::Failed(format!("{e:#}"))
                }
            },
            None => MapEvent::Ready(builtin_outline()),
        };
        // The receiver is gone if the app quit during startup
        let _ = tx.send(event);
    });
    rx
}

/// Load every line and polygon outline from a GeoJSON file
pub fn load_basemap(path: &Path) -> Result<Vec<LineString>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Rough outline of the bays and main roads around the default stations,
/// drawn when no basemap file is given
pub fn builtin_outline() -> Vec<LineString> {
    vec![
        // Port Phillip, east shore
        vec![
            (145.030, -37.880), (145.060, -37.960), (145.090, -38.010),
            (145.110, -38.080), (145.125, -38.145), (145.095, -38.200),
            (145.040, -38.250), (145.000, -38.300),
        ],
        // Western Port, north shore
        vec![
            (145.180, -38.350), (145.240, -38.260), (145.300, -38.220),
            (145.370, -38.215), (145.440, -38.230), (145.500, -38.270),
            (145.540, -38.330),
        ],
        // Monash Freeway / Princes Highway
        vec![
            (145.150, -37.940), (145.200, -37.975), (145.250, -37.995),
            (145.300, -38.015), (145.350, -38.040), (145.420, -38.060),
        ],
        // South Gippsland Highway
        vec![
            (145.230, -38.000), (145.260, -38.040), (145.280, -38.090),
            (145.300, -38.140), (145.340, -38.190), (145.380, -38.215),
        ],
        // Western Port Highway
        vec![
            (145.250, -38.010), (145.230, -38.090), (145.210, -38.170),
            (145.200, -38.260),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pick-the-appliance-{}-{name}", std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_basemap_geometries() {
        let path = write_temp(
            "ok.geojson",
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "properties": {}, "geometry":
                        {"type": "LineString", "coordinates": [[145.0, -38.0], [145.1, -38.1]]}},
                    {"type": "Feature", "properties": {}, "geometry":
                        {"type": "Polygon", "coordinates": [[[145.0, -38.0], [145.1, -38.0], [145.1, -38.1], [145.0, -38.0]]]}},
                    {"type": "Feature", "properties": {}, "geometry":
                        {"type": "Point", "coordinates": [145.0, -38.0]}}
                ]
            }"#,
        );
        let lines = load_basemap(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![(145.0, -38.0), (145.1, -38.1)]);
        assert_eq!(lines[1].len(), 4);
    }

    #[test]
    fn test_load_basemap_errors() {
        let missing = std::env::temp_dir().join("pick-the-appliance-does-not-exist.geojson");
        let err = load_basemap(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("reading"));

        let path = write_temp("bad.geojson", "{ not json");
        let err = load_basemap(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("parsing"));
    }

    #[test]
    fn test_loader_signals_ready_with_outline() {
        let rx = spawn_loader(None);
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            MapEvent::Ready(lines) => assert_eq!(lines, builtin_outline()),
            MapEvent::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[test]
    fn test_loader_signals_failure() {
        let rx = spawn_loader(Some(PathBuf::from("/nonexistent/basemap.geojson")));
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            MapEvent::Failed(_)
        ));
    }
}
