use std::f64::consts::PI;

use crate::geo::{BoundingBox, LatLng};

pub const MIN_ZOOM: f64 = 0.5;
/// Deep enough to frame a suburb on an 80-column terminal
pub const MAX_ZOOM: f64 = 1_000_000.0;
const ZOOM_STEP: f64 = 1.5;
const MAX_LAT: f64 = 85.0;

/// Web Mercator x in [0, 1)
#[inline(always)]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y in [0, 1], 0 at the top
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Visible map area and zoom level, in Braille pixels
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Whole-world view, used until the first fit
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Pixels per Mercator unit
    #[inline(always)]
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        let x = mercator_x(self.center_lon) + dx as f64 / scale;
        let y = mercator_y(self.center_lat) + dy as f64 / scale;

        self.center_lon = x * 360.0 - 180.0;
        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = inverse_mercator_y(y).clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom by factor keeping the point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Center on `bounds` grown by `padding` and pick the largest zoom at
    /// which the whole box is visible
    pub fn fit_bounds(&mut self, bounds: BoundingBox, padding: f64) {
        let padded = bounds.pad(padding);

        let x0 = mercator_x(padded.min_lon);
        let x1 = mercator_x(padded.max_lon);
        // y grows southwards
        let y0 = mercator_y(padded.max_lat.min(MAX_LAT));
        let y1 = mercator_y(padded.min_lat.max(-MAX_LAT));

        self.center_lon = (padded.min_lon + padded.max_lon) / 2.0;
        self.center_lat = inverse_mercator_y((y0 + y1) / 2.0);

        let width = self.width.max(1) as f64;
        let height = self.height.max(1) as f64;
        let zoom_x = if x1 > x0 { 1.0 / (x1 - x0) } else { MAX_ZOOM };
        let zoom_y = if y1 > y0 { height / (width * (y1 - y0)) } else { MAX_ZOOM };
        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);
        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;
        (px.round() as i32, py.round() as i32)
    }

    pub fn project_point(&self, p: LatLng) -> (i32, i32) {
        self.project(p.lon, p.lat)
    }

    /// Check if a projected point is on the canvas
    pub fn contains_pixel(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_unproject_roundtrip_center() {
        let vp = Viewport::new(145.3, -38.07, 5000.0, 160, 96);
        let (lon, lat) = vp.unproject(80, 48);
        assert!((lon - 145.3).abs() < 1e-9);
        assert!((lat + 38.07).abs() < 1e-9);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::new(0.0, 0.0, MAX_ZOOM, 100, 100);
        vp.zoom_in();
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom = MIN_ZOOM;
        vp.zoom_out();
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_at_keeps_point() {
        let mut vp = Viewport::new(145.3, -38.07, 3000.0, 200, 120);
        let before = vp.unproject(30, 20);
        vp.zoom_in_at(30, 20);
        let (px, py) = vp.project(before.0, before.1);
        assert!((px - 30).abs() <= 1 && (py - 20).abs() <= 1);
    }

    #[test]
    fn test_fit_bounds_shows_corners() {
        let bounds = BoundingBox {
            min_lat: -38.158238,
            max_lat: -38.004075,
            min_lon: 145.258489,
            max_lon: 145.344073,
        };
        for (w, h) in [(160, 96), (300, 60), (60, 200)] {
            let mut vp = Viewport::world(w, h);
            vp.fit_bounds(bounds, 0.2);
            for (lon, lat) in [
                (bounds.min_lon, bounds.min_lat),
                (bounds.min_lon, bounds.max_lat),
                (bounds.max_lon, bounds.min_lat),
                (bounds.max_lon, bounds.max_lat),
            ] {
                let (px, py) = vp.project(lon, lat);
                assert!(vp.contains_pixel(px, py), "{w}x{h}: ({px}, {py}) off canvas");
            }
            assert!(vp.zoom > 100.0);
        }
    }

    #[test]
    fn test_fit_single_point() {
        let p = LatLng::new(-38.0, 145.0);
        let mut vp = Viewport::world(100, 100);
        vp.fit_bounds(BoundingBox::from_points([p]).unwrap(), 0.2);
        assert_eq!(vp.zoom, MAX_ZOOM);
        assert_eq!(vp.project_point(p), (50, 50));
    }
}
