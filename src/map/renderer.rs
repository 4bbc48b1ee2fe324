use crate::braille::BrailleCanvas;
use crate::geo::BoundingBox;
use crate::map::geometry::{clip_line, draw_crosshair, draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::map::surface::{MapSurface, Marker, MarkerId, MarkerKind};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// How a marker glyph should be styled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphKind {
    Emergency,
    Station,
    /// Picked this round
    Faded,
}

/// A marker glyph at a character cell, with an optional label to its right
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub col: u16,
    pub row: u16,
    pub ch: char,
    pub kind: GlyphKind,
    pub label: Option<String>,
}

/// Everything the UI needs to paint one frame of the map
pub struct MapLayers {
    pub basemap: BrailleCanvas,
    /// Ring and crosshair around the emergency
    pub overlay: BrailleCanvas,
    pub glyphs: Vec<Glyph>,
    /// Open popup: anchor cell and text
    pub popup: Option<(u16, u16, String)>,
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_basemap: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_basemap: true,
            show_labels: true,
        }
    }
}

/// Map renderer: basemap outlines plus game markers over a Mercator viewport
pub struct MapRenderer {
    pub viewport: Viewport,
    pub basemap: Vec<LineString>,
    pub settings: DisplaySettings,
    markers: Vec<Marker>,
    popup: Option<MarkerId>,
    /// Last bounds passed to `fit_bounds`, for refitting after a resize
    last_fit: Option<(BoundingBox, f64)>,
}

impl MapRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            basemap: Vec::new(),
            settings: DisplaySettings::default(),
            markers: Vec::new(),
            popup: None,
            last_fit: None,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn popup(&self) -> Option<&Marker> {
        self.popup.and_then(|id| self.markers.get(id.0))
    }

    /// Check if any basemap data is loaded
    pub fn has_data(&self) -> bool {
        !self.basemap.is_empty()
    }

    /// Resize the canvas in Braille pixels, keeping the last fit if any
    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport.width = width;
        self.viewport.height = height;
        if let Some((bounds, padding)) = self.last_fit {
            self.viewport.fit_bounds(bounds, padding);
        }
    }

    /// Fit the view to the markers again after the user panned away
    pub fn refit(&mut self) {
        if let Some((bounds, padding)) = self.last_fit {
            self.viewport.fit_bounds(bounds, padding);
        }
    }

    /// Character cell a marker lands on, if it is on screen
    fn marker_cell(&self, viewport: &Viewport, marker: &Marker) -> Option<(u16, u16)> {
        let (px, py) = viewport.project_point(marker.pos);
        if !viewport.contains_pixel(px, py) {
            return None;
        }
        Some(((px / 2) as u16, (py / 4) as u16))
    }

    fn label_for(marker: &Marker) -> String {
        match marker.kind {
            MarkerKind::Emergency => String::new(),
            MarkerKind::Station(index) => format!("{} {}", index + 1, marker.popup),
        }
    }

    /// Station under the character cell (col, row) of the map area.
    /// Hits the glyph itself, the cell either side of it, or its label.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<usize> {
        let mut best: Option<(u16, usize)> = None;

        for marker in self.markers.iter().filter(|m| m.is_clickable()) {
            let MarkerKind::Station(index) = marker.kind else {
                continue;
            };
            let Some((cx, cy)) = self.marker_cell(&self.viewport, marker) else {
                continue;
            };
            if cy != row {
                continue;
            }

            let on_glyph = cx.abs_diff(col) <= 1;
            let label_len = Self::label_for(marker).chars().count() as u16;
            let on_label = self.settings.show_labels
                && col >= cx.saturating_add(2)
                && col < cx.saturating_add(2).saturating_add(label_len);

            if on_glyph || on_label {
                let dist = cx.abs_diff(col);
                if best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, index));
                }
            }
        }

        best.map(|(_, index)| index)
    }

    /// Render all layers for a canvas of `cols` x `rows` characters
    pub fn render(&self, cols: usize, rows: usize, viewport: &Viewport) -> MapLayers {
        let mut basemap = BrailleCanvas::new(cols, rows);
        let mut overlay = BrailleCanvas::new(cols, rows);

        if self.settings.show_basemap {
            for line in &self.basemap {
                self.draw_linestring(&mut basemap, line, viewport);
            }
        }

        let mut glyphs = Vec::with_capacity(self.markers.len());
        for marker in &self.markers {
            let Some((col, row)) = self.marker_cell(viewport, marker) else {
                continue;
            };
            let (ch, kind) = match marker.kind {
                MarkerKind::Emergency => {
                    let (px, py) = viewport.project_point(marker.pos);
                    draw_ring(&mut overlay, px, py, 6);
                    draw_crosshair(&mut overlay, px, py, 3);
                    ('▲', GlyphKind::Emergency)
                }
                MarkerKind::Station(_) if marker.selected => ('○', GlyphKind::Faded),
                MarkerKind::Station(_) => ('●', GlyphKind::Station),
            };
            let label = match marker.kind {
                MarkerKind::Station(_) if self.settings.show_labels => Some(Self::label_for(marker)),
                _ => None,
            };
            glyphs.push(Glyph { col, row, ch, kind, label });
        }

        let popup = self.popup.and_then(|id| {
            let marker = self.markers.get(id.0)?;
            let (col, row) = self.marker_cell(viewport, marker)?;
            Some((col, row, marker.popup.clone()))
        });

        MapLayers {
            basemap,
            overlay,
            glyphs,
            popup,
        }
    }

    /// Draw a linestring with viewport culling
    fn draw_linestring(&self, canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
        if line.len() < 2 {
            return;
        }

        let mut prev: Option<(f64, (i32, i32))> = None;

        for &(lon, lat) in line {
            let p = viewport.project(lon, lat);

            if let Some((prev_lon, prev_p)) = prev {
                // Skip segments that wrap around the antimeridian
                if (lon - prev_lon).abs() < 180.0 && viewport.line_might_be_visible(prev_p, p) {
                    if let Some((a, b)) = clip_line(prev_p, p, viewport.width, viewport.height) {
                        draw_line(canvas, a.0, a.1, b.0, b.1);
                    }
                }
            }

            prev = Some((lon, p));
        }
    }

    /// Toggle station labels
    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Toggle the basemap
    pub fn toggle_basemap(&mut self) {
        self.settings.show_basemap = !self.settings.show_basemap;
    }
}

impl MapSurface for MapRenderer {
    fn clear_markers(&mut self) {
        self.markers.clear();
        self.popup = None;
    }

    fn add_marker(&mut self, marker: Marker) -> MarkerId {
        self.markers.push(marker);
        MarkerId(self.markers.len() - 1)
    }

    fn mark_selected(&mut self, id: MarkerId) {
        if let Some(marker) = self.markers.get_mut(id.0) {
            marker.selected = true;
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        if id.0 < self.markers.len() {
            self.popup = Some(id);
        }
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, padding: f64) {
        self.last_fit = Some((bounds, padding));
        self.viewport.fit_bounds(bounds, padding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;

    fn renderer() -> MapRenderer {
        // 40x20 characters
        let mut map = MapRenderer::new(Viewport::world(80, 80));
        map.add_marker(Marker::emergency(LatLng::new(-38.05, 145.30), "Fire!"));
        map.add_marker(Marker::station(0, LatLng::new(-38.00, 145.26), "West"));
        map.add_marker(Marker::station(1, LatLng::new(-38.10, 145.34), "East"));
        let bounds = BoundingBox::from_points(map.markers.iter().map(|m| m.pos)).unwrap();
        map.fit_bounds(bounds, 0.2);
        map
    }

    fn cell_of(map: &MapRenderer, id: usize) -> (u16, u16) {
        map.marker_cell(&map.viewport, &map.markers[id]).unwrap()
    }

    #[test]
    fn test_render_places_glyphs() {
        let map = renderer();
        let layers = map.render(40, 20, &map.viewport);
        assert_eq!(layers.glyphs.len(), 3);
        assert_eq!(layers.glyphs[0].kind, GlyphKind::Emergency);
        assert_eq!(layers.glyphs[1].label.as_deref(), Some("1 West"));
        assert!(layers.popup.is_none());
        // emergency ring drawn
        assert!((0..20).any(|row| (0..40).any(|col| layers.overlay.glyph(col, row).is_some())));
    }

    #[test]
    fn test_selected_marker_faded_and_not_clickable() {
        let mut map = renderer();
        let (col, row) = cell_of(&map, 2);
        assert_eq!(map.hit_test(col, row), Some(1));

        map.mark_selected(MarkerId(2));
        assert_eq!(map.hit_test(col, row), None);
        let layers = map.render(40, 20, &map.viewport);
        assert_eq!(layers.glyphs[2].kind, GlyphKind::Faded);
        assert_eq!(layers.glyphs[2].ch, '○');
    }

    #[test]
    fn test_hit_test_label_and_miss() {
        let map = renderer();
        let (col, row) = cell_of(&map, 1);
        assert_eq!(map.hit_test(col + 1, row), Some(0));
        assert_eq!(map.hit_test(col + 3, row), Some(0));
        // emergency is never clickable
        let (ecol, erow) = cell_of(&map, 0);
        assert_eq!(map.hit_test(ecol, erow), None);
        // a row without markers
        let used: Vec<u16> = (0..3).map(|id| cell_of(&map, id).1).collect();
        let empty = (0..20).find(|r| !used.contains(r)).unwrap();
        assert_eq!(map.hit_test(col, empty), None);
    }

    #[test]
    fn test_popup_follows_marker() {
        let mut map = renderer();
        map.open_popup(MarkerId(0));
        assert_eq!(map.popup().map(|m| m.popup.as_str()), Some("Fire!"));
        let layers = map.render(40, 20, &map.viewport);
        let (col, row) = cell_of(&map, 0);
        assert_eq!(layers.popup, Some((col, row, "Fire!".to_string())));

        map.open_popup(MarkerId(42));
        assert_eq!(map.popup().map(|m| m.popup.as_str()), Some("Fire!"));

        map.clear_markers();
        assert!(map.popup().is_none());
        assert!(map.markers().is_empty());
    }

    #[test]
    fn test_resize_refits() {
        let mut map = renderer();
        map.resize(200, 120);
        for id in 0..3 {
            let (px, py) = map.viewport.project_point(map.markers[id].pos);
            assert!(map.viewport.contains_pixel(px, py));
        }
    }

    #[test]
    fn test_basemap_drawn() {
        let mut map = renderer();
        map.basemap.push(vec![(145.20, -38.05), (145.40, -38.05)]);
        assert!(map.has_data());
        let layers = map.render(40, 20, &map.viewport);
        assert!(layers.basemap.rows().any(|r| r.chars().any(|c| c != '\u{2800}')));

        map.toggle_basemap();
        let layers = map.render(40, 20, &map.viewport);
        assert!(layers.basemap.rows().all(|r| r.chars().all(|c| c == '\u{2800}')));
    }
}
