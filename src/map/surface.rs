use crate::geo::{haversine_m, BoundingBox, LatLng};

/// Handle returned by [`MapSurface::add_marker`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Emergency,
    /// Index into the controller's station list
    Station(usize),
}

/// A marker placed on the map
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub pos: LatLng,
    pub kind: MarkerKind,
    /// Text shown when the popup is open
    pub popup: String,
    /// Picked this round: drawn faded and no longer clickable
    pub selected: bool,
}

impl Marker {
    pub fn emergency(pos: LatLng, popup: impl Into<String>) -> Self {
        Self {
            pos,
            kind: MarkerKind::Emergency,
            popup: popup.into(),
            selected: false,
        }
    }

    pub fn station(index: usize, pos: LatLng, popup: impl Into<String>) -> Self {
        Self {
            pos,
            kind: MarkerKind::Station(index),
            popup: popup.into(),
            selected: false,
        }
    }

    pub fn is_clickable(&self) -> bool {
        matches!(self.kind, MarkerKind::Station(_)) && !self.selected
    }
}

/// What the round controller needs from a map.
///
/// Click delivery is the caller's job: whoever owns the event loop
/// resolves a click to a station and calls the controller.
pub trait MapSurface {
    /// Remove every marker and close any popup
    fn clear_markers(&mut self);

    fn add_marker(&mut self, marker: Marker) -> MarkerId;

    /// Fade a marker and stop it from accepting clicks
    fn mark_selected(&mut self, id: MarkerId);

    fn open_popup(&mut self, id: MarkerId);

    /// Move the view so `bounds`, grown by `padding` on each side, is visible
    fn fit_bounds(&mut self, bounds: BoundingBox, padding: f64);

    /// Ground distance in meters
    fn distance_m(&self, a: LatLng, b: LatLng) -> f64 {
        haversine_m(a, b)
    }
}
