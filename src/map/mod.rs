mod geometry;
mod projection;
mod renderer;
mod surface;

pub use projection::Viewport;
pub use renderer::{Glyph, GlyphKind, LineString, MapLayers, MapRenderer};
pub use surface::{MapSurface, Marker, MarkerId, MarkerKind};
