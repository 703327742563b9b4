mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::{draw_circle, draw_line, draw_marker};
pub use projection::Viewport;
pub use renderer::{LineString, MapLayers, MapRenderer, Marker};
pub use spatial::SpatialGrid;
