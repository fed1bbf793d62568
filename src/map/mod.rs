mod geometry;
mod globe;
mod projection;
mod renderer;
mod spatial;
mod view;

pub use globe::GlobeViewport;
pub use projection::{Projector, Viewport};
pub use renderer::{DisplaySettings, LineString, Lod, MapLayers, MapRenderer, Marker};
pub use spatial::SpatialGrid;
pub use view::{resolve_focus, CoordinateIndex, MapFocus, MapView, ProjectionMode, PICK_RADIUS_PX};
