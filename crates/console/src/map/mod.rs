//! Map-surface abstraction and overlay lifecycle management.

pub mod headless;
pub mod overlays;
pub mod surface;

pub use headless::{HeadlessSurface, SurfaceEvent};
pub use overlays::{geometry_from_overlay, OverlayHandle, OverlayRegistry};
pub use surface::{
    ClickHandler, InfoContent, MapSurface, Overlay, OverlaySpec, OverlayStyle, ShapeKind,
};
