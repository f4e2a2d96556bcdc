//! Turns recognition results into display-space overlays and list entries.

pub mod draw;
pub mod highlight;
pub mod overlay;
pub mod transform;

pub use draw::{draw_overlays, OverlayStyle};
pub use highlight::{EntryHandle, HighlightLinks, HoverTarget, OverlayHandle};
pub use overlay::{render, ListEntry, OverlayBox, RenderedAnnotations};
pub use transform::{DisplayLayout, DisplayTransform, ImageDimensions};
