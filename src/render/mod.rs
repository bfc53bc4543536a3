//! Rendering of decoded sprites for inspection.

mod preview;

pub use preview::{render_sprite, write_preview, PreviewPalette};
