//! Sprite pixel codec.
//!
//! Sprites are cut from 8-bit indexed sheets, cropped to their opaque pixels
//! and stored as `8PXL` blocks of run-length encoded scanlines.

mod bitmap;
mod codec;
mod crop;
mod grid;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bitmap::{BitmapCache, IndexedBitmap};
pub use codec::{
    decode_line, encode_line, scan_line, Run, SpriteImage, LAST_RUN, SPRITE_MAGIC, SPRITE_VERSION,
};
pub use crop::SpriteRegion;
pub use grid::{SheetGrid, SKIP_CELL};

/// Palette index treated as transparent unless configured otherwise.
pub const DEFAULT_TRANSPARENT: u8 = 0;

/// What to store for a sprite region without opaque pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySprite {
    /// No block; the reference is 0.
    #[default]
    Omit,
    /// An uncropped block whose lines are all empty.
    Blank,
}

impl fmt::Display for EmptySprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptySprite::Omit => write!(f, "omit"),
            EmptySprite::Blank => write!(f, "blank"),
        }
    }
}
