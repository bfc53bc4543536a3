//! Values: what the data loader binds, and what the type system encodes.

use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::container::TextBundle;
use crate::sprite::SheetGrid;

/// A 1-based index into a container's block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(NonZeroU32);

impl BlockRef {
    /// Create a reference; `0` means "no block" and yields `None`.
    pub fn new(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(Self)
    }

    /// The 1-based block number.
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Encode an optional reference, `0` for none.
    pub fn encode(reference: Option<BlockRef>) -> u32 {
        reference.map_or(0, |r| r.get())
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A rectangular sprite region of a sheet, as written in a data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRegion {
    /// Sheet path (resolved relative to the data file).
    pub sheet: PathBuf,
    pub x: u32,
    pub y: u32,
    /// Width of the region; `None` extends to the sheet's right edge.
    pub width: Option<u32>,
    /// Height of the region; `None` extends to the sheet's bottom edge.
    pub height: Option<u32>,
    /// Horizontal offset of the region's left edge to the reference point.
    pub x_offset: i32,
    /// Vertical offset of the region's top edge to the reference point.
    pub y_offset: i32,
    /// Auto-crop transparent edges before encoding.
    pub crop: bool,
}

impl ImageRegion {
    /// A region covering the whole sheet with zero offsets.
    pub fn whole(sheet: impl Into<PathBuf>) -> Self {
        Self {
            sheet: sheet.into(),
            x: 0,
            y: 0,
            width: None,
            height: None,
            x_offset: 0,
            y_offset: 0,
            crop: true,
        }
    }
}

/// A value bound to a schema field by the data loader.
///
/// Each variant is accepted only by the field types that can encode it;
/// dispatch is an exhaustive match on (type, value).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer literal for numeric fields.
    Number(i64),
    /// Enumeration symbol.
    Symbol(String),
    /// An already allocated block (or none).
    Block(Option<BlockRef>),
    /// Structure literal, sub-field values by name.
    Struct(Vec<(String, FieldValue)>),
    /// List literal.
    List(Vec<FieldValue>),
    /// Bitset literal: bitfield name with its symbols.
    Bits(Vec<(String, Vec<String>)>),
    /// Bitmap region, encoded as a sprite.
    Image(ImageRegion),
    /// Named grid of sprites cut from one sheet.
    Grid(SheetGrid),
    /// Translated strings, stored as a TEXT block.
    Text(TextBundle),
}

impl FieldValue {
    /// Short description of the value's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Number(_) => "number",
            FieldValue::Symbol(_) => "symbol",
            FieldValue::Block(_) => "block reference",
            FieldValue::Struct(_) => "structure",
            FieldValue::List(_) => "list",
            FieldValue::Bits(_) => "bitset",
            FieldValue::Image(_) => "image region",
            FieldValue::Grid(_) => "sprite grid",
            FieldValue::Text(_) => "text",
        }
    }
}

/// Scanline data of an encoded sprite; `None` marks an empty line.
pub type ImageLines = Vec<Option<Vec<u8>>>;

/// A converted value, ready to be sized and written by its `DataType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Ref(Option<BlockRef>),
    Image(ImageLines),
    List(Vec<Value>),
    Struct(Vec<Value>),
    Raw(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_ref_zero_is_none() {
        assert_eq!(BlockRef::new(0), None);
        assert_eq!(BlockRef::new(3).map(|r| r.get()), Some(3));
        assert_eq!(BlockRef::encode(None), 0);
        assert_eq!(BlockRef::encode(BlockRef::new(5)), 5);
    }

    #[test]
    fn test_block_ref_display() {
        assert_eq!(BlockRef::new(12).unwrap().to_string(), "#12");
    }
}
