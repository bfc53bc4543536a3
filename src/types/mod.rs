//! The rcdgen type system.
//!
//! Every schema field has a [`DataType`] which knows how many bytes a value
//! takes and how to write it (little-endian throughout). Values arrive from
//! the data loader as [`FieldValue`]s and are converted by the compiler into
//! encodable [`Value`]s.

mod bitset;
mod data_type;
mod enumeration;
mod numeric;
mod value;

pub use bitset::{BitField, BitSetType};
pub use data_type::{DataType, ListType, RefKind, StructType};
pub use enumeration::EnumType;
pub use numeric::NumericType;
pub use value::{BlockRef, FieldValue, ImageLines, ImageRegion, Value};
