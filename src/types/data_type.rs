//! The `DataType` sum type: size and encoding of every field kind.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{ConsistencyError, Result};

use super::{BitSetType, BlockRef, EnumType, NumericType, Value};

/// Which kind of block a reference field points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// A sprite (`8PXL`) block.
    Sprite,
    /// Any block.
    Block,
}

/// A list of one element type, prefixed by its count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListType {
    pub count: NumericType,
    pub element: DataType,
}

/// A fixed, ordered sequence of typed sub-fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<(String, DataType)>,
}

impl StructType {
    /// Position of a sub-field by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }
}

/// Type of a field: decides how many bytes a value takes and how it is written.
///
/// Composite variants are reference counted so one definition is shared by
/// every field that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Numeric(NumericType),
    Enumeration(Arc<EnumType>),
    BlockReference(RefKind),
    Text,
    ImageData,
    List(Arc<ListType>),
    Structure(Arc<StructType>),
    BitSet(Arc<BitSetType>),
    /// Pre-encoded bytes; only used by generated blocks, never by schemas.
    Raw,
}

impl DataType {
    /// Type name for messages.
    pub fn name(&self) -> String {
        match self {
            DataType::Numeric(n) => n.name().to_string(),
            DataType::Enumeration(e) => e.name.clone(),
            DataType::BlockReference(RefKind::Sprite) => "sprite".to_string(),
            DataType::BlockReference(RefKind::Block) => "block".to_string(),
            DataType::Text => "text".to_string(),
            DataType::ImageData => "image_data".to_string(),
            DataType::List(l) => format!("list<{}; {}>", l.element.name(), l.count),
            DataType::Structure(s) => s.name.clone(),
            DataType::BitSet(b) => b.name.clone(),
            DataType::Raw => "raw".to_string(),
        }
    }

    /// The numeric cell a scalar type is stored in, if it is scalar.
    pub fn storage(&self) -> Option<NumericType> {
        match self {
            DataType::Numeric(n) => Some(*n),
            DataType::Enumeration(e) => Some(e.base),
            DataType::BitSet(b) => Some(b.storage),
            DataType::BlockReference(_) | DataType::Text => Some(NumericType::Uint32),
            _ => None,
        }
    }

    fn shape_error(&self) -> ConsistencyError {
        ConsistencyError::ValueShape {
            type_name: self.name(),
        }
    }

    /// Number of bytes `value` occupies when written as this type.
    pub fn size(&self, value: &Value) -> Result<usize> {
        let size = match (self, value) {
            (DataType::Numeric(n), Value::Int(_)) => n.size(),
            (DataType::Enumeration(e), Value::Int(_)) => e.base.size(),
            (DataType::BitSet(b), Value::Int(_)) => b.storage.size(),
            (DataType::BlockReference(_) | DataType::Text, Value::Ref(_)) => 4,
            (DataType::ImageData, Value::Image(lines)) => lines
                .iter()
                .map(|line| 4 + line.as_ref().map_or(0, |l| l.len()))
                .sum(),
            (DataType::List(list), Value::List(items)) => {
                let mut total = list.count.size();
                for item in items {
                    total += list.element.size(item)?;
                }
                total
            }
            (DataType::Structure(st), Value::Struct(items)) => {
                if items.len() != st.fields.len() {
                    return Err(self.shape_error().into());
                }
                let mut total = 0;
                for ((_, ty), item) in st.fields.iter().zip(items) {
                    total += ty.size(item)?;
                }
                total
            }
            (DataType::Raw, Value::Raw(bytes)) => bytes.len(),
            _ => return Err(self.shape_error().into()),
        };
        Ok(size)
    }

    /// Write `value` as this type.
    pub fn write<W: Write>(&self, value: &Value, out: &mut W) -> Result<()> {
        match (self, value) {
            (DataType::Numeric(n), Value::Int(v)) => n.write(*v, out)?,
            (DataType::Enumeration(e), Value::Int(v)) => e.base.write(*v, out)?,
            (DataType::BitSet(b), Value::Int(v)) => b.storage.write(*v, out)?,
            (DataType::BlockReference(_) | DataType::Text, Value::Ref(r)) => {
                out.write_u32::<LittleEndian>(BlockRef::encode(*r))?
            }
            (DataType::ImageData, Value::Image(lines)) => write_image_lines(lines, out)?,
            (DataType::List(list), Value::List(items)) => {
                list.count.write(items.len() as i64, out)?;
                for item in items {
                    list.element.write(item, out)?;
                }
            }
            (DataType::Structure(st), Value::Struct(items)) => {
                if items.len() != st.fields.len() {
                    return Err(self.shape_error().into());
                }
                for ((_, ty), item) in st.fields.iter().zip(items) {
                    ty.write(item, out)?;
                }
            }
            (DataType::Raw, Value::Raw(bytes)) => out.write_all(bytes)?,
            _ => return Err(self.shape_error().into()),
        }
        Ok(())
    }
}

/// Write an offset table (one uint32 per line, relative to the table start,
/// 0 for an empty line) followed by the line data.
fn write_image_lines<W: Write>(lines: &[Option<Vec<u8>>], out: &mut W) -> Result<()> {
    let mut offset = 4 * lines.len();
    for line in lines {
        match line {
            Some(data) => {
                let encoded = u32::try_from(offset).map_err(|_| ConsistencyError::TooLarge {
                    magic: "image_data".to_string(),
                    size: offset,
                })?;
                out.write_u32::<LittleEndian>(encoded)?;
                offset += data.len();
            }
            None => out.write_u32::<LittleEndian>(0)?,
        }
    }
    for data in lines.iter().flatten() {
        out.write_all(data)?;
    }
    Ok(())
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BitField;
    use pretty_assertions::assert_eq;

    fn encode(ty: &DataType, value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        ty.write(value, &mut out).unwrap();
        assert_eq!(out.len(), ty.size(value).unwrap());
        out
    }

    #[test]
    fn test_enumeration_writes_base() {
        let e = EnumType::from_text("compass", NumericType::Uint8, [("N", "0"), ("E", "1")])
            .unwrap();
        let value = Value::Int(e.lookup("E").unwrap());
        let ty = DataType::Enumeration(Arc::new(e));
        assert_eq!(encode(&ty, &value), vec![0x01]);
    }

    #[test]
    fn test_block_reference_is_four_bytes() {
        let ty = DataType::BlockReference(RefKind::Sprite);
        assert_eq!(encode(&ty, &Value::Ref(None)), vec![0, 0, 0, 0]);
        assert_eq!(encode(&ty, &Value::Ref(BlockRef::new(2))), vec![2, 0, 0, 0]);
    }

    #[test]
    fn test_image_data_offset_table() {
        let lines = vec![Some(vec![0x80, 1, 9]), None, Some(vec![0x81, 2, 7, 7])];
        let out = encode(&DataType::ImageData, &Value::Image(lines));
        assert_eq!(
            out,
            vec![
                12, 0, 0, 0, // first line right after the 3-entry table
                0, 0, 0, 0, // empty line
                15, 0, 0, 0, // 12 + 3
                0x80, 1, 9, 0x81, 2, 7, 7,
            ]
        );
    }

    #[test]
    fn test_list_with_count() {
        let ty = DataType::List(Arc::new(ListType {
            count: NumericType::Uint8,
            element: DataType::Numeric(NumericType::Uint16),
        }));
        let value = Value::List(vec![Value::Int(1), Value::Int(0x0203)]);
        assert_eq!(encode(&ty, &value), vec![2, 1, 0, 3, 2]);
    }

    #[test]
    fn test_list_count_overflow_fails() {
        let ty = DataType::List(Arc::new(ListType {
            count: NumericType::Uint8,
            element: DataType::Numeric(NumericType::Uint8),
        }));
        let value = Value::List(vec![Value::Int(0); 256]);
        assert!(ty.write(&value, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_structure_concatenates_without_padding() {
        let ty = DataType::Structure(Arc::new(StructType {
            name: "recolour".to_string(),
            fields: vec![
                ("source".to_string(), DataType::Numeric(NumericType::Uint8)),
                ("dest".to_string(), DataType::Numeric(NumericType::Uint32)),
            ],
        }));
        let value = Value::Struct(vec![Value::Int(5), Value::Int(0x11223344)]);
        assert_eq!(encode(&ty, &value), vec![5, 0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_bitset_uses_storage() {
        let dir = Arc::new(
            EnumType::from_text("d", NumericType::Uint8, [("N", "0"), ("E", "1")]).unwrap(),
        );
        let set = BitSetType::new(
            "edges",
            NumericType::Uint16,
            vec![BitField {
                name: "open".to_string(),
                source: dir,
                start: 8,
                min: 0,
                max: 2,
                bit_index: true,
            }],
        )
        .unwrap();
        let packed = set
            .pack(&[("open".to_string(), vec!["E".to_string()])])
            .unwrap();
        let ty = DataType::BitSet(Arc::new(set));
        assert_eq!(encode(&ty, &Value::Int(packed)), vec![0x00, 0x02]);
    }

    #[test]
    fn test_shape_mismatch_is_consistency_error() {
        let ty = DataType::Numeric(NumericType::Uint8);
        let err = ty.size(&Value::Ref(None)).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
