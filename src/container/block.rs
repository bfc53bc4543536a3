//! Runtime blocks: typed fields with their assigned values.

use std::collections::HashMap;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{ConsistencyError, Result};
use crate::schema::{Field, Magic};
use crate::types::{DataType, Value};

/// One block of an output file.
///
/// Two blocks are equal when magic, version, the ordered (name, type) field
/// list and every assigned value match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    magic: Magic,
    version: u32,
    fields: Vec<(String, DataType)>,
    values: HashMap<String, Value>,
}

impl Block {
    pub fn new(magic: Magic, version: u32, fields: Vec<(String, DataType)>) -> Self {
        Self {
            magic,
            version,
            fields,
            values: HashMap::new(),
        }
    }

    /// Create a block from resolved schema fields.
    pub fn from_fields(magic: Magic, version: u32, fields: &[&Field]) -> Self {
        Self::new(
            magic,
            version,
            fields
                .iter()
                .map(|f| (f.name.clone(), f.data_type.clone()))
                .collect(),
        )
    }

    pub fn magic(&self) -> Magic {
        self.magic
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fields(&self) -> &[(String, DataType)] {
        &self.fields
    }

    /// Assign a value to a declared field, replacing any earlier value.
    pub fn set(&mut self, name: &str, value: Value) -> std::result::Result<&mut Self, ConsistencyError> {
        if !self.fields.iter().any(|(n, _)| n == name) {
            return Err(ConsistencyError::UnknownField {
                magic: self.magic.to_string(),
                field: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Declared fields without a value.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(move |name| !self.values.contains_key(*name))
    }

    fn value(&self, name: &str) -> std::result::Result<&Value, ConsistencyError> {
        self.values
            .get(name)
            .ok_or_else(|| ConsistencyError::MissingValue {
                magic: self.magic.to_string(),
                field: name.to_string(),
            })
    }

    /// Sum of the sizes of all field values.
    pub fn payload_size(&self) -> Result<usize> {
        let mut size = 0;
        for (name, ty) in &self.fields {
            size += ty.size(self.value(name)?)?;
        }
        Ok(size)
    }

    /// Encode the field values in declaration order.
    pub fn payload(&self) -> Result<Vec<u8>> {
        let declared = self.payload_size()?;
        let mut payload = Vec::with_capacity(declared);
        for (name, ty) in &self.fields {
            ty.write(self.value(name)?, &mut payload)?;
        }
        if payload.len() != declared {
            return Err(ConsistencyError::LengthMismatch {
                magic: self.magic.to_string(),
                declared,
                written: payload.len(),
            }
            .into());
        }
        Ok(payload)
    }

    /// Write the block record: magic, version, payload length, payload.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        let payload = self.payload()?;
        let length = u32::try_from(payload.len()).map_err(|_| ConsistencyError::TooLarge {
            magic: self.magic.to_string(),
            size: payload.len(),
        })?;
        out.write_all(self.magic.as_bytes())?;
        out.write_u32::<LittleEndian>(self.version)?;
        out.write_u32::<LittleEndian>(length)?;
        out.write_all(&payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RcdError;
    use crate::types::NumericType;
    use pretty_assertions::assert_eq;

    fn magic() -> Magic {
        "TEST".parse().unwrap()
    }

    fn uint16_block() -> Block {
        Block::new(
            magic(),
            1,
            vec![("value".to_string(), DataType::Numeric(NumericType::Uint16))],
        )
    }

    #[test]
    fn test_single_uint16_block() {
        let mut block = uint16_block();
        block.set("value", Value::Int(7)).unwrap();

        let mut out = Vec::new();
        block.write(&mut out).unwrap();
        assert_eq!(
            out,
            vec![b'T', b'E', b'S', b'T', 1, 0, 0, 0, 2, 0, 0, 0, 7, 0]
        );
    }

    #[test]
    fn test_unknown_field() {
        let mut block = uint16_block();
        assert_eq!(
            block.set("other", Value::Int(1)).unwrap_err(),
            ConsistencyError::UnknownField {
                magic: "TEST".to_string(),
                field: "other".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_value_fails_write() {
        let block = uint16_block();
        assert_eq!(block.missing().collect::<Vec<_>>(), vec!["value"]);
        let err = block.write(&mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            RcdError::Consistency(ConsistencyError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_out_of_range_value_fails_write() {
        let mut block = uint16_block();
        block.set("value", Value::Int(70_000)).unwrap();
        assert!(block.write(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let mut a = uint16_block();
        let mut b = uint16_block();
        a.set("value", Value::Int(1)).unwrap();
        b.set("value", Value::Int(1)).unwrap();
        assert_eq!(a, b);

        b.set("value", Value::Int(2)).unwrap();
        assert_ne!(a, b);

        let mut c = Block::new(
            magic(),
            1,
            vec![("value".to_string(), DataType::Numeric(NumericType::Int16))],
        );
        c.set("value", Value::Int(1)).unwrap();
        assert_ne!(a, c);
    }
}
