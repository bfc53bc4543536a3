//! Bitsets: named bitfields packed into one numeric storage cell.

use std::sync::Arc;

use crate::error::{SchemaError, ValueError};

use super::{EnumType, NumericType};

/// One named range of bits inside a bitset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    pub name: String,

    /// Enumeration supplying the symbols for this field.
    pub source: Arc<EnumType>,

    /// Lowest bit of the field.
    pub start: u32,

    /// Minimum number of symbols that must be given.
    pub min: u32,

    /// Maximum number of symbols that may be given.
    pub max: u32,

    /// When set, a symbol's value selects a bit (`1 << value`) rather than
    /// being stored as a number.
    pub bit_index: bool,
}

/// A bitset type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSetType {
    pub name: String,
    pub storage: NumericType,
    fields: Vec<BitField>,
}

impl BitSetType {
    /// Create a bitset, checking field names, start bits and occurrence bounds.
    pub fn new(
        name: impl Into<String>,
        storage: NumericType,
        fields: Vec<BitField>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let invalid = |message: String| SchemaError::InvalidDefinition {
            name: name.clone(),
            message,
        };

        for (i, field) in fields.iter().enumerate() {
            if field.start >= storage.bits() {
                return Err(invalid(format!(
                    "bitfield '{}' starts at bit {} beyond {} storage",
                    field.name, field.start, storage
                )));
            }
            if field.min > field.max {
                return Err(invalid(format!(
                    "bitfield '{}' has min {} above max {}",
                    field.name, field.min, field.max
                )));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(invalid(format!(
                    "bitfield '{}' is declared more than once",
                    field.name
                )));
            }
        }

        Ok(Self {
            name,
            storage,
            fields,
        })
    }

    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Pack a literal of (bitfield name, symbols) pairs into a storage value.
    ///
    /// Bitfields missing from the literal count as zero occurrences.
    pub fn pack(&self, literal: &[(String, Vec<String>)]) -> Result<i64, ValueError> {
        for (name, _) in literal {
            if !self.fields.iter().any(|f| &f.name == name) {
                return Err(ValueError::UnknownBitField {
                    bitset: self.name.clone(),
                    field: name.clone(),
                });
            }
        }

        let storage_bits = self.storage.bits();
        let mut packed: u64 = 0;

        for field in &self.fields {
            let symbols: Vec<&String> = literal
                .iter()
                .filter(|(name, _)| name == &field.name)
                .flat_map(|(_, symbols)| symbols.iter())
                .collect();

            let count = symbols.len();
            if count < field.min as usize || count > field.max as usize {
                return Err(ValueError::OccurrenceCount {
                    field: field.name.clone(),
                    count,
                    min: field.min,
                    max: field.max,
                });
            }

            for symbol in symbols {
                let value = field.source.lookup(symbol)?;
                let overflow = || ValueError::OutOfRange {
                    value,
                    type_name: format!("bitfield '{}'", field.name),
                    min: 0,
                    max: (storage_bits - field.start - 1) as i64,
                };

                let bits = if field.bit_index {
                    let bit = u32::try_from(value).map_err(|_| overflow())?;
                    if field.start + bit >= storage_bits {
                        return Err(overflow());
                    }
                    1u64 << bit
                } else {
                    u64::try_from(value).map_err(|_| overflow())?
                };
                packed |= bits << field.start;
            }
        }

        let packed = i64::try_from(packed).map_err(|_| ValueError::OutOfRange {
            value: i64::MAX,
            type_name: self.name.clone(),
            min: 0,
            max: self.storage.range().1,
        })?;
        self.storage.check(packed)
    }
}
