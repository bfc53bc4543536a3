//! Fixed-width integer types.

use std::fmt;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Result, ValueError};

/// One of the six fixed-width integer encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
}

impl NumericType {
    /// All numeric types, in the order they are registered.
    pub const ALL: [NumericType; 6] = [
        NumericType::Int8,
        NumericType::Uint8,
        NumericType::Int16,
        NumericType::Uint16,
        NumericType::Int32,
        NumericType::Uint32,
    ];

    /// Look a numeric type up by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Schema name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            NumericType::Int8 => "int8",
            NumericType::Uint8 => "uint8",
            NumericType::Int16 => "int16",
            NumericType::Uint16 => "uint16",
            NumericType::Int32 => "int32",
            NumericType::Uint32 => "uint32",
        }
    }

    /// Encoded width in bytes.
    pub fn size(&self) -> usize {
        match self {
            NumericType::Int8 | NumericType::Uint8 => 1,
            NumericType::Int16 | NumericType::Uint16 => 2,
            NumericType::Int32 | NumericType::Uint32 => 4,
        }
    }

    /// Width in bits.
    pub fn bits(&self) -> u32 {
        self.size() as u32 * 8
    }

    /// Inclusive value range.
    pub fn range(&self) -> (i64, i64) {
        match self {
            NumericType::Int8 => (i8::MIN as i64, i8::MAX as i64),
            NumericType::Uint8 => (0, u8::MAX as i64),
            NumericType::Int16 => (i16::MIN as i64, i16::MAX as i64),
            NumericType::Uint16 => (0, u16::MAX as i64),
            NumericType::Int32 => (i32::MIN as i64, i32::MAX as i64),
            NumericType::Uint32 => (0, u32::MAX as i64),
        }
    }

    /// Check that `value` fits the type.
    pub fn check(&self, value: i64) -> std::result::Result<i64, ValueError> {
        let (min, max) = self.range();
        if value < min || value > max {
            return Err(ValueError::OutOfRange {
                value,
                type_name: self.name().to_string(),
                min,
                max,
            });
        }
        Ok(value)
    }

    /// Parse a textual literal (decimal, optionally signed, or `0x` hex).
    pub fn parse(&self, text: &str) -> std::result::Result<i64, ValueError> {
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let parsed = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => i64::from_str_radix(hex, 16),
            None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                digits.parse::<i64>()
            }
            None => {
                return Err(ValueError::Parse {
                    text: text.to_string(),
                    type_name: self.name().to_string(),
                })
            }
        };

        let magnitude = parsed.map_err(|_| ValueError::Parse {
            text: text.to_string(),
            type_name: self.name().to_string(),
        })?;

        self.check(if negative { -magnitude } else { magnitude })
    }

    /// Write `value` little-endian; out-of-range values are rejected.
    pub fn write<W: Write>(&self, value: i64, out: &mut W) -> Result<()> {
        let value = self.check(value)?;
        match self {
            NumericType::Int8 => out.write_i8(value as i8)?,
            NumericType::Uint8 => out.write_u8(value as u8)?,
            NumericType::Int16 => out.write_i16::<LittleEndian>(value as i16)?,
            NumericType::Uint16 => out.write_u16::<LittleEndian>(value as u16)?,
            NumericType::Int32 => out.write_i32::<LittleEndian>(value as i32)?,
            NumericType::Uint32 => out.write_u32::<LittleEndian>(value as u32)?,
        }
        Ok(())
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
