//! Enumeration types: symbolic names over a numeric base type.

use std::collections::BTreeMap;

use crate::error::{SchemaError, ValueError};

use super::NumericType;

/// A named enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Enumeration name (also its type name in the registry).
    pub name: String,

    /// Underlying numeric encoding.
    pub base: NumericType,

    values: BTreeMap<String, i64>,
}

impl EnumType {
    /// Create an enumeration from already numeric values.
    ///
    /// Every value must fit `base`, and symbols must be unique.
    pub fn new(
        name: impl Into<String>,
        base: NumericType,
        values: impl IntoIterator<Item = (String, i64)>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut map = BTreeMap::new();

        for (symbol, value) in values {
            base.check(value).map_err(|e| SchemaError::InvalidDefinition {
                name: name.clone(),
                message: format!("symbol '{}': {}", symbol, e),
            })?;
            if map.insert(symbol.clone(), value).is_some() {
                return Err(SchemaError::InvalidDefinition {
                    name,
                    message: format!("symbol '{}' is defined more than once", symbol),
                });
            }
        }

        Ok(Self {
            name,
            base,
            values: map,
        })
    }

    /// Create an enumeration from textual values, parsed by the base type.
    pub fn from_text<'a>(
        name: impl Into<String>,
        base: NumericType,
        values: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut parsed = Vec::new();
        for (symbol, text) in values {
            let value = base.parse(text).map_err(|e| SchemaError::InvalidDefinition {
                name: name.clone(),
                message: format!("symbol '{}': {}", symbol, e),
            })?;
            parsed.push((symbol.to_string(), value));
        }
        Self::new(name, base, parsed)
    }

    /// Numeric value of a symbol.
    pub fn lookup(&self, symbol: &str) -> Result<i64, ValueError> {
        self.values
            .get(symbol)
            .copied()
            .ok_or_else(|| ValueError::UnknownSymbol {
                symbol: symbol.to_string(),
                enumeration: self.name.clone(),
            })
    }

    /// Iterate over (symbol, value) pairs in symbol order.
    pub fn values(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compass() -> EnumType {
        EnumType::from_text("compass", NumericType::Uint8, [("N", "0"), ("E", "1")]).unwrap()
    }

    #[test]
    fn test_lookup_symbol() {
        let e = compass();
        assert_eq!(e.lookup("E"), Ok(1));
        assert_eq!(e.lookup("N"), Ok(0));
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let err = compass().lookup("Q").unwrap_err();
        assert_eq!(
            err,
            ValueError::UnknownSymbol {
                symbol: "Q".to_string(),
                enumeration: "compass".to_string(),
            }
        );
    }

    #[test]
    fn test_value_must_fit_base() {
        let result = EnumType::from_text("big", NumericType::Uint8, [("X", "256")]);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let result = EnumType::new(
            "dup",
            NumericType::Uint8,
            vec![("A".to_string(), 1), ("A".to_string(), 2)],
        );
        assert!(result.is_err());
    }
}
