//! Type registry for schema type names.
//!
//! The registry maps type names used in schemas (`uint16`, `sprite`,
//! declared enumerations, bitsets and structures) to their [`DataType`].
//! It is populated through a [`RegistryBuilder`] and frozen before any
//! block definition is resolved.
//!
//! # Example
//!
//! ```ignore
//! use rcdgen::registry::RegistryBuilder;
//!
//! let mut builder = RegistryBuilder::new();
//! builder.add_enum(direction)?;
//!
//! let registry = builder.build();
//! let ty = registry.get("direction")?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::types::{BitSetType, DataType, EnumType, NumericType, RefKind, StructType};

/// Names of the builtin types, in registration order.
pub const BUILTIN_TYPES: [&str; 10] = [
    "int8",
    "uint8",
    "int16",
    "uint16",
    "int32",
    "uint32",
    "sprite",
    "block",
    "text",
    "image_data",
];

/// Frozen mapping of type names to data types.
///
/// The registry is immutable after construction - use `RegistryBuilder`
/// to create a new registry.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, DataType>,
}

impl TypeRegistry {
    /// Look a type up by name.
    pub fn get(&self, name: &str) -> Result<&DataType, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Check whether a type name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Get all type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }

    /// Get the total number of types, builtins included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        RegistryBuilder::new().build()
    }
}

/// Builder for constructing a TypeRegistry.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    types: HashMap<String, DataType>,
}

impl RegistryBuilder {
    /// Create a builder holding the builtin types.
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for numeric in NumericType::ALL {
            types.insert(numeric.name().to_string(), DataType::Numeric(numeric));
        }
        types.insert("sprite".to_string(), DataType::BlockReference(RefKind::Sprite));
        types.insert("block".to_string(), DataType::BlockReference(RefKind::Block));
        types.insert("text".to_string(), DataType::Text);
        types.insert("image_data".to_string(), DataType::ImageData);
        Self { types }
    }

    /// Register a type under a name. Names may only be registered once.
    pub fn add(&mut self, name: impl Into<String>, ty: DataType) -> Result<&mut Self, SchemaError> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(SchemaError::DuplicateType(name));
        }
        self.types.insert(name, ty);
        Ok(self)
    }

    /// Register an enumeration under its own name.
    pub fn add_enum(&mut self, enumeration: EnumType) -> Result<&mut Self, SchemaError> {
        let name = enumeration.name.clone();
        self.add(name, DataType::Enumeration(Arc::new(enumeration)))
    }

    /// Register a bitset under its own name.
    pub fn add_bitset(&mut self, bitset: BitSetType) -> Result<&mut Self, SchemaError> {
        let name = bitset.name.clone();
        self.add(name, DataType::BitSet(Arc::new(bitset)))
    }

    /// Register a structure under its own name.
    pub fn add_struct(&mut self, structure: StructType) -> Result<&mut Self, SchemaError> {
        let name = structure.name.clone();
        self.add(name, DataType::Structure(Arc::new(structure)))
    }

    /// Look up a type registered so far.
    pub fn get(&self, name: &str) -> Result<&DataType, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Look up an enumeration registered so far.
    pub fn get_enum(&self, name: &str) -> Result<Arc<EnumType>, SchemaError> {
        match self.get(name)? {
            DataType::Enumeration(e) => Ok(Arc::clone(e)),
            other => Err(SchemaError::InvalidDefinition {
                name: name.to_string(),
                message: format!("'{}' is not an enumeration", other),
            }),
        }
    }

    /// Freeze the registry.
    pub fn build(self) -> TypeRegistry {
        TypeRegistry { types: self.types }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.len(), BUILTIN_TYPES.len());
        for name in BUILTIN_TYPES {
            assert!(registry.contains(name), "missing builtin {}", name);
        }
        assert_eq!(
            registry.get("uint16").unwrap(),
            &DataType::Numeric(NumericType::Uint16)
        );
    }

    #[test]
    fn test_add_enum() {
        let mut builder = RegistryBuilder::new();
        builder
            .add_enum(EnumType::from_text("compass", NumericType::Uint8, [("N", "0")]).unwrap())
            .unwrap();

        let registry = builder.build();
        assert!(matches!(
            registry.get("compass"),
            Ok(DataType::Enumeration(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_is_error() {
        let mut builder = RegistryBuilder::new();
        let err = builder
            .add("uint8", DataType::Numeric(NumericType::Int8))
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("uint8".to_string()));
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::default();
        assert_eq!(
            registry.get("float").unwrap_err(),
            SchemaError::UnknownType("float".to_string())
        );
    }

    #[test]
    fn test_get_enum_rejects_other_types() {
        let builder = RegistryBuilder::new();
        assert!(builder.get_enum("uint8").is_err());
    }
}
