//! YAML schema loading.
//!
//! Loading runs in two explicit phases:
//!
//! 1. Enumerations, then bitsets, then structures are registered in a
//!    [`RegistryBuilder`] (structures may use earlier structures).
//! 2. The registry is frozen and every block field's type expression is
//!    resolved against it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{RcdError, Result, SchemaError};
use crate::registry::{RegistryBuilder, TypeRegistry};
use crate::types::{BitField, BitSetType, DataType, EnumType, ListType, NumericType, StructType};

use super::{BlockDef, Field, Magic, Schema};

/// Count type of a list when the schema does not name one.
const DEFAULT_COUNT_TYPE: &str = "uint8";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default)]
    enums: Vec<RawEnum>,
    #[serde(default)]
    bitsets: Vec<RawBitSet>,
    #[serde(default)]
    structs: Vec<RawStruct>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnum {
    name: String,
    #[serde(rename = "type")]
    base: String,
    values: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBitSet {
    name: String,
    storage: String,
    fields: Vec<RawBitField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBitField {
    name: String,
    #[serde(rename = "enum")]
    source: String,
    start: u32,
    #[serde(default)]
    min: u32,
    #[serde(default = "default_max")]
    max: u32,
    #[serde(default)]
    bit_index: bool,
}

fn default_max() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStruct {
    name: String,
    fields: Vec<RawSubField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSubField {
    name: String,
    #[serde(rename = "type")]
    ty: TypeExpr,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    magic: Magic,
    minversion: u32,
    maxversion: u32,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: TypeExpr,
    #[serde(default)]
    minversion: Option<u32>,
    #[serde(default)]
    maxversion: Option<u32>,
    /// Free-form documentation; ignored.
    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,
}

/// A type as written in a schema.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeExpr {
    Named(String),
    List {
        list: Box<TypeExpr>,
        #[serde(default)]
        count: Option<String>,
    },
    Struct {
        fields: Vec<RawSubField>,
    },
    BitSet {
        storage: String,
        bits: Vec<RawBitField>,
    },
}

/// Load a schema from a YAML file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path).map_err(|e| RcdError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read schema: {}", e),
    })?;
    parse_schema(&content)
}

/// Parse a schema from a YAML string.
pub fn parse_schema(content: &str) -> Result<Schema> {
    let raw: RawSchema = serde_yaml::from_str(content).map_err(|e| RcdError::Parse {
        message: format!("Invalid schema: {}", e),
        help: Some("Check the enums/bitsets/structs/blocks sections".to_string()),
    })?;

    // Phase 1: named types.
    let mut builder = RegistryBuilder::new();
    for e in &raw.enums {
        builder.add_enum(build_enum(e)?)?;
    }
    for b in &raw.bitsets {
        let bitset = build_bitset(&b.name, &b.storage, &b.fields, &builder)?;
        builder.add_bitset(bitset)?;
    }
    for s in &raw.structs {
        let fields = s
            .fields
            .iter()
            .map(|f| Ok((f.name.clone(), resolve_expr(&f.ty, &s.name, &builder)?)))
            .collect::<std::result::Result<Vec<_>, SchemaError>>()?;
        builder.add_struct(build_struct(&s.name, fields)?)?;
    }

    // Phase 2: blocks against the frozen registry.
    let registry = builder.build();
    let mut schema = Schema::new(registry);
    for raw_block in raw.blocks {
        if raw_block.minversion > raw_block.maxversion {
            return Err(SchemaError::InvalidDefinition {
                name: raw_block.magic.to_string(),
                message: format!(
                    "minversion {} is above maxversion {}",
                    raw_block.minversion, raw_block.maxversion
                ),
            }
            .into());
        }

        let mut fields = Vec::with_capacity(raw_block.fields.len());
        for raw_field in &raw_block.fields {
            let owner = format!("{}.{}", raw_block.magic, raw_field.name);
            let data_type = resolve_expr(&raw_field.ty, &owner, schema.registry())?;
            fields.push(
                Field::new(&raw_field.name, data_type)
                    .versions(raw_field.minversion, raw_field.maxversion),
            );
        }

        schema.add_block(BlockDef::new(
            raw_block.magic,
            raw_block.minversion,
            raw_block.maxversion,
            fields,
        ))?;
    }

    Ok(schema)
}

fn numeric(name: &str, owner: &str) -> std::result::Result<NumericType, SchemaError> {
    NumericType::from_name(name).ok_or_else(|| SchemaError::InvalidDefinition {
        name: owner.to_string(),
        message: format!("'{}' is not a numeric type", name),
    })
}

fn build_enum(raw: &RawEnum) -> std::result::Result<EnumType, SchemaError> {
    let base = numeric(&raw.base, &raw.name)?;
    let mut values = Vec::with_capacity(raw.values.len());
    for (symbol, value) in &raw.values {
        let number = match value {
            serde_yaml::Value::Number(n) => n.as_i64(),
            serde_yaml::Value::String(s) => base.parse(s).ok(),
            _ => None,
        }
        .ok_or_else(|| SchemaError::InvalidDefinition {
            name: raw.name.clone(),
            message: format!("symbol '{}' has no integer value", symbol),
        })?;
        values.push((symbol.clone(), number));
    }
    EnumType::new(&raw.name, base, values)
}

fn build_bitset(
    name: &str,
    storage: &str,
    fields: &[RawBitField],
    builder: &RegistryBuilder,
) -> std::result::Result<BitSetType, SchemaError> {
    let storage = numeric(storage, name)?;
    let fields = fields
        .iter()
        .map(|f| {
            Ok(BitField {
                name: f.name.clone(),
                source: builder.get_enum(&f.source)?,
                start: f.start,
                min: f.min,
                max: f.max,
                bit_index: f.bit_index,
            })
        })
        .collect::<std::result::Result<Vec<_>, SchemaError>>()?;
    BitSetType::new(name, storage, fields)
}

fn build_struct(
    name: &str,
    fields: Vec<(String, DataType)>,
) -> std::result::Result<StructType, SchemaError> {
    for (i, (field, _)) in fields.iter().enumerate() {
        if fields[..i].iter().any(|(other, _)| other == field) {
            return Err(SchemaError::InvalidDefinition {
                name: name.to_string(),
                message: format!("sub-field '{}' is declared more than once", field),
            });
        }
    }
    Ok(StructType {
        name: name.to_string(),
        fields,
    })
}

/// Lookup used while types are still being registered.
trait TypeLookup {
    fn lookup(&self, name: &str) -> std::result::Result<&DataType, SchemaError>;
    fn lookup_enum(&self, name: &str) -> std::result::Result<Arc<EnumType>, SchemaError>;
}

impl TypeLookup for RegistryBuilder {
    fn lookup(&self, name: &str) -> std::result::Result<&DataType, SchemaError> {
        self.get(name)
    }

    fn lookup_enum(&self, name: &str) -> std::result::Result<Arc<EnumType>, SchemaError> {
        self.get_enum(name)
    }
}

impl TypeLookup for TypeRegistry {
    fn lookup(&self, name: &str) -> std::result::Result<&DataType, SchemaError> {
        self.get(name)
    }

    fn lookup_enum(&self, name: &str) -> std::result::Result<Arc<EnumType>, SchemaError> {
        match self.get(name)? {
            DataType::Enumeration(e) => Ok(Arc::clone(e)),
            other => Err(SchemaError::InvalidDefinition {
                name: name.to_string(),
                message: format!("'{}' is not an enumeration", other),
            }),
        }
    }
}

fn resolve_expr<L: TypeLookup>(
    expr: &TypeExpr,
    owner: &str,
    types: &L,
) -> std::result::Result<DataType, SchemaError> {
    match expr {
        TypeExpr::Named(name) => types.lookup(name).cloned(),
        TypeExpr::List { list, count } => {
            let count = numeric(count.as_deref().unwrap_or(DEFAULT_COUNT_TYPE), owner)?;
            let element = resolve_expr(list, owner, types)?;
            Ok(DataType::List(Arc::new(ListType { count, element })))
        }
        TypeExpr::Struct { fields } => {
            let fields = fields
                .iter()
                .map(|f| Ok((f.name.clone(), resolve_expr(&f.ty, owner, types)?)))
                .collect::<std::result::Result<Vec<_>, SchemaError>>()?;
            Ok(DataType::Structure(Arc::new(build_struct(owner, fields)?)))
        }
        TypeExpr::BitSet { storage, bits } => {
            let storage = numeric(storage, owner)?;
            let fields = bits
                .iter()
                .map(|f| {
                    Ok(BitField {
                        name: f.name.clone(),
                        source: types.lookup_enum(&f.source)?,
                        start: f.start,
                        min: f.min,
                        max: f.max,
                        bit_index: f.bit_index,
                    })
                })
                .collect::<std::result::Result<Vec<_>, SchemaError>>()?;
            Ok(DataType::BitSet(Arc::new(BitSetType::new(
                owner, storage, fields,
            )?)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefKind;

    const SCHEMA: &str = r#"
enums:
  - name: direction
    type: uint8
    values: { N: 0, E: "1", S: 2, W: 3 }
bitsets:
  - name: edges
    storage: uint8
    fields:
      - { name: open, enum: direction, start: 0, min: 0, max: 4, bit_index: true }
structs:
  - name: recolour
    fields:
      - { name: source, type: uint8 }
      - { name: dest, type: uint32 }
blocks:
  - magic: SHOP
    minversion: 1
    maxversion: 3
    fields:
      - { name: height, type: uint8 }
      - { name: facing, type: direction }
      - { name: view, type: sprite, minversion: 2 }
      - { name: costs, type: { list: uint32, count: uint16 } }
      - { name: recolours, type: { list: recolour } }
      - { name: walls, type: edges }
      - name: name
        type: text
        description: Display name of the shop.
"#;

    #[test]
    fn test_parse_schema() {
        let schema = parse_schema(SCHEMA).unwrap();
        assert_eq!(schema.len(), 1);
        assert!(schema.registry().contains("direction"));
        assert!(schema.registry().contains("edges"));
        assert!(schema.registry().contains("recolour"));

        let magic: Magic = "SHOP".parse().unwrap();
        let v1 = schema.resolve(&magic, 1).unwrap();
        assert_eq!(v1.len(), 6);
        let v2 = schema.resolve(&magic, 2).unwrap();
        assert_eq!(v2.len(), 7);
        assert_eq!(v2[2].data_type, DataType::BlockReference(RefKind::Sprite));
    }

    #[test]
    fn test_list_count_types() {
        let schema = parse_schema(SCHEMA).unwrap();
        let magic: Magic = "SHOP".parse().unwrap();
        let fields = schema.resolve(&magic, 1).unwrap();

        let costs = fields.iter().find(|f| f.name == "costs").unwrap();
        match &costs.data_type {
            DataType::List(list) => {
                assert_eq!(list.count, NumericType::Uint16);
                assert_eq!(list.element, DataType::Numeric(NumericType::Uint32));
            }
            other => panic!("expected list, got {}", other),
        }

        let recolours = fields.iter().find(|f| f.name == "recolours").unwrap();
        match &recolours.data_type {
            DataType::List(list) => {
                assert_eq!(list.count, NumericType::Uint8);
                assert!(matches!(list.element, DataType::Structure(_)));
            }
            other => panic!("expected list, got {}", other),
        }
    }

    #[test]
    fn test_unknown_type_name() {
        let source = r#"
blocks:
  - magic: ABCD
    minversion: 1
    maxversion: 1
    fields:
      - { name: x, type: float }
"#;
        let err = parse_schema(source).unwrap_err();
        assert!(matches!(
            err,
            RcdError::Schema(SchemaError::UnknownType(ref name)) if name == "float"
        ));
    }

    #[test]
    fn test_enum_registered_twice() {
        let source = r#"
enums:
  - { name: kind, type: uint8, values: { A: 0 } }
  - { name: kind, type: uint8, values: { B: 1 } }
"#;
        let err = parse_schema(source).unwrap_err();
        assert!(matches!(
            err,
            RcdError::Schema(SchemaError::DuplicateType(_))
        ));
    }

    #[test]
    fn test_enum_shadowing_builtin() {
        let source = "enums:\n  - { name: uint8, type: uint8, values: { A: 0 } }\n";
        assert!(parse_schema(source).is_err());
    }

    #[test]
    fn test_invalid_magic_in_schema() {
        let source = "blocks:\n  - { magic: TOOLONG, minversion: 1, maxversion: 1 }\n";
        assert!(matches!(
            parse_schema(source),
            Err(RcdError::Parse { .. })
        ));
    }

    #[test]
    fn test_inverted_version_range() {
        let source = "blocks:\n  - { magic: ABCD, minversion: 3, maxversion: 1 }\n";
        assert!(matches!(
            parse_schema(source),
            Err(RcdError::Schema(SchemaError::InvalidDefinition { .. }))
        ));
    }

    #[test]
    fn test_inline_bitset_type() {
        let source = r#"
enums:
  - { name: dir, type: uint8, values: { N: 0, E: 1 } }
blocks:
  - magic: FLAG
    minversion: 1
    maxversion: 1
    fields:
      - name: flags
        type:
          storage: uint16
          bits:
            - { name: d, enum: dir, start: 4, max: 2, bit_index: true }
"#;
        let schema = parse_schema(source).unwrap();
        let magic: Magic = "FLAG".parse().unwrap();
        let fields = schema.resolve(&magic, 1).unwrap();
        assert!(matches!(fields[0].data_type, DataType::BitSet(_)));
    }
}
