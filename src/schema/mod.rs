//! Schema model: block definitions and their per-version fields.
//!
//! A schema holds one [`BlockDef`] per magic. Each block supports a range of
//! versions, and each field may be restricted to a window of versions.
//! [`Schema::resolve`] returns the fields valid for one version, in
//! definition order.
//!
//! Schemas are loaded from YAML in two phases: first every enumeration,
//! bitset and structure is registered and the [`TypeRegistry`] frozen, then
//! block fields are resolved against it. See [`load_schema`].

mod loader;
mod magic;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::SchemaError;
use crate::registry::TypeRegistry;
use crate::types::DataType;

pub use loader::{load_schema, parse_schema};
pub use magic::Magic;

/// A field of a block definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    /// First block version having this field (`None` = all earlier versions).
    pub minversion: Option<u32>,
    /// Last block version having this field (`None` = all later versions).
    pub maxversion: Option<u32>,
}

impl Field {
    /// A field present in every version.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            minversion: None,
            maxversion: None,
        }
    }

    /// Restrict the field to a version window.
    pub fn versions(mut self, minversion: Option<u32>, maxversion: Option<u32>) -> Self {
        self.minversion = minversion;
        self.maxversion = maxversion;
        self
    }

    /// Whether the field exists in `version`.
    pub fn is_visible(&self, version: u32) -> bool {
        self.minversion.map_or(true, |min| version >= min)
            && self.maxversion.map_or(true, |max| version <= max)
    }
}

/// Definition of one block kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    pub magic: Magic,
    pub minversion: u32,
    pub maxversion: u32,
    fields: Vec<Field>,
}

impl BlockDef {
    pub fn new(magic: Magic, minversion: u32, maxversion: u32, fields: Vec<Field>) -> Self {
        Self {
            magic,
            minversion,
            maxversion,
            fields,
        }
    }

    /// All fields, across all versions.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Whether `version` is inside the block's version range.
    pub fn supports(&self, version: u32) -> bool {
        version >= self.minversion && version <= self.maxversion
    }

    /// The versions at which the visible field set can change.
    ///
    /// The block's first version plus every field window edge inside the
    /// range. Resolving these covers every version of the block.
    pub fn edge_versions(&self) -> BTreeSet<u32> {
        let edges = self
            .fields
            .iter()
            .flat_map(|f| [f.minversion, f.maxversion.and_then(|max| max.checked_add(1))])
            .flatten();
        std::iter::once(self.minversion)
            .chain(edges)
            .filter(|v| self.supports(*v))
            .collect()
    }

    /// Fields valid in `version`, in definition order.
    ///
    /// Fails when the version is out of range or two visible fields share a name.
    pub fn fields_for(&self, version: u32) -> Result<Vec<&Field>, SchemaError> {
        if !self.supports(version) {
            return Err(SchemaError::UnsupportedVersion {
                magic: self.magic.to_string(),
                version,
                min: self.minversion,
                max: self.maxversion,
            });
        }

        let mut names = HashSet::new();
        let mut fields = Vec::new();
        for field in self.fields.iter().filter(|f| f.is_visible(version)) {
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    magic: self.magic.to_string(),
                    version,
                    field: field.name.clone(),
                });
            }
            fields.push(field);
        }
        Ok(fields)
    }
}

/// A loaded schema: frozen types plus block definitions by magic.
#[derive(Debug, Clone)]
pub struct Schema {
    registry: TypeRegistry,
    blocks: BTreeMap<Magic, BlockDef>,
}

impl Schema {
    /// Create an empty schema over a frozen registry.
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            blocks: BTreeMap::new(),
        }
    }

    /// Add a block definition; each magic may be defined once.
    pub fn add_block(&mut self, block: BlockDef) -> Result<&mut Self, SchemaError> {
        if self.blocks.contains_key(&block.magic) {
            return Err(SchemaError::DuplicateBlock(block.magic.to_string()));
        }
        self.blocks.insert(block.magic, block);
        Ok(self)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Get a block definition by magic.
    pub fn get_block(&self, magic: &Magic) -> Option<&BlockDef> {
        self.blocks.get(magic)
    }

    /// Iterate over block definitions in magic order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockDef> {
        self.blocks.values()
    }

    /// Resolve the ordered fields of `magic` at `version`.
    pub fn resolve(&self, magic: &Magic, version: u32) -> Result<Vec<&Field>, SchemaError> {
        self.blocks
            .get(magic)
            .ok_or_else(|| SchemaError::UnknownMagic(magic.to_string()))?
            .fields_for(version)
    }

    /// Resolve every field set of every block, collecting all failures.
    ///
    /// One failure is reported per run of versions sharing a field set.
    pub fn check(&self) -> Vec<SchemaError> {
        self.blocks
            .values()
            .flat_map(|block| {
                block
                    .edge_versions()
                    .into_iter()
                    .filter_map(move |version| block.fields_for(version).err())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
