//! Data files: which blocks go into which output file.
//!
//! ```yaml
//! files:
//!   - target: shops.rcd
//!     empty_sprites: omit
//!     blocks:
//!       - magic: SHOP
//!         version: 2
//!         fields:
//!           height: 3
//! ```
//!
//! `fields` may also be a list of single-entry mappings, which allows a
//! field to be given more than once.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RcdError, Result};
use crate::schema::Magic;
use crate::sprite::EmptySprite;

/// File name suffix of data files found by directory scans.
pub const DATA_SUFFIX: &str = ".rcd.yaml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataFile {
    files: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    target: PathBuf,
    #[serde(default)]
    empty_sprites: Option<EmptySprite>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    magic: Magic,
    version: u32,
    #[serde(default)]
    fields: Option<RawFields>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFields {
    Map(serde_yaml::Mapping),
    List(Vec<serde_yaml::Mapping>),
}

/// One block to build: magic, version and the field bindings in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub magic: Magic,
    pub version: u32,
    pub fields: Vec<(String, serde_yaml::Value)>,
}

impl BlockSpec {
    /// The last binding of a field.
    pub fn binding(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.fields
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Bound field names in file order, repeats included.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// One output file to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub target: PathBuf,
    pub empty_sprites: Option<EmptySprite>,
    pub blocks: Vec<BlockSpec>,
}

/// A loaded data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    pub path: PathBuf,
    /// Directory sheet paths are relative to.
    pub base_dir: PathBuf,
    pub outputs: Vec<OutputSpec>,
}

impl DataFile {
    /// Load a data file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RcdError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read data file: {}", e),
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut data = Self::parse(&content, &base_dir)?;
        data.path = path.to_path_buf();
        Ok(data)
    }

    /// Parse a data file; sheet paths resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let raw: RawDataFile = serde_yaml::from_str(content).map_err(|e| RcdError::Parse {
            message: format!("Invalid data file: {}", e),
            help: Some("Expected a 'files' list of { target, blocks }".to_string()),
        })?;

        let outputs = raw
            .files
            .into_iter()
            .map(|output| {
                let blocks = output
                    .blocks
                    .into_iter()
                    .map(|block| {
                        Ok(BlockSpec {
                            magic: block.magic,
                            version: block.version,
                            fields: flatten_fields(block.magic, block.fields)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(OutputSpec {
                    target: output.target,
                    empty_sprites: output.empty_sprites,
                    blocks,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path: PathBuf::new(),
            base_dir: base_dir.to_path_buf(),
            outputs,
        })
    }
}

fn flatten_fields(
    magic: Magic,
    fields: Option<RawFields>,
) -> Result<Vec<(String, serde_yaml::Value)>> {
    let mappings = match fields {
        None => Vec::new(),
        Some(RawFields::Map(map)) => vec![map],
        Some(RawFields::List(list)) => list,
    };

    let mut out = Vec::new();
    for mapping in mappings {
        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => {
                    return Err(RcdError::Parse {
                        message: format!("Field name {:?} in block '{}' is not a string", other, magic),
                        help: None,
                    })
                }
            };
            out.push((name, value));
        }
    }
    Ok(out)
}
