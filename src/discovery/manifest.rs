//! Project manifest (rcdgen.yaml) parsing.
//!
//! The manifest names the schema, where data files are found, where output
//! goes, and the default sprite options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RcdError, Result};
use crate::sprite::{EmptySprite, DEFAULT_TRANSPARENT};

/// Project manifest loaded from rcdgen.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Schema file.
    pub schema: PathBuf,

    /// Data files, or directories scanned for `*.rcd.yaml` files.
    /// Defaults to the project directory if empty.
    pub data: Vec<String>,

    /// Output directory for RCD files.
    pub output: PathBuf,

    /// Default handling of fully transparent sprites.
    pub empty_sprites: EmptySprite,

    /// Palette index of transparent pixels.
    pub transparent: u8,

    /// Patterns to exclude from data discovery.
    pub excludes: Vec<String>,
}

fn default_schema() -> PathBuf {
    PathBuf::from("schema.yaml")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            data: vec![],
            output: default_output(),
            empty_sprites: EmptySprite::default(),
            transparent: DEFAULT_TRANSPARENT,
            excludes: vec![],
        }
    }
}

impl Manifest {
    /// Load manifest from an rcdgen.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RcdError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| RcdError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check rcdgen.yaml syntax".to_string()),
        })
    }

    /// Check if a path should be excluded based on exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.excludes
            .iter()
            .any(|pattern| Self::matches_pattern(&path_str, pattern))
    }

    /// Simple glob matching: `*.ext`, `dir/*`, `**/dir/*`, or a plain substring.
    fn matches_pattern(path: &str, pattern: &str) -> bool {
        if let Some(suffix) = pattern.strip_prefix("**/") {
            if let Some(dir) = suffix.strip_suffix("/*") {
                return path.contains(&format!("/{}/", dir)) || path.starts_with(&format!("{}/", dir));
            }
            return path.contains(suffix);
        }

        if let Some(suffix) = pattern.strip_prefix('*') {
            if !pattern.contains('/') {
                return path.ends_with(suffix);
            }
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", prefix))
                || path.contains(&format!("/{}/", prefix));
        }

        path.contains(pattern)
    }

    /// Get effective data sources, defaulting to the project directory.
    pub fn effective_data(&self) -> Vec<String> {
        if self.data.is_empty() {
            vec![".".to_string()]
        } else {
            self.data.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::parse("output: build").unwrap();

        assert_eq!(manifest.output, PathBuf::from("build"));
        assert_eq!(manifest.schema, PathBuf::from("schema.yaml"));
        assert!(manifest.data.is_empty());
        assert_eq!(manifest.empty_sprites, EmptySprite::Omit);
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
schema: defs/freerct.yaml
data:
  - data/
  - extra/shop.rcd.yaml
output: rcd
empty_sprites: blank
transparent: 255
excludes:
  - "*.bak"
  - "**/wip/*"
"#;
        let manifest = Manifest::parse(yaml).unwrap();

        assert_eq!(manifest.schema, PathBuf::from("defs/freerct.yaml"));
        assert_eq!(manifest.data, vec!["data/", "extra/shop.rcd.yaml"]);
        assert_eq!(manifest.output, PathBuf::from("rcd"));
        assert_eq!(manifest.empty_sprites, EmptySprite::Blank);
        assert_eq!(manifest.transparent, 255);
        assert_eq!(manifest.excludes, vec!["*.bak", "**/wip/*"]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Manifest::parse("scale: 4").is_err());
    }

    #[test]
    fn test_effective_data() {
        let mut manifest = Manifest::default();
        assert_eq!(manifest.effective_data(), vec!["."]);

        manifest.data = vec!["data/".to_string()];
        assert_eq!(manifest.effective_data(), vec!["data/"]);
    }

    #[test]
    fn test_is_excluded() {
        let manifest = Manifest {
            excludes: vec!["*.bak".to_string(), "**/wip/*".to_string(), "temp".to_string()],
            ..Default::default()
        };

        assert!(manifest.is_excluded(Path::new("path/to/shops.rcd.yaml.bak")));
        assert!(manifest.is_excluded(Path::new("data/wip/rides.rcd.yaml")));
        assert!(manifest.is_excluded(Path::new("wip/rides.rcd.yaml")));
        assert!(manifest.is_excluded(Path::new("temp/a.rcd.yaml")));
        assert!(!manifest.is_excluded(Path::new("data/shops.rcd.yaml")));
    }

    #[test]
    fn test_parse_empty_manifest() {
        assert_eq!(Manifest::parse("").unwrap(), Manifest::default());
    }
}
