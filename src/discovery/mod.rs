//! Project discovery for rcdgen.
//!
//! Finds the project manifest (`rcdgen.yaml`, optional) and the data files
//! it points at, scanning directories for `*.rcd.yaml` files.
//!
//! # Example
//!
//! ```ignore
//! use rcdgen::discovery::discover;
//!
//! let project = discover("./freerct")?;
//! println!("Found {} data files", project.data_files.len());
//! ```

mod manifest;
mod scanner;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use manifest::Manifest;
pub use scanner::{is_data_file, scan_directory, scan_sources};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "rcdgen.yaml";

/// A discovered project.
#[derive(Debug)]
pub struct Project {
    /// The project root directory.
    pub root: PathBuf,

    /// The loaded manifest (default if no rcdgen.yaml was found).
    pub manifest: Manifest,

    /// Whether an rcdgen.yaml manifest was found.
    pub has_manifest: bool,

    /// Data files, sorted per source.
    pub data_files: Vec<PathBuf>,
}

impl Project {
    /// The schema path, relative to the project root.
    pub fn schema_path(&self) -> PathBuf {
        self.root.join(&self.manifest.schema)
    }

    /// The output directory, relative to the project root.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.manifest.output)
    }
}

/// Discover a project rooted at `root`.
pub fn discover(root: impl AsRef<Path>) -> Result<Project> {
    let root = root.as_ref().to_path_buf();
    let manifest_path = root.join(MANIFEST_FILENAME);

    let (manifest, has_manifest) = if manifest_path.exists() {
        (Manifest::load(&manifest_path)?, true)
    } else {
        (Manifest::default(), false)
    };

    let data_files = scan_sources(&manifest.effective_data(), &root, &manifest);

    Ok(Project {
        root,
        manifest,
        has_manifest,
        data_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discover_without_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("shops.rcd.yaml"), "files: []").unwrap();

        let project = discover(dir.path()).unwrap();
        assert!(!project.has_manifest);
        assert_eq!(project.data_files.len(), 1);
        assert_eq!(project.schema_path(), dir.path().join("schema.yaml"));
        assert_eq!(project.output_dir(), dir.path().join("dist"));
    }

    #[test]
    fn test_discover_with_manifest() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            "schema: defs.yaml\ndata: [data]\noutput: out\n",
        )
        .unwrap();
        fs::write(dir.path().join("data/a.rcd.yaml"), "files: []").unwrap();
        fs::write(dir.path().join("ignored.rcd.yaml"), "files: []").unwrap();

        let project = discover(dir.path()).unwrap();
        assert!(project.has_manifest);
        assert_eq!(project.data_files, vec![dir.path().join("data/a.rcd.yaml")]);
        assert_eq!(project.schema_path(), dir.path().join("defs.yaml"));
    }
}
