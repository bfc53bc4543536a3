//! File system scanner for data files.
//!
//! Recursively scans directories for `*.rcd.yaml` data files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::compile::DATA_SUFFIX;

use super::manifest::Manifest;

/// Check whether a path names a data file.
pub fn is_data_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(DATA_SUFFIX))
}

/// Scan a directory for data files, sorted by path.
pub fn scan_directory(root: &Path, manifest: &Manifest) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_data_file(p) && !manifest.is_excluded(p))
        .collect();
    files.sort();
    files
}

/// Resolve data sources: files are taken as they are, directories scanned.
pub fn scan_sources(sources: &[String], base_path: &Path, manifest: &Manifest) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for source in sources {
        let path = if Path::new(source).is_absolute() {
            PathBuf::from(source)
        } else {
            base_path.join(source)
        };

        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            files.extend(scan_directory(&path, manifest));
        }
    }

    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_data_file() {
        assert!(is_data_file(Path::new("data/shops.rcd.yaml")));
        assert!(!is_data_file(Path::new("schema.yaml")));
        assert!(!is_data_file(Path::new("shops.rcd")));
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("rides/wip")).unwrap();
        fs::write(dir.path().join("shops.rcd.yaml"), "files: []").unwrap();
        fs::write(dir.path().join("rides/coaster.rcd.yaml"), "files: []").unwrap();
        fs::write(dir.path().join("rides/wip/new.rcd.yaml"), "files: []").unwrap();
        fs::write(dir.path().join("schema.yaml"), "").unwrap();

        let manifest = Manifest {
            excludes: vec!["**/wip/*".to_string()],
            ..Default::default()
        };
        let files = scan_directory(dir.path(), &manifest);
        assert_eq!(
            files,
            vec![
                dir.path().join("rides/coaster.rcd.yaml"),
                dir.path().join("shops.rcd.yaml"),
            ]
        );
    }

    #[test]
    fn test_scan_sources_mixes_files_and_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.rcd.yaml"), "files: []").unwrap();
        fs::write(dir.path().join("extra.yaml"), "files: []").unwrap();

        let files = scan_sources(
            &["data".to_string(), "extra.yaml".to_string(), "missing".to_string()],
            dir.path(),
            &Manifest::default(),
        );
        assert_eq!(
            files,
            vec![dir.path().join("data/a.rcd.yaml"), dir.path().join("extra.yaml")]
        );
    }
}
