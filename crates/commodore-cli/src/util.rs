//! Shared utility functions for CLI commands

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CliError, Result};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Expand `paths` into the YAML files they name.
///
/// Files are taken as given; directories are walked recursively and only
/// `*.yml` / `*.yaml` entries are kept, in a stable order.
pub fn collect_yaml_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(CliError::usage_with_help(
                format!("{} does not exist", path.display()),
                "pass configuration files or directories containing them",
            ));
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| CliError::Io {
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && is_yaml(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Path of `path` relative to `base`, as reported in package files
#[must_use]
pub fn relative_name(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Read a file, mapping failures to a CLI IO error naming the path
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_yaml_files_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cloud")).unwrap();
        std::fs::write(dir.path().join("common.yml"), "").unwrap();
        std::fs::write(dir.path().join("cloud/cloudscale.yaml"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let files = collect_yaml_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files.iter().map(|f| relative_name(f, dir.path())).collect();

        assert_eq!(names, vec!["cloud/cloudscale.yaml", "common.yml"]);
    }

    #[test]
    fn test_collect_yaml_files_keeps_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("params.txt");
        std::fs::write(&file, "").unwrap();

        let files = collect_yaml_files(std::slice::from_ref(&file)).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_collect_yaml_files_missing_path() {
        let err = collect_yaml_files(&[PathBuf::from("/nonexistent/commodore")]).unwrap_err();
        assert!(matches!(err, CliError::Usage { .. }));
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(
            relative_name(Path::new("/repo/distribution/k3d.yml"), Path::new("/repo")),
            "distribution/k3d.yml"
        );
        assert_eq!(
            relative_name(Path::new("other/k3d.yml"), Path::new("/repo")),
            "other/k3d.yml"
        );
    }
}
