//! Images command - container images declared in parameters

use commodore_core::{ImageScan, PackageFile};
use commodore_extract::images;
use std::path::PathBuf;

use crate::display::{OutputFormat, print_package_files};
use crate::error::Result;
use crate::util::{collect_yaml_files, read_file};

pub fn run(paths: &[PathBuf], shallow: bool, format: OutputFormat) -> Result<()> {
    let scan = if shallow { ImageScan::Shallow } else { ImageScan::Deep };
    let files = collect_yaml_files(paths)?;
    tracing::debug!(count = files.len(), ?scan, "scanning files for images");

    let mut package_files: Vec<PackageFile> = Vec::new();
    for path in &files {
        let content = read_file(path)?;
        let name = path.to_string_lossy();
        if let Some(package_file) = images::extract_package_file(&content, &name, scan) {
            package_files.push(package_file);
        }
    }

    print_package_files(&package_files, format)
}
