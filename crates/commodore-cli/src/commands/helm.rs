//! Helm command - chart dependencies of a component repository

use commodore_extract::helm::check_package_files;
use commodore_extract::{SourceFile, extract_all_package_files};
use std::path::PathBuf;

use crate::display::{OutputFormat, print_package_files};
use crate::error::Result;
use crate::util::read_file;

pub fn run(files: &[PathBuf], format: OutputFormat) -> Result<()> {
    let sources = files
        .iter()
        .map(|path| Ok(SourceFile::new(path.to_string_lossy(), read_file(path)?)))
        .collect::<Result<Vec<_>>>()?;

    check_package_files(&sources)?;

    let package_files = extract_all_package_files(&sources).unwrap_or_default();
    print_package_files(&package_files, format)
}
