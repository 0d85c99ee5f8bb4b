//! Display formatting for CLI output
//!
//! Package files are printed either as JSON for the host engine or as a
//! table for humans, one line per dependency.

use clap::ValueEnum;
use commodore_core::{PackageDependency, PackageFile};
use console::style;
use std::fmt::Write;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Print extraction results to stdout
pub fn print_package_files(files: &[PackageFile], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(files)
                .map_err(|e| CliError::internal(format!("failed to serialize output: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Table => print!("{}", render_table(files)),
    }
    Ok(())
}

pub fn render_table(files: &[PackageFile]) -> String {
    let mut out = String::new();
    if files.is_empty() {
        let _ = writeln!(out, "{}", style("No dependencies found").dim());
        return out;
    }

    for file in files {
        let name = file.package_file.as_deref().unwrap_or("<unknown>");
        let datasource = file
            .datasource
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        let _ = writeln!(out, "{}{}", style(name).cyan().bold(), style(datasource).dim());

        let width = file.deps.iter().map(|d| d.dep_name.len()).max().unwrap_or(0);
        for dep in &file.deps {
            let _ = writeln!(out, "  {}", dependency_line(dep, width));
        }
    }

    let total: usize = files.iter().map(|f| f.deps.len()).sum();
    let skipped = files
        .iter()
        .flat_map(|f| &f.deps)
        .filter(|d| d.is_skipped())
        .count();
    let _ = writeln!(
        out,
        "\n{} dependencies, {} skipped",
        style(total).bold(),
        style(skipped).yellow()
    );
    out
}

fn dependency_line(dep: &PackageDependency, width: usize) -> String {
    let version = match (&dep.current_value, &dep.current_digest) {
        (Some(v), Some(d)) => format!("{}@{}", v, d),
        (Some(v), None) => v.clone(),
        (None, Some(d)) => d.clone(),
        (None, None) => "-".to_string(),
    };

    let mut line = format!("{:<width$}  {}", dep.dep_name, version, width = width);
    if let Some(url) = &dep.url {
        let _ = write!(line, "  {}", style(url).dim());
    }
    if let Some(reason) = dep.skip_reason {
        let _ = write!(line, "  {}", style(format!("[{}]", reason)).yellow().bold());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use commodore_core::{Datasource, SkipReason};

    fn sample() -> Vec<PackageFile> {
        let ok = PackageDependency {
            current_value: Some("v1.2.3".to_string()),
            url: Some("https://github.com/projectsyn/component-argocd.git".to_string()),
            ..PackageDependency::new("component-argocd")
        };
        let skipped = PackageDependency {
            skip_reason: Some(SkipReason::NoVersion),
            ..PackageDependency::new("pkg.foo")
        };
        vec![PackageFile {
            package_file: Some("c-cluster-id-1234.yml".to_string()),
            datasource: Some(Datasource::GitRefs),
            deps: vec![ok, skipped],
        }]
    }

    #[test]
    fn test_render_table() {
        let table = console::strip_ansi_codes(&render_table(&sample())).to_string();

        assert!(table.contains("c-cluster-id-1234.yml (git-refs)"));
        assert!(table.contains("component-argocd  v1.2.3"));
        assert!(table.contains("pkg.foo           -  [no-version]"));
        assert!(table.contains("2 dependencies, 1 skipped"));
    }

    #[test]
    fn test_render_empty_table() {
        let table = console::strip_ansi_codes(&render_table(&[])).to_string();
        assert_eq!(table.trim(), "No dependencies found");
    }

    #[test]
    fn test_digest_is_appended() {
        let dep = PackageDependency {
            current_value: Some("1.0".to_string()),
            current_digest: Some("sha256:abc".to_string()),
            ..PackageDependency::new("docker.io/library/nginx")
        };
        let line = console::strip_ansi_codes(&dependency_line(&dep, 0)).to_string();
        assert_eq!(line, "docker.io/library/nginx  1.0@sha256:abc");
    }
}
