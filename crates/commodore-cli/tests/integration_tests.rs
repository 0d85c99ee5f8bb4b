//! Integration tests for CLI commands

use std::process::Command;

/// Helper to run the commodore-renovate binary
fn commodore_renovate(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_commodore-renovate"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute commodore-renovate")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

mod images_command {
    use super::*;

    #[test]
    fn test_images_single_file() {
        let output = commodore_renovate(&[
            "images",
            &format!("{}/images/standard/params.yml", fixtures_path()),
        ]);

        assert!(output.status.success(), "Expected success");
        let json = stdout_json(&output);
        let files = json.as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["datasource"], "docker");

        let deps = files[0]["deps"].as_array().unwrap();
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0]["depName"], "quay.io/argoproj/argocd");
        assert_eq!(deps[0]["currentValue"], "v2.1.7");
    }

    #[test]
    fn test_images_directory_skips_files_without_images() {
        let output = commodore_renovate(&["images", &format!("{}/images", fixtures_path())]);

        assert!(output.status.success());
        let json = stdout_json(&output);
        let files = json.as_array().unwrap();
        assert_eq!(files.len(), 2, "no-images/params.yml yields no package file");
    }

    #[test]
    fn test_images_shallow_ignores_nested_images() {
        let path = format!("{}/images/common-formats/params.yml", fixtures_path());

        let deep = stdout_json(&commodore_renovate(&["images", &path]));
        let shallow = stdout_json(&commodore_renovate(&["images", "--shallow", &path]));

        let count = |v: &serde_json::Value| v[0]["deps"].as_array().unwrap().len();
        assert_eq!(count(&deep), 4);
        assert_eq!(count(&shallow), 3);
    }

    #[test]
    fn test_images_table_output() {
        let output = commodore_renovate(&[
            "--format",
            "table",
            "images",
            &format!("{}/images/standard/params.yml", fixtures_path()),
        ]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("quay.io/metallb/speaker"));
        assert!(stdout.contains("4 dependencies, 0 skipped"));
    }

    #[test]
    fn test_images_missing_path() {
        let output = commodore_renovate(&["images", "/nonexistent/params.yml"]);

        assert_eq!(output.status.code(), Some(64));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("does not exist"));
    }
}

mod helm_command {
    use super::*;

    #[test]
    fn test_helm_standard_component() {
        let output = commodore_renovate(&[
            "helm",
            &format!("{}/helm/standard/class/defaults.yml", fixtures_path()),
            &format!("{}/helm/standard/class/component-name.yml", fixtures_path()),
        ]);

        assert!(output.status.success());
        let json = stdout_json(&output);
        let deps = json[0]["deps"].as_array().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0]["depName"], "chart-1");
        assert_eq!(deps[0]["groupName"], "component-name");
        assert_eq!(deps[1]["registryUrls"][0], "https://other-charts.example.com");
    }

    #[test]
    fn test_helm_without_defaults_file() {
        let output = commodore_renovate(&[
            "helm",
            &format!("{}/helm/standard/class/component-name.yml", fixtures_path()),
            &format!("{}/helm/mismatched/class/component-name.yml", fixtures_path()),
        ]);

        assert_eq!(output.status.code(), Some(64));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("class/defaults.ya?ml"));
    }

    #[test]
    fn test_helm_requires_two_files() {
        let output = commodore_renovate(&[
            "helm",
            &format!("{}/helm/standard/class/defaults.yml", fixtures_path()),
        ]);

        assert!(!output.status.success());
    }
}

mod components_command {
    use super::*;

    fn write_config(dir: &std::path::Path) -> String {
        let config = serde_json::json!({
            "cacheDir": dir.join("cache"),
            "commodoreCommand": "/nonexistent/commodore",
        });
        let path = dir.join("config.json");
        std::fs::write(&path, config.to_string()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_components_degrade_without_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path());
        let local_dir = format!("{}/components/global", fixtures_path());

        let output = commodore_renovate(&[
            "components",
            &format!("{}/distribution/k3d.yml", local_dir),
            "--config",
            &config,
            "--local-dir",
            &local_dir,
        ]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let json = stdout_json(&output);
        let file = &json[0];
        assert_eq!(file["packageFile"], "distribution/k3d.yml");

        let deps = file["deps"].as_array().unwrap();
        let names: Vec<_> = deps.iter().map(|d| d["depName"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["component-argocd", "component-metallb", "package-monitoring"]);

        // argocd has no url of its own and nothing rendered one
        assert!(deps[0].get("url").is_none());
        assert_eq!(deps[1]["url"], "https://github.com/projectsyn/component-metallb.git");
    }

    #[test]
    fn test_components_without_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path());

        let output = commodore_renovate(&[
            "components",
            &format!("{}/images/standard/params.yml", fixtures_path()),
            "--config",
            &config,
        ]);

        assert!(output.status.success());
        assert_eq!(stdout_json(&output), serde_json::json!([]));
    }

    #[test]
    fn test_components_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, "not json").unwrap();

        let output = commodore_renovate(&[
            "components",
            &format!("{}/components/global/distribution/k3d.yml", fixtures_path()),
            "--config",
            &config.to_string_lossy(),
        ]);

        assert_eq!(output.status.code(), Some(78));
    }
}
