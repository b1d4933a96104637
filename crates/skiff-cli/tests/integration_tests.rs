//! Integration tests for CLI commands

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run the skiff binary with an isolated config and cache
fn skiff(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_skiff"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("RUST_LOG")
        .env_remove("DOCKER_CONFIG")
        .output()
        .expect("Failed to execute skiff")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A package importing two components from a sibling package
fn composed_package() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/skiff.yaml",
        r#"
kind: SkiffPackageConfig
metadata:
  name: demo
  version: 1.0.0
components:
  - name: frontend
    required: true
    import:
      path: ../library
      name: web
  - name: tools
    description: Operator tooling
    import:
      path: ../library
variables:
  - name: DOMAIN
    default: demo.local
values:
  files: [values.yaml]
"#,
    );
    write(dir.path(), "app/values.yaml", "frontend:\n  replicas: 2\n");
    write(
        dir.path(),
        "library/skiff.yaml",
        r#"
metadata:
  name: library
components:
  - name: web
    description: Web frontend
    manifests:
      - name: web
        files: [manifests/web.yaml]
    images: ["nginx:1.25"]
  - name: tools
    description: Library tooling
    files:
      - source: bin/tool
        target: /usr/local/bin/tool
variables:
  - name: DOMAIN
    default: library.local
  - name: PORT
    default: "8080"
values:
  files: [values.yaml]
"#,
    );
    write(dir.path(), "library/values.yaml", "replicas: 1\n");
    write(dir.path(), "library/manifests/web.yaml", "kind: Deployment\n");
    dir
}

mod compose_command {
    use super::*;

    #[test]
    fn test_compose_yaml() {
        let pkg = composed_package();
        let home = TempDir::new().unwrap();
        let path = pkg.path().join("app");

        let output = skiff(home.path(), &["compose", path.to_str().unwrap(), "--arch", "amd64"]);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let composed: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
        let components = composed["components"].as_sequence().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["name"], "frontend");
        assert_eq!(components[0]["description"], "Web frontend");
        assert_eq!(
            components[0]["manifests"][0]["files"][0],
            "../library/manifests/web.yaml"
        );
        assert!(components[0].get("import").is_none());
        assert_eq!(components[1]["description"], "Operator tooling");
        assert_eq!(composed["metadata"]["architecture"], "amd64");

        let variables = composed["variables"].as_sequence().unwrap();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0]["default"], "demo.local");
    }

    #[test]
    fn test_compose_json() {
        let pkg = composed_package();
        let home = TempDir::new().unwrap();
        let path = pkg.path().join("app");

        let output = skiff(home.path(), &["compose", path.to_str().unwrap(), "-o", "json"]);
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        assert_eq!(json["metadata"]["name"], "demo");
        assert_eq!(json["components"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_compose_keep_scratch() {
        let pkg = composed_package();
        let home = TempDir::new().unwrap();
        let path = pkg.path().join("app");

        let output = skiff(home.path(), &["compose", path.to_str().unwrap(), "--keep-scratch"]);
        assert!(output.status.success());

        let composed: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
        let files = composed["values"]["files"].as_sequence().unwrap();
        let namespaced = files[0].as_str().unwrap();
        let content = std::fs::read_to_string(namespaced).unwrap();
        assert!(content.contains("frontend"));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Kept scratch directory"));
        let _ = std::fs::remove_dir_all(Path::new(namespaced).parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_compose_cycle_fails() {
        let dir = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        write(
            dir.path(),
            "a/skiff.yaml",
            "components:\n  - name: x\n    import:\n      path: ../b\n",
        );
        write(
            dir.path(),
            "b/skiff.yaml",
            "components:\n  - name: x\n    import:\n      path: ../a\n",
        );

        let path = dir.path().join("a");
        let output = skiff(home.path(), &["compose", path.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("imported in cycle"));
    }

    #[test]
    fn test_compose_set_package_templates() {
        let dir = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        write(
            dir.path(),
            "skiff.yaml",
            "metadata:\n  name: tmpl\ncomponents:\n  - name: web\n    images: ['web:###SKIFF_PKG_TMPL_TAG###']\n",
        );
        let path = dir.path().to_str().unwrap();

        let output = skiff(home.path(), &["compose", path, "--set", "tag=1.4.0"]);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let composed: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
        assert_eq!(composed["components"][0]["images"][0], "web:1.4.0");

        let output = skiff(home.path(), &["compose", path]);
        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stderr).contains("TAG"));
    }

    #[test]
    fn test_compose_missing_package() {
        let home = TempDir::new().unwrap();
        let missing = home.path().join("nope");
        let output = skiff(home.path(), &["compose", missing.to_str().unwrap()]);
        assert!(!output.status.success());
    }
}

mod show_command {
    use super::*;

    #[test]
    fn test_show_summary() {
        let pkg = composed_package();
        let home = TempDir::new().unwrap();
        let path = pkg.path().join("app");

        let output = skiff(home.path(), &["show", path.to_str().unwrap()]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("demo"));
        assert!(stdout.contains("frontend"));
        assert!(stdout.contains("required"));
        assert!(stdout.contains("cluster"));
        assert!(stdout.contains("1 manifests"));
        assert!(stdout.contains("DOMAIN"));
    }
}
