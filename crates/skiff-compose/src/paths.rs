//! Rebasing of resource paths from an imported package
//!
//! Relative paths inside an imported component are written against the
//! imported package's directory. Once the component is pulled into the
//! importing package they must resolve from the importer's base directory
//! instead.

use std::path::Path;

use skiff_core::{Action, Component, clean_path, is_url};

/// Join a relative path onto `relative_to`, leaving URLs and absolute paths alone
pub fn make_path_relative_to(path: &str, relative_to: &Path) -> String {
    if is_url(path) || Path::new(path).is_absolute() {
        return path.to_string();
    }
    clean_path(relative_to.join(path))
        .to_string_lossy()
        .into_owned()
}

/// Rebase every local resource reference of an imported component onto `import_dir`
///
/// `base_dir` is the importing package's base directory. Kustomizations are
/// only rebased when the rebased path exists under it, since they may also
/// name remote targets that are not URLs.
pub fn rewrite_paths(mut child: Component, import_dir: &Path, base_dir: &Path) -> Component {
    for file in &mut child.files {
        file.source = make_path_relative_to(&file.source, import_dir);
    }

    for archive in &mut child.image_archives {
        archive.path = make_path_relative_to(&archive.path, import_dir);
    }

    for chart in &mut child.charts {
        for values_file in &mut chart.values_files {
            *values_file = make_path_relative_to(values_file, import_dir);
        }
        if !chart.local_path.is_empty() {
            chart.local_path = make_path_relative_to(&chart.local_path, import_dir);
        }
    }

    for manifest in &mut child.manifests {
        for file in &mut manifest.files {
            *file = make_path_relative_to(file, import_dir);
        }
        for kustomization in &mut manifest.kustomizations {
            let composed = make_path_relative_to(kustomization, import_dir);
            if base_dir.join(&composed).exists() {
                *kustomization = composed;
            }
        }
    }

    for injection in &mut child.data_injections {
        injection.source = make_path_relative_to(&injection.source, import_dir);
    }

    let on_create = &mut child.actions.on_create;
    let default_dir = on_create.defaults.dir.clone();
    for actions in on_create.lists_mut() {
        rewrite_action_dirs(actions, &default_dir, import_dir);
    }

    child
}

/// Pin each create action's working directory, falling back to the set default
fn rewrite_action_dirs(actions: &mut [Action], default_dir: &str, import_dir: &Path) {
    for action in actions {
        let dir = action.dir.as_deref().unwrap_or(default_dir);
        action.dir = Some(make_path_relative_to(dir, import_dir));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn component(yaml: &str) -> Component {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_absolute_and_url_are_unchanged() {
        let dir = Path::new("../base");
        assert_eq!(make_path_relative_to("/etc/hosts", dir), "/etc/hosts");
        assert_eq!(
            make_path_relative_to("https://example.com/chart.yaml", dir),
            "https://example.com/chart.yaml"
        );
        assert_eq!(
            make_path_relative_to("oci://ghcr.io/org/chart", dir),
            "oci://ghcr.io/org/chart"
        );
    }

    #[test]
    fn test_relative_is_joined_and_cleaned() {
        let dir = Path::new("../base");
        assert_eq!(make_path_relative_to("files/a.txt", dir), "../base/files/a.txt");
        assert_eq!(make_path_relative_to("./values.yaml", dir), "../base/values.yaml");
        assert_eq!(make_path_relative_to("../shared/x", dir), "../shared/x");
        assert_eq!(make_path_relative_to("", dir), "../base");
    }

    #[test]
    fn test_rewrite_resources() {
        let child = component(
            r#"
name: app
files:
  - source: files/app.conf
    target: /etc/app.conf
  - source: https://example.com/tool
    target: /usr/bin/tool
imageArchives:
  - path: images/app.tar
charts:
  - name: podinfo
    localPath: chart
    valuesFiles: [values.yaml, /abs/values.yaml]
  - name: remote
    url: oci://ghcr.io/stefanprodan/charts/podinfo
manifests:
  - name: raw
    files: [deploy.yaml]
dataInjections:
  - source: data
    target:
      namespace: ns
      selector: app=x
      container: c
      path: /data
"#,
        );

        let out = rewrite_paths(child, Path::new("base"), Path::new("/nonexistent"));
        assert_eq!(out.files[0].source, "base/files/app.conf");
        assert_eq!(out.files[1].source, "https://example.com/tool");
        assert_eq!(out.image_archives[0].path, "base/images/app.tar");
        assert_eq!(out.charts[0].local_path, "base/chart");
        assert_eq!(out.charts[0].values_files, vec!["base/values.yaml", "/abs/values.yaml"]);
        assert_eq!(out.charts[1].local_path, "");
        assert_eq!(out.manifests[0].files, vec!["base/deploy.yaml"]);
        assert_eq!(out.data_injections[0].source, "base/data");
    }

    #[test]
    fn test_kustomizations_rewritten_only_when_present() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("base/kustomize")).unwrap();

        let child = component(
            r#"
name: app
manifests:
  - name: k
    kustomizations:
      - kustomize
      - github.com/org/repo//overlay?ref=v1
"#,
        );

        let out = rewrite_paths(child, Path::new("base"), root.path());
        assert_eq!(
            out.manifests[0].kustomizations,
            vec!["base/kustomize", "github.com/org/repo//overlay?ref=v1"]
        );
    }

    #[test]
    fn test_create_action_dirs() {
        let child = component(
            r#"
name: app
actions:
  onCreate:
    defaults:
      dir: scripts
    before:
      - cmd: ./build.sh
      - cmd: make
        dir: src
    onSuccess:
      - cmd: /bin/true
        dir: /tmp
  onDeploy:
    before:
      - cmd: echo deploy
        dir: deploy-dir
"#,
        );

        let out = rewrite_paths(child, Path::new("base"), Path::new("."));
        let before = &out.actions.on_create.before;
        assert_eq!(before[0].dir.as_deref(), Some("base/scripts"));
        assert_eq!(before[1].dir.as_deref(), Some("base/src"));
        assert_eq!(out.actions.on_create.on_success[0].dir.as_deref(), Some("/tmp"));
        // Only create-time actions run from the package directory
        assert_eq!(out.actions.on_deploy.before[0].dir.as_deref(), Some("deploy-dir"));
        // Defaults keep their declared value
        assert_eq!(out.actions.on_create.defaults.dir, "scripts");
    }

    #[test]
    fn test_rewrite_is_stable_for_absolute_import_dir() {
        let child = component("name: app\nfiles:\n  - source: a.txt\n    target: /a\n");
        let import_dir = PathBuf::from("/var/cache/skiff/oci/dirs/abc");
        let out = rewrite_paths(child, &import_dir, Path::new("."));
        assert_eq!(out.files[0].source, "/var/cache/skiff/oci/dirs/abc/a.txt");
    }
}
