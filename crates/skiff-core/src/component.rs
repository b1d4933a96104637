//! Component definitions
//!
//! A component is the unit of deployable content inside a package. It may
//! carry an `import` pointing at a component of another package, either a
//! local directory or a published skeleton package in an OCI registry.

use serde::{Deserialize, Serialize};

use crate::package::Variable;

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// One named unit of deployable content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Selected by default when prompting
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Build and deploy targeting constraints
    #[serde(default, skip_serializing_if = "is_default")]
    pub only: OnlyTarget,

    /// Deprecated component group
    #[serde(default, rename = "group", skip_serializing_if = "String::is_empty")]
    pub deprecated_group: String,

    /// Import of a component from another package
    #[serde(default, skip_serializing_if = "ComponentImport::is_empty")]
    pub import: ComponentImport,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<Manifest>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<Chart>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_injections: Vec<DataInjection>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<ComponentFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health_checks: Vec<HealthCheck>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_archives: Vec<ImageArchive>,

    /// Deprecated lifecycle scripts
    #[serde(default, rename = "scripts", skip_serializing_if = "is_default")]
    pub deprecated_scripts: DeprecatedScripts,

    #[serde(default, skip_serializing_if = "is_default")]
    pub actions: Actions,
}

impl Component {
    /// Name of the component to select in the imported package
    ///
    /// Uses the import alias when set, otherwise the component's own name.
    pub fn import_name(&self) -> &str {
        if self.import.name.is_empty() {
            &self.name
        } else {
            &self.import.name
        }
    }

    /// Whether the component carries a path or URL import
    pub fn has_import(&self) -> bool {
        !self.import.path.is_empty() || !self.import.url.is_empty()
    }

    /// Whether the component applies to the given architecture and flavor
    ///
    /// Unset constraints match everything.
    pub fn is_compatible(&self, arch: &str, flavor: &str) -> bool {
        let satisfies_arch =
            self.only.cluster.architecture.is_empty() || self.only.cluster.architecture == arch;
        let satisfies_flavor = self.only.flavor.is_empty() || self.only.flavor == flavor;
        satisfies_arch && satisfies_flavor
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    /// Whether deploying this component needs a cluster
    pub fn requires_cluster(&self) -> bool {
        !self.images.is_empty()
            || !self.charts.is_empty()
            || !self.manifests.is_empty()
            || !self.repos.is_empty()
            || !self.data_injections.is_empty()
    }
}

/// Targeting constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlyTarget {
    /// Only deploy on this host OS (linux, darwin, windows)
    #[serde(default, rename = "localOS", skip_serializing_if = "String::is_empty")]
    pub local_os: String,

    #[serde(default, skip_serializing_if = "is_default")]
    pub cluster: OnlyCluster,

    /// Only include when building this flavor
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flavor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlyCluster {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distros: Vec<String>,
}

/// Reference to a component in another package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentImport {
    /// Name of the component to import, when it differs from the importing one
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Relative path to a directory containing a package definition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// `oci://` URL of a published skeleton package
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl ComponentImport {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.path.is_empty() && self.url.is_empty()
    }
}

/// A file or URL to place on the host or include in the package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFile {
    pub source: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shasum: String,

    #[serde(default)]
    pub target: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub executable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symlinks: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extract_path: String,

    /// Render the file content as a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,
}

impl ComponentFile {
    pub fn is_template(&self) -> bool {
        self.template.unwrap_or(false)
    }
}

/// A Helm chart to deploy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub local_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_wait: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<ChartVariable>,

    /// Package values mapped into chart values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ChartValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartVariable {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub path: String,
}

/// Maps a package value path onto a chart value path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartValue {
    /// Path in package values, e.g. `.app.replicas`
    pub source_path: String,

    /// Path in chart values, e.g. `.replicaCount`
    pub target_path: String,
}

/// Raw manifests or kustomizations to deploy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub kustomize_allow_any_directory: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kustomizations: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_wait: bool,

    /// Render manifest files as templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,
}

impl Manifest {
    pub fn is_template(&self) -> bool {
        self.template.unwrap_or(false)
    }
}

/// Data copied into a running container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInjection {
    pub source: String,

    pub target: ContainerTarget,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub compress: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerTarget {
    pub namespace: String,
    pub selector: String,
    pub container: String,
    pub path: String,
}

/// A resource whose readiness is awaited after deploy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub api_version: String,
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// A pre-pulled image tarball and the images it provides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageArchive {
    pub path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedScripts {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_output: bool,

    #[serde(default, skip_serializing_if = "is_default")]
    pub timeout_seconds: i64,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retry: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prepare: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

/// Lifecycle hooks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actions {
    #[serde(default, skip_serializing_if = "is_default")]
    pub on_create: ActionSet,

    #[serde(default, skip_serializing_if = "is_default")]
    pub on_deploy: ActionSet,

    #[serde(default, skip_serializing_if = "is_default")]
    pub on_remove: ActionSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSet {
    #[serde(default, skip_serializing_if = "is_default")]
    pub defaults: ActionDefaults,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_success: Vec<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_failure: Vec<Action>,
}

impl ActionSet {
    /// All action lists of the set, in lifecycle order
    pub fn lists_mut(&mut self) -> [&mut Vec<Action>; 4] {
        [
            &mut self.before,
            &mut self.after,
            &mut self.on_success,
            &mut self.on_failure,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefaults {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mute: bool,

    #[serde(default, skip_serializing_if = "is_default")]
    pub max_total_seconds: i64,

    #[serde(default, skip_serializing_if = "is_default")]
    pub max_retries: i64,

    /// Working directory for actions that do not set their own
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,

    #[serde(default, skip_serializing_if = "is_default")]
    pub shell: Shell,
}

/// Per-OS shell preference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shell {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub windows: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub linux: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub darwin: String,
}

/// A single command run at a lifecycle phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cmd: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<Shell>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_variables: Vec<Variable>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<ActionWait>,

    /// Render the command as a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,
}

impl Action {
    pub fn should_template(&self) -> bool {
        self.template.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionWait {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<WaitCluster>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<WaitNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitCluster {
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitNetwork {
    pub protocol: String,
    pub address: String,

    #[serde(default, skip_serializing_if = "is_default")]
    pub code: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(yaml: &str) -> Component {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_compatible_without_constraints() {
        let c = component("name: app");
        assert!(c.is_compatible("amd64", ""));
        assert!(c.is_compatible("arm64", "upstream"));
    }

    #[test]
    fn test_compatible_architecture() {
        let c = component("name: app\nonly:\n  cluster:\n    architecture: arm64\n");
        assert!(c.is_compatible("arm64", ""));
        assert!(!c.is_compatible("amd64", ""));
    }

    #[test]
    fn test_compatible_flavor() {
        let c = component("name: app\nonly:\n  flavor: upstream\n");
        assert!(c.is_compatible("amd64", "upstream"));
        assert!(!c.is_compatible("amd64", "registry1"));
        assert!(!c.is_compatible("amd64", ""));
    }

    #[test]
    fn test_import_name_prefers_alias() {
        let c = component("name: app\nimport:\n  path: ../base\n");
        assert_eq!(c.import_name(), "app");
        assert!(c.has_import());

        let c = component("name: app\nimport:\n  name: base-app\n  path: ../base\n");
        assert_eq!(c.import_name(), "base-app");
    }

    #[test]
    fn test_alias_only_is_not_an_import() {
        let c = component("name: app\nimport:\n  name: other\n");
        assert!(!c.has_import());
    }

    #[test]
    fn test_renamed_fields() {
        let c = component(
            r#"
name: app
group: legacy
only:
  localOS: linux
scripts:
  retry: true
  before: ["echo hi"]
"#,
        );
        assert_eq!(c.deprecated_group, "legacy");
        assert_eq!(c.only.local_os, "linux");
        assert!(c.deprecated_scripts.retry);
        assert_eq!(c.deprecated_scripts.before, vec!["echo hi"]);

        let yaml = serde_yaml::to_string(&c).unwrap();
        assert!(yaml.contains("localOS: linux"));
        assert!(yaml.contains("group: legacy"));
        assert!(yaml.contains("scripts:"));
    }

    #[test]
    fn test_template_flags() {
        let c = component(
            r#"
name: app
manifests:
  - name: m
    template: true
    files: [a.yaml]
files:
  - source: f.txt
    target: /tmp/f.txt
actions:
  onDeploy:
    before:
      - cmd: echo {{ .Values.x }}
        template: true
"#,
        );
        assert!(c.manifests[0].is_template());
        assert!(!c.files[0].is_template());
        assert!(c.actions.on_deploy.before[0].should_template());
        assert!(c.requires_cluster());
    }

    #[test]
    fn test_action_set_lists() {
        let mut set = ActionSet {
            before: vec![Action::default()],
            on_failure: vec![Action::default(), Action::default()],
            ..Default::default()
        };
        let total: usize = set.lists_mut().iter().map(|l| l.len()).sum();
        assert_eq!(total, 3);
    }
}
