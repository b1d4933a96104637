//! Skiff Compose - Component import resolution
//!
//! Turns a package definition whose components import other components, from
//! local directories or published skeleton packages, into a single resolved
//! definition:
//!
//! - `resolver`: depth-first import resolution with cycle detection
//! - `paths`: rebasing of imported resource paths
//! - `merge`: override semantics between importer and imported component
//! - `namespace` / `template`: scoping of template values per component
//! - `values`: values file and schema namespacing
//! - `package_template`: `###SKIFF_PKG_TMPL_*###` substitution at load time
//! - `skeleton`: content-addressed cache of skeleton component tarballs
//! - `load`: the full load pipeline used by the CLI

pub mod error;
pub mod lineage;
pub mod load;
pub mod merge;
pub mod namespace;
pub mod package_template;
pub mod paths;
pub mod remote;
pub mod resolver;
pub mod scratch;
pub mod skeleton;
pub mod template;
pub mod validate;
pub mod values;

pub use error::{ComposeError, RemoteError, Result};
pub use lineage::ImportLineage;
pub use load::{LoadOptions, LoadedDefinition, host_architecture, load_package_definition};
pub use package_template::fill_package_templates;
pub use remote::{LayerDescriptor, OfflineSource, SkeletonManifest, SkeletonSource};
pub use resolver::{ImportResolver, ResolveOptions, resolve_imports};
pub use scratch::ScratchDir;
pub use template::insert_scope_key;
