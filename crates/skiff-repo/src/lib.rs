//! Skiff Registry Access
//!
//! This crate connects the composition engine to the outside world:
//!
//! - **OCI registries**: reading published skeleton packages for URL imports
//! - **Credentials**: registry logins from the environment or the Docker config
//! - **Configuration**: cache location and registry connection defaults
//!
//! ## Example
//!
//! ```rust,no_run
//! use skiff_compose::{LoadOptions, ScratchDir, load_package_definition};
//! use skiff_repo::{OciSkeletonSource, RegistryCredentials, RemoteOptions, SkiffConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SkiffConfig::load()?;
//! let source = OciSkeletonSource::new(RemoteOptions {
//!     credentials: RegistryCredentials::load(),
//!     ..Default::default()
//! });
//! let options = LoadOptions {
//!     cache_path: config.cache_dir()?,
//!     ..Default::default()
//! };
//!
//! let mut scratch = ScratchDir::new();
//! let loaded = load_package_definition("./my-package", &options, &source, &mut scratch).await?;
//! println!("{}", loaded.package.to_yaml()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod oci;

pub use config::SkiffConfig;
pub use credentials::{BasicCredentials, DockerConfig, RegistryCredentials};
pub use error::{RepoError, Result};
pub use oci::{OciSkeletonSource, RemoteOptions};
