//! CLI commands

pub mod compose;
pub mod show;

use skiff_compose::{LoadOptions, LoadedDefinition, ScratchDir, load_package_definition};
use skiff_core::parse_set_variables;
use skiff_repo::{OciSkeletonSource, RegistryCredentials, RemoteOptions, SkiffConfig};

use crate::LoadArgs;
use crate::error::Result;

/// Load and compose the package named by `args`
///
/// Flags take precedence over the configuration file. The returned scratch
/// directory holds namespaced copies referenced by the definition.
pub async fn load(args: &LoadArgs) -> Result<(LoadedDefinition, ScratchDir)> {
    let config = SkiffConfig::load()?;

    let cache_path = match &args.cache_path {
        Some(path) => path.clone(),
        None => config.cache_dir()?,
    };

    let options = LoadOptions {
        flavor: args.flavor.clone(),
        architecture: args
            .architecture
            .clone()
            .unwrap_or_else(|| config.architecture.clone()),
        cache_path,
        skip_version_check: args.skip_version_check || config.skip_version_check,
        set_variables: Some(parse_set_variables(&args.set)?),
    };

    let source = OciSkeletonSource::new(RemoteOptions {
        plain_http: args.plain_http || config.plain_http,
        insecure_skip_tls_verify: args.insecure_skip_tls_verify || config.insecure_skip_tls_verify,
        credentials: RegistryCredentials::load(),
    });

    let mut scratch = ScratchDir::new();
    let loaded = load_package_definition(&args.path, &options, &source, &mut scratch).await?;
    Ok((loaded, scratch))
}
