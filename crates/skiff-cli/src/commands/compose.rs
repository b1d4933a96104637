//! Compose command - print the fully resolved package definition

use crate::error::{CliError, Result};
use crate::{LoadArgs, OutputFormat};

pub async fn run(args: &LoadArgs, output: OutputFormat, keep_scratch: bool) -> Result<()> {
    let (loaded, scratch) = super::load(args).await?;

    let rendered = match output {
        OutputFormat::Yaml => loaded.package.to_yaml()?,
        OutputFormat::Json => serde_json::to_string_pretty(&loaded.package)
            .map_err(|e| CliError::internal(e.to_string()))?,
    };
    println!("{}", rendered.trim_end());

    if keep_scratch {
        if let Some(dir) = scratch.keep() {
            eprintln!("Kept scratch directory {}", dir.display());
        }
    }

    Ok(())
}
