//! OCI registry access to skeleton packages
//!
//! Skeletons are published as one manifest of an image index, under the
//! `skeleton/multi` platform. Each layer carries its path inside the package
//! in the `org.opencontainers.image.title` annotation.

use async_trait::async_trait;
use oci_distribution::Reference;
use oci_distribution::RegistryOperation;
use oci_distribution::client::{Client, ClientConfig, ClientProtocol};
use oci_distribution::manifest::OciManifest;
use oci_distribution::secrets::RegistryAuth;
use std::path::Path;

use skiff_compose::remote::{SKELETON_ARCH, SKELETON_OS};
use skiff_compose::{LayerDescriptor, RemoteError, SkeletonManifest, SkeletonSource};
use skiff_core::{MANIFEST_FILE, PackageDefinition};

use crate::credentials::{BasicCredentials, RegistryCredentials};
use crate::error::{RepoError, Result};

/// Annotation holding a layer's path inside the package
pub const TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

/// Connection options for registries
#[derive(Debug, Clone, Default)]
pub struct RemoteOptions {
    pub plain_http: bool,
    pub insecure_skip_tls_verify: bool,
    pub credentials: RegistryCredentials,
}

/// Skeleton source backed by an OCI registry
pub struct OciSkeletonSource {
    client: Client,
    credentials: RegistryCredentials,
}

impl OciSkeletonSource {
    pub fn new(options: RemoteOptions) -> Self {
        let config = ClientConfig {
            protocol: if options.plain_http {
                ClientProtocol::Http
            } else {
                ClientProtocol::Https
            },
            accept_invalid_certificates: options.insecure_skip_tls_verify,
            ..Default::default()
        };

        Self {
            client: Client::new(config),
            credentials: options.credentials,
        }
    }

    /// Authentication for the registry of `reference`
    fn auth_for(&self, reference: &Reference) -> RegistryAuth {
        registry_auth(self.credentials.lookup(reference.resolve_registry()))
    }

    /// Parse an OCI reference string
    ///
    /// Format: oci://registry/repo:tag or registry/repo:tag
    pub fn parse_reference(reference: &str) -> Result<Reference> {
        let clean = reference.trim_start_matches("oci://");

        Reference::try_from(clean).map_err(|e| RepoError::InvalidOciReference {
            reference: format!("{}: {}", reference, e),
        })
    }

    fn reference(url: &str) -> std::result::Result<Reference, RemoteError> {
        Self::parse_reference(url).map_err(|e| RemoteError::Other(e.to_string()))
    }
}

fn registry_auth(credentials: Option<BasicCredentials>) -> RegistryAuth {
    match credentials {
        Some(BasicCredentials { username, password }) => RegistryAuth::Basic(username, password),
        None => RegistryAuth::Anonymous,
    }
}

/// Classify a registry failure
fn classify(reference: &str, err: impl std::fmt::Display) -> RemoteError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("not found") || lower.contains("manifest unknown") || lower.contains("404") {
        RemoteError::NotFound(format!("{}: {}", reference, message))
    } else {
        RemoteError::Other(message)
    }
}

/// Map manifest layers to descriptors keyed by their package path
fn oci_descriptor(layer: &LayerDescriptor) -> oci_distribution::manifest::OciDescriptor {
    oci_distribution::manifest::OciDescriptor {
        media_type: layer.media_type.clone(),
        digest: layer.digest.clone(),
        size: layer.size,
        urls: None,
        annotations: None,
    }
}

fn layer_descriptors(manifest: &oci_distribution::manifest::OciImageManifest) -> Vec<LayerDescriptor> {
    manifest
        .layers
        .iter()
        .filter_map(|layer| {
            let path = layer.annotations.as_ref()?.get(TITLE_ANNOTATION)?;
            Some(LayerDescriptor {
                path: path.clone(),
                digest: layer.digest.clone(),
                media_type: layer.media_type.clone(),
                size: layer.size,
            })
        })
        .collect()
}

#[async_trait]
impl SkeletonSource for OciSkeletonSource {
    async fn resolve_root(&self, url: &str) -> std::result::Result<SkeletonManifest, RemoteError> {
        let reference = Self::reference(url)?;
        let auth = self.auth_for(&reference);

        let (manifest, digest) = self
            .client
            .pull_manifest(&reference, &auth)
            .await
            .map_err(|e| classify(url, e))?;

        let (image, digest) = match manifest {
            OciManifest::Image(image) => (image, digest),
            OciManifest::ImageIndex(index) => {
                let entry = index
                    .manifests
                    .iter()
                    .find(|m| {
                        m.platform.as_ref().is_some_and(|p| {
                            p.architecture == SKELETON_ARCH && p.os == SKELETON_OS
                        })
                    })
                    .ok_or_else(|| RemoteError::NotSkeleton(url.to_string()))?;

                let pinned = Reference::with_digest(
                    reference.registry().to_string(),
                    reference.repository().to_string(),
                    entry.digest.clone(),
                );
                let (manifest, digest) = self
                    .client
                    .pull_manifest(&pinned, &auth)
                    .await
                    .map_err(|e| classify(url, e))?;

                match manifest {
                    OciManifest::Image(image) => (image, digest),
                    OciManifest::ImageIndex(_) => {
                        return Err(RemoteError::Other(format!(
                            "nested image index for {}",
                            url
                        )));
                    }
                }
            }
        };

        tracing::debug!("resolved skeleton {} to {}", url, digest);

        Ok(SkeletonManifest {
            digest,
            layers: layer_descriptors(&image),
        })
    }

    async fn fetch_package(
        &self,
        url: &str,
        root: &SkeletonManifest,
    ) -> std::result::Result<PackageDefinition, RemoteError> {
        let reference = Self::reference(url)?;
        let layer = root.locate(MANIFEST_FILE).ok_or_else(|| {
            RemoteError::NotFound(format!("{} has no {} layer", url, MANIFEST_FILE))
        })?;

        self.client
            .auth(&reference, &self.auth_for(&reference), RegistryOperation::Pull)
            .await
            .map_err(|e| classify(url, e))?;

        let mut data = Vec::new();
        self.client
            .pull_blob(&reference, &oci_descriptor(layer), &mut data)
            .await
            .map_err(|e| classify(url, e))?;

        PackageDefinition::parse(&data)
            .map_err(|e| RemoteError::Other(format!("invalid {} in {}: {}", MANIFEST_FILE, url, e)))
    }

    async fn fetch_layer(
        &self,
        url: &str,
        layer: &LayerDescriptor,
        dest: &Path,
    ) -> std::result::Result<(), RemoteError> {
        let reference = Self::reference(url)?;
        self.client
            .auth(&reference, &self.auth_for(&reference), RegistryOperation::Pull)
            .await
            .map_err(|e| classify(url, e))?;

        let file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| RemoteError::Other(format!("{}: {}", dest.display(), e)))?;

        tracing::debug!("pulling layer {} of {}", layer.digest, url);
        self.client
            .pull_blob(&reference, &oci_descriptor(layer), file)
            .await
            .map_err(|e| classify(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_distribution::manifest::{OciDescriptor, OciImageManifest};
    use std::collections::HashMap;

    #[test]
    fn test_parse_reference() {
        let reference = OciSkeletonSource::parse_reference("oci://ghcr.io/org/podinfo:6.4.0").unwrap();
        assert_eq!(reference.registry(), "ghcr.io");
        assert_eq!(reference.repository(), "org/podinfo");
        assert_eq!(reference.tag(), Some("6.4.0"));

        assert!(OciSkeletonSource::parse_reference("oci://").is_err());
    }

    #[test]
    fn test_registry_auth_mapping() {
        assert!(matches!(registry_auth(None), RegistryAuth::Anonymous));

        let auth = registry_auth(Some(BasicCredentials {
            username: "bot".to_string(),
            password: "token".to_string(),
        }));
        match auth {
            RegistryAuth::Basic(user, pass) => {
                assert_eq!(user, "bot");
                assert_eq!(pass, "token");
            }
            _ => panic!("expected basic auth"),
        }
    }

    #[test]
    fn test_classify_not_found() {
        assert!(matches!(
            classify("oci://r/p:1", "manifest unknown"),
            RemoteError::NotFound(_)
        ));
        assert!(matches!(
            classify("oci://r/p:1", "Registry returned 404"),
            RemoteError::NotFound(_)
        ));
        assert!(matches!(
            classify("oci://r/p:1", "connection refused"),
            RemoteError::Other(_)
        ));
    }

    #[test]
    fn test_layer_descriptors_use_title() {
        let titled = |title: &str, digest: &str| {
            let mut annotations = HashMap::new();
            annotations.insert(TITLE_ANNOTATION.to_string(), title.to_string());
            OciDescriptor {
                digest: digest.to_string(),
                size: 42,
                annotations: Some(annotations.into_iter().collect()),
                ..Default::default()
            }
        };

        let manifest = OciImageManifest {
            layers: vec![
                titled("skiff.yaml", "sha256:aaa"),
                titled("components/app.tar", "sha256:bbb"),
                OciDescriptor {
                    digest: "sha256:ccc".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let layers = layer_descriptors(&manifest);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].path, "components/app.tar");
        assert_eq!(layers[1].encoded_digest(), "bbb");
        assert_eq!(layers[1].size, 42);
    }
}
