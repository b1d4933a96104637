//! Skeleton component cache
//!
//! Component tarballs pulled from skeleton packages are kept in a
//! content-addressed cache shared across runs:
//!
//! ```text
//! <cache>/oci/blobs/sha256/<digest>   downloaded tarballs
//! <cache>/oci/dirs/<digest>           their extracted contents
//! <cache>/oci/dirs/<sha256(url+name)> empty stand-in for fully remote components
//! ```
//!
//! A blob already present under its digest is never downloaded again.

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component as PathComponent, Path, PathBuf};

use crate::error::{ComposeError, RemoteError, Result};
use crate::remote::{SkeletonManifest, SkeletonSource, component_layer_path};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bring the resources of `component` from the skeleton at `url` into the cache
///
/// Returns the absolute directory holding the component's local resources.
/// Components without a tarball layer get an empty directory.
pub async fn materialize(
    source: &dyn SkeletonSource,
    url: &str,
    component: &str,
    root: &SkeletonManifest,
    cache_path: &Path,
) -> Result<PathBuf> {
    let cache_root = std::path::absolute(cache_path)
        .map_err(|e| ComposeError::io("resolve cache path", cache_path, e))?
        .join("oci");

    let Some(layer) = root.locate(&component_layer_path(component)) else {
        let id = hex::encode(Sha256::digest(format!("{}{}", url, component).as_bytes()));
        let dir = cache_root.join("dirs").join(id);
        create_dir(&dir)?;
        tracing::debug!("component {} of {} has no local resources", component, url);
        return Ok(dir);
    };

    let digest = layer.encoded_digest();
    if !is_sha256_hex(digest) {
        return Err(ComposeError::Remote {
            url: url.to_string(),
            message: format!("layer {} has an invalid digest {:?}", layer.path, layer.digest),
        });
    }
    let blobs = cache_root.join("blobs").join("sha256");
    let tarball = blobs.join(digest);
    let dir = cache_root.join("dirs").join(digest);
    create_dir(&blobs)?;

    if tarball.exists() {
        tracing::debug!("using cached layer {} for {}", layer.digest, component);
    } else {
        let partial = tarball.with_extension("tmp");
        if let Err(e) = source.fetch_layer(url, layer, &partial).await {
            discard(&partial);
            return Err(remote_error(url, e));
        }
        verify_digest(&partial, digest)?;
        std::fs::rename(&partial, &tarball)
            .map_err(|e| ComposeError::io("move downloaded layer to", &tarball, e))?;
    }

    create_dir(&dir)?;
    extract_stripped(&tarball, &dir)?;
    Ok(dir)
}

fn remote_error(url: &str, err: RemoteError) -> ComposeError {
    ComposeError::Remote {
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn is_sha256_hex(digest: &str) -> bool {
    digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Remove a partial download, if any
fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove {}: {}", path.display(), e);
        }
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| ComposeError::io("create directory", dir, e))
}

/// Check a downloaded blob against its expected hex digest
fn verify_digest(path: &Path, expected: &str) -> Result<()> {
    let mut file = File::open(path).map_err(|e| ComposeError::io("open", path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| ComposeError::io("hash", path, e))?;
    let actual = hex::encode(hasher.finalize());

    if actual != expected {
        tracing::warn!("discarding downloaded layer {}: digest mismatch", path.display());
        discard(path);
        return Err(ComposeError::Extract {
            path: path.to_path_buf(),
            message: format!("digest mismatch: expected sha256:{}, got sha256:{}", expected, actual),
        });
    }
    Ok(())
}

/// Extract a (possibly gzipped) tarball into `dest`, dropping the first path component
///
/// Existing files are overwritten. Entries that would land outside `dest`
/// are rejected.
pub fn extract_stripped(tarball: &Path, dest: &Path) -> Result<()> {
    let extract_err = |message: String| ComposeError::Extract {
        path: tarball.to_path_buf(),
        message,
    };

    let mut file = File::open(tarball).map_err(|e| ComposeError::io("open", tarball, e))?;
    let mut magic = [0u8; 2];
    let read = file
        .read(&mut magic)
        .map_err(|e| ComposeError::io("read", tarball, e))?;
    let file = File::open(tarball).map_err(|e| ComposeError::io("open", tarball, e))?;

    let reader: Box<dyn Read> = if read == 2 && magic == GZIP_MAGIC {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(|e| extract_err(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| extract_err(e.to_string()))?;
        let path = entry.path().map_err(|e| extract_err(e.to_string()))?.into_owned();

        let Some(relative) = strip_first_component(&path) else {
            continue;
        };
        if relative
            .components()
            .any(|c| !matches!(c, PathComponent::Normal(_)))
        {
            return Err(extract_err(format!(
                "entry {} escapes the extraction directory",
                path.display()
            )));
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        entry
            .unpack(&target)
            .map_err(|e| extract_err(format!("{}: {}", path.display(), e)))?;
    }

    Ok(())
}

fn strip_first_component(path: &Path) -> Option<PathBuf> {
    let mut components = path
        .components()
        .skip_while(|c| matches!(c, PathComponent::CurDir));
    components.next()?;
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::LayerDescriptor;
    use async_trait::async_trait;
    use skiff_core::PackageDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn sha(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    struct Blobs {
        data: Vec<u8>,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl Blobs {
        fn serving(data: Vec<u8>) -> Self {
            Self {
                data,
                fetches: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl SkeletonSource for Blobs {
        async fn resolve_root(&self, _url: &str) -> std::result::Result<SkeletonManifest, RemoteError> {
            unreachable!()
        }

        async fn fetch_package(
            &self,
            _url: &str,
            _root: &SkeletonManifest,
        ) -> std::result::Result<PackageDefinition, RemoteError> {
            unreachable!()
        }

        async fn fetch_layer(
            &self,
            _url: &str,
            _layer: &LayerDescriptor,
            dest: &Path,
        ) -> std::result::Result<(), RemoteError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            std::fs::write(dest, &self.data).map_err(|e| RemoteError::Other(e.to_string()))?;
            if self.fail {
                return Err(RemoteError::Other("connection reset".to_string()));
            }
            Ok(())
        }
    }

    fn manifest_with(digest: &str) -> SkeletonManifest {
        SkeletonManifest {
            digest: "sha256:root".to_string(),
            layers: vec![LayerDescriptor {
                path: component_layer_path("app"),
                digest: format!("sha256:{}", digest),
                media_type: "application/vnd.skiff.layer.v1.tar".to_string(),
                size: 0,
            }],
        }
    }

    #[tokio::test]
    async fn test_materialize_extracts_and_caches() {
        let data = tarball(&[("app/values.yaml", "a: 1\n"), ("app/files/x.txt", "x")]);
        let digest = sha(&data);
        let source = Blobs::serving(data);
        let cache = TempDir::new().unwrap();
        let root = manifest_with(&digest);

        let dir = materialize(&source, "oci://r/p:1", "app", &root, cache.path())
            .await
            .unwrap();
        assert_eq!(dir, cache.path().join("oci/dirs").join(&digest));
        assert_eq!(std::fs::read_to_string(dir.join("values.yaml")).unwrap(), "a: 1\n");
        assert!(dir.join("files/x.txt").exists());
        assert!(cache.path().join("oci/blobs/sha256").join(&digest).exists());

        let again = materialize(&source, "oci://r/p:1", "app", &root, cache.path())
            .await
            .unwrap();
        assert_eq!(again, dir);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fully_remote_component_gets_empty_dir() {
        let source = Blobs::serving(Vec::new());
        let cache = TempDir::new().unwrap();
        let root = SkeletonManifest::default();

        let dir = materialize(&source, "oci://r/p:1", "app", &root, cache.path())
            .await
            .unwrap();
        let expected = sha(b"oci://r/p:1app");
        assert_eq!(dir, cache.path().join("oci/dirs").join(expected));
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_digest_mismatch_is_rejected() {
        let source = Blobs::serving(tarball(&[("app/a", "a")]));
        let cache = TempDir::new().unwrap();
        let root = manifest_with(&"0".repeat(64));

        let err = materialize(&source, "oci://r/p:1", "app", &root, cache.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("digest mismatch"));
        assert!(!cache.path().join("oci/blobs/sha256").join("0".repeat(64)).exists());
    }

    #[tokio::test]
    async fn test_invalid_digest_is_rejected() {
        let source = Blobs::serving(tarball(&[("app/a", "a")]));
        let cache = TempDir::new().unwrap();
        let root = manifest_with("../../escape");

        let err = materialize(&source, "oci://r/p:1", "app", &root, cache.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid digest"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert!(!cache.path().join("oci/blobs").exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_partial_file() {
        let data = tarball(&[("app/a", "a")]);
        let digest = sha(&data);
        let source = Blobs {
            fail: true,
            ..Blobs::serving(data)
        };
        let cache = TempDir::new().unwrap();
        let root = manifest_with(&digest);

        let err = materialize(&source, "oci://r/p:1", "app", &root, cache.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::Remote { .. }));
        let blobs = cache.path().join("oci/blobs/sha256");
        assert_eq!(std::fs::read_dir(&blobs).unwrap().count(), 0);
    }

    #[test]
    fn test_extract_gzipped() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let dir = TempDir::new().unwrap();
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(&tarball(&[("top/nested/file.txt", "hi")])).unwrap();
        let path = dir.path().join("layer.tar.gz");
        std::fs::write(&path, gz.finish().unwrap()).unwrap();

        let out = dir.path().join("out");
        extract_stripped(&path, &out).unwrap();
        assert_eq!(std::fs::read_to_string(out.join("nested/file.txt")).unwrap(), "hi");
    }

    #[test]
    fn test_strip_first_component() {
        assert_eq!(
            strip_first_component(Path::new("app/a/b")),
            Some(PathBuf::from("a/b"))
        );
        assert_eq!(
            strip_first_component(Path::new("./app/a")),
            Some(PathBuf::from("a"))
        );
        assert_eq!(strip_first_component(Path::new("app")), None);
        assert_eq!(strip_first_component(Path::new("app/")), None);
    }
}
