//! URL detection for import targets

use url::Url;

/// URL scheme of OCI registry references
pub const OCI_SCHEME: &str = "oci";

/// Whether `s` parses as a URL with an `oci` scheme
pub fn is_oci_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| u.scheme() == OCI_SCHEME)
        .unwrap_or(false)
}

/// Whether `s` parses as a URL with both a scheme and a host
///
/// Relative and absolute filesystem paths are never URLs.
pub fn is_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| !u.scheme().is_empty() && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_oci_url() {
        assert!(is_oci_url("oci://ghcr.io/org/pkg:1.0.0"));
        assert!(is_oci_url("oci://localhost:5000/pkg:0.1.0-skeleton"));
        assert!(!is_oci_url("https://ghcr.io/org/pkg"));
        assert!(!is_oci_url("ghcr.io/org/pkg:1.0.0"));
        assert!(!is_oci_url("../relative/path"));
        assert!(!is_oci_url(""));
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/manifest.yaml"));
        assert!(is_url("oci://ghcr.io/org/pkg"));
        assert!(!is_url("manifests/deploy.yaml"));
        assert!(!is_url("/abs/path/file.txt"));
        assert!(!is_url("file:///abs/path"));
    }
}
