//! Registry credentials
//!
//! Credentials for a registry host are looked up in order:
//! - `SKIFF_REGISTRY_USERNAME` / `SKIFF_REGISTRY_PASSWORD` (CI/CD friendly)
//! - the Docker config (`$DOCKER_CONFIG/config.json`, else `~/.docker/config.json`)
//!
//! Hosts without credentials are pulled from anonymously.

use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};

/// Username variable applied to every registry
pub const USERNAME_ENV: &str = "SKIFF_REGISTRY_USERNAME";

/// Password variable applied to every registry
pub const PASSWORD_ENV: &str = "SKIFF_REGISTRY_PASSWORD";

/// Docker Hub's legacy key in Docker configs
const DOCKER_HUB_INDEX: &str = "index.docker.io";

/// Username and password for one registry
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Docker config.json format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerConfig {
    #[serde(default)]
    pub auths: HashMap<String, DockerAuth>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerAuth {
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DockerConfig {
    /// Default location, honoring `DOCKER_CONFIG`
    pub fn default_path() -> Option<PathBuf> {
        match std::env::var_os("DOCKER_CONFIG") {
            Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir).join("config.json")),
            _ => dirs::home_dir().map(|home| home.join(".docker").join("config.json")),
        }
    }

    /// Load from a path; a missing file yields an empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| RepoError::AuthFailed {
            message: format!("invalid Docker config {}: {}", path.display(), e),
        })
    }

    /// Credentials stored for `registry`
    pub fn credentials_for(&self, registry: &str) -> Option<BasicCredentials> {
        let wanted = canonical_host(registry);
        self.auths
            .iter()
            .filter(|(key, _)| canonical_host(key) == wanted)
            .find_map(|(_, auth)| auth.credentials())
    }
}

impl DockerAuth {
    fn credentials(&self) -> Option<BasicCredentials> {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some(BasicCredentials {
                username: username.clone(),
                password: password.clone(),
            });
        }

        let encoded = self.auth.as_deref().filter(|a| !a.is_empty())?;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Host part of a registry name or Docker config key
///
/// `https://index.docker.io/v1/` and `docker.io` both map to Docker Hub.
fn canonical_host(key: &str) -> String {
    let host = key
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match host.as_str() {
        "docker.io" | "registry-1.docker.io" => DOCKER_HUB_INDEX.to_string(),
        _ => host,
    }
}

/// Credential sources consulted for skeleton pulls
#[derive(Debug, Clone, Default)]
pub struct RegistryCredentials {
    env: Option<BasicCredentials>,
    docker: DockerConfig,
}

impl RegistryCredentials {
    /// Read the environment and the default Docker config
    ///
    /// An unreadable Docker config is logged and ignored.
    pub fn load() -> Self {
        let env = match (std::env::var(USERNAME_ENV), std::env::var(PASSWORD_ENV)) {
            (Ok(username), Ok(password)) if !username.is_empty() => {
                Some(BasicCredentials { username, password })
            }
            _ => None,
        };

        let docker = match DockerConfig::default_path() {
            Some(path) => DockerConfig::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("ignoring registry credentials: {}", e);
                DockerConfig::default()
            }),
            None => DockerConfig::default(),
        };

        Self { env, docker }
    }

    /// Credentials to use for `registry`, if any
    pub fn lookup(&self, registry: &str) -> Option<BasicCredentials> {
        self.env
            .clone()
            .or_else(|| self.docker.credentials_for(registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn docker_config(json: &str) -> DockerConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_docker_auth_decoding() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("bot:s3cret");
        let config = docker_config(&format!(
            r#"{{"auths": {{"https://ghcr.io": {{"auth": "{}"}}}}}}"#,
            encoded
        ));

        let creds = config.credentials_for("ghcr.io").unwrap();
        assert_eq!(creds.username, "bot");
        assert_eq!(creds.password, "s3cret");
        assert!(config.credentials_for("quay.io").is_none());
    }

    #[test]
    fn test_docker_username_password_fields() {
        let config = docker_config(
            r#"{"auths": {"localhost:5000": {"username": "admin", "password": "pw"}}}"#,
        );
        let creds = config.credentials_for("localhost:5000").unwrap();
        assert_eq!(creds.username, "admin");
    }

    #[test]
    fn test_docker_hub_aliases() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("me:tok");
        let config = docker_config(&format!(
            r#"{{"auths": {{"https://index.docker.io/v1/": {{"auth": "{}"}}}}}}"#,
            encoded
        ));
        assert_eq!(config.credentials_for("docker.io").unwrap().username, "me");
    }

    #[test]
    fn test_credential_helper_entries_are_skipped() {
        let config = docker_config(r#"{"auths": {"ghcr.io": {}}, "credsStore": "desktop"}"#);
        assert!(config.credentials_for("ghcr.io").is_none());
    }

    #[test]
    fn test_load_from_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        assert!(DockerConfig::load_from(&path).unwrap().auths.is_empty());

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            DockerConfig::load_from(&path),
            Err(RepoError::AuthFailed { .. })
        ));
    }

    #[test]
    fn test_env_credentials_take_precedence() {
        let config = docker_config(
            r#"{"auths": {"ghcr.io": {"username": "docker", "password": "pw"}}}"#,
        );
        let env = BasicCredentials {
            username: "ci".to_string(),
            password: "token".to_string(),
        };

        let creds = RegistryCredentials {
            env: Some(env),
            docker: config.clone(),
        };
        assert_eq!(creds.lookup("ghcr.io").unwrap().username, "ci");

        let creds = RegistryCredentials {
            env: None,
            docker: config,
        };
        assert_eq!(creds.lookup("ghcr.io").unwrap().username, "docker");
        assert!(creds.lookup("quay.io").is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = BasicCredentials {
            username: "u".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
