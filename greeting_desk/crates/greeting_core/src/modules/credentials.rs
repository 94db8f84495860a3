use crate::modules::error::CoreError;
use greeting_protocol::{Credential, CredentialResponse, Network};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Source of every known account across all networks.
pub trait CredentialStore: Send + Sync + 'static {
    fn load_credentials(&self) -> impl Future<Output = Result<Vec<Credential>, CoreError>> + Send;
}

/// Key files as written by near-cli: `<root>/<network>/<account_id>.json`.
#[derive(Debug, Deserialize)]
struct KeyFile {
    public_key: String,
    #[serde(default)]
    private_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FsCredentialStore {
    root: PathBuf,
}

impl FsCredentialStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.near-credentials`
    pub fn from_home() -> Result<Self, CoreError> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::CredentialLoad("could not find home directory".to_string()))?;
        Ok(Self::new(home.join(".near-credentials")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scan(&self) -> Result<Vec<Credential>, CoreError> {
        scan_root(&self.root)
    }

    /// Envelope returned to the webview: a failure becomes `error` with an
    /// empty list instead of a rejected command.
    pub async fn load_response(&self) -> CredentialResponse {
        match self.load_credentials().await {
            Ok(credentials) => CredentialResponse {
                credentials,
                error: None,
            },
            Err(e) => CredentialResponse {
                credentials: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl CredentialStore for FsCredentialStore {
    fn load_credentials(&self) -> impl Future<Output = Result<Vec<Credential>, CoreError>> + Send {
        let root = self.root.clone();
        async move {
            tokio::task::spawn_blocking(move || scan_root(&root))
                .await
                .map_err(|e| CoreError::CredentialLoad(format!("credential scan aborted: {e}")))?
        }
    }
}

fn scan_root(root: &Path) -> Result<Vec<Credential>, CoreError> {
    tracing::info!(path = %root.display(), "looking for credentials");
    if !root.is_dir() {
        return Err(CoreError::CredentialLoad(format!(
            "failed to read credentials directory {}",
            root.display()
        )));
    }

    let mut credentials = Vec::new();
    for network in Network::ALL {
        let dir = root.join(network.as_str());
        if !dir.is_dir() {
            continue;
        }
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "skipping unreadable network directory");
                continue;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        files.sort();

        for path in files {
            if let Some(credential) = read_key_file(&path, network) {
                credentials.push(credential);
            }
        }
    }

    tracing::info!(count = credentials.len(), "credentials loaded");
    Ok(credentials)
}

fn read_key_file(path: &Path, network: Network) -> Option<Credential> {
    let account_id = match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.trim().is_empty() => stem.to_string(),
        _ => {
            tracing::warn!(path = %path.display(), "could not derive account id from file name");
            return None;
        }
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read key file");
            return None;
        }
    };

    match serde_json::from_str::<KeyFile>(&content) {
        Ok(raw) => {
            tracing::debug!(%network, account_id = %account_id, signing = raw.private_key.is_some(), "found credential");
            Some(Credential {
                account_id,
                public_key: raw.public_key,
                network,
                private_key: raw.private_key.filter(|k| !k.trim().is_empty()),
            })
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to parse key file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, network: &str, name: &str, body: &str) {
        let dir = root.join(network);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn scans_network_directories_in_stable_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "mainnet", "z.near.json", r#"{"public_key":"ed25519:z","private_key":"ed25519:zk"}"#);
        write(root, "testnet", "b.testnet.json", r#"{"account_id":"ignored","public_key":"ed25519:b"}"#);
        write(root, "testnet", "a.testnet.json", r#"{"public_key":"ed25519:a","private_key":"ed25519:ak"}"#);
        write(root, "testnet", "notes.txt", "not a key");
        write(root, "testnet", "broken.json", "{");
        write(root, "betanet", "x.json", r#"{"public_key":"ed25519:x"}"#);

        let creds = FsCredentialStore::new(root).scan().unwrap();
        let ids: Vec<_> = creds
            .iter()
            .map(|c| (c.account_id.as_str(), c.network))
            .collect();
        assert_eq!(
            ids,
            [
                ("a.testnet", Network::Testnet),
                ("b.testnet", Network::Testnet),
                ("z.near", Network::Mainnet),
            ]
        );
        assert_eq!(creds[0].private_key.as_deref(), Some("ed25519:ak"));
        assert!(creds[1].private_key.is_none());
    }

    #[test]
    fn missing_root_is_a_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = FsCredentialStore::new(tmp.path().join("absent"))
            .scan()
            .unwrap_err();
        assert!(matches!(err, CoreError::CredentialLoad(_)));
    }

    #[test]
    fn empty_root_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(FsCredentialStore::new(tmp.path()).scan().unwrap().is_empty());
    }

    #[tokio::test]
    async fn response_envelope_carries_error() {
        let tmp = tempfile::tempdir().unwrap();
        let resp = FsCredentialStore::new(tmp.path().join("absent"))
            .load_response()
            .await;
        assert!(resp.credentials.is_empty());
        assert!(resp.error.unwrap().contains("failed to read credentials directory"));
    }
}
