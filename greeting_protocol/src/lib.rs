use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Testnet, Network::Mainnet];

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNetworkError(pub String);

impl fmt::Display for ParseNetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network {:?} (expected testnet or mainnet)", self.0)
    }
}

impl std::error::Error for ParseNetworkError {}

impl FromStr for Network {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            _ => Err(ParseNetworkError(s.to_string())),
        }
    }
}

/// A stored account. Identity is (`account_id`, `network`); the same account id
/// registered on both networks is two distinct credentials.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub account_id: String,
    pub public_key: String,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl Credential {
    pub fn same_identity(&self, other: &Credential) -> bool {
        self.account_id == other.account_id && self.network == other.network
    }

    pub fn can_sign(&self) -> bool {
        self.private_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CredentialResponse {
    pub credentials: Vec<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failure,
    Pending,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Success => "Success",
            TxStatus::Failure => "Failure",
            TxStatus::Pending => "Pending",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub transaction_hash: String,
    pub block_hash: String,
    pub status: TxStatus,
    pub gas_burnt: u64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_parses_loosely_and_prints_lowercase() {
        assert_eq!(" MainNet ".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!(Network::Testnet.to_string(), "testnet");
        assert!("betanet".parse::<Network>().is_err());
    }

    #[test]
    fn credential_uses_camel_case_keys() {
        let json = r#"{"accountId":"a1","publicKey":"ed25519:abc","network":"testnet"}"#;
        let cred: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(cred.account_id, "a1");
        assert_eq!(cred.network, Network::Testnet);
        assert!(!cred.can_sign());

        let out = serde_json::to_string(&cred).unwrap();
        assert!(out.contains("\"accountId\":\"a1\""));
        assert!(!out.contains("privateKey"));
    }

    #[test]
    fn identity_includes_network() {
        let a = Credential {
            account_id: "same".to_string(),
            public_key: "pk".to_string(),
            network: Network::Testnet,
            private_key: None,
        };
        let b = Credential {
            network: Network::Mainnet,
            ..a.clone()
        };
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
    }
}
