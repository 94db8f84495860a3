use greeting_protocol::{Network, ParseNetworkError};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failures surfaced to the UI. Collaborator messages are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("{0}")]
    CredentialLoad(String),
    #[error("{0}")]
    GreetingFetch(String),
    #[error("{0}")]
    Transaction(String),
    #[error("no private key available for {account_id}")]
    MissingSigningKey { account_id: String },
    #[error("profile {account_id} is not available on {network}")]
    UnknownProfile { account_id: String, network: Network },
    #[error("no profile selected")]
    NoProfileSelected,
    #[error("greeting text is empty")]
    EmptyGreeting,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("{0}")]
    InvalidNetwork(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::CredentialLoad(_) => "credential_load",
            CoreError::GreetingFetch(_) => "greeting_fetch",
            CoreError::Transaction(_) => "transaction",
            CoreError::MissingSigningKey { .. } => "missing_signing_key",
            CoreError::UnknownProfile { .. } => "unknown_profile",
            CoreError::NoProfileSelected => "no_profile_selected",
            CoreError::EmptyGreeting => "empty_greeting",
            CoreError::SubmissionInFlight => "submission_in_flight",
            CoreError::InvalidNetwork(_) => "invalid_network",
            CoreError::Config(_) => "config",
        }
    }
}

impl From<ParseNetworkError> for CoreError {
    fn from(err: ParseNetworkError) -> Self {
        CoreError::InvalidNetwork(err.to_string())
    }
}

impl Serialize for CoreError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            kind: &'a str,
            message: String,
        }

        Wire {
            kind: self.kind(),
            message: self.to_string(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_messages_pass_through_unchanged() {
        let err = CoreError::GreetingFetch("Server error: contract not deployed".to_string());
        assert_eq!(err.to_string(), "Server error: contract not deployed");
    }

    #[test]
    fn serializes_as_kind_and_message() {
        let err = CoreError::MissingSigningKey {
            account_id: "alice.testnet".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "missing_signing_key");
        assert_eq!(json["message"], "no private key available for alice.testnet");
    }
}
