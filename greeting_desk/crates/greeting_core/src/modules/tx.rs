//! Signed `FunctionCall` transactions for the greeting contract.

use near_crypto::{InMemorySigner, SecretKey, Signer};
use near_primitives::hash::CryptoHash;
use near_primitives::transaction::{Action, FunctionCallAction, SignedTransaction, Transaction};
use near_primitives::types::{AccountId, Balance, Gas, Nonce};
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::modules::error::CoreError;

/// 30 TGas.
pub const DEFAULT_FUNCTION_CALL_GAS: Gas = 30_000_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("invalid account id {value:?}: {reason}")]
    InvalidAccountId { value: String, reason: String },
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("access key nonce {0} cannot be incremented")]
    NonceOverflow(Nonce),
}

impl From<TxError> for CoreError {
    fn from(err: TxError) -> Self {
        CoreError::Transaction(err.to_string())
    }
}

pub fn parse_account_id(value: &str) -> Result<AccountId, TxError> {
    AccountId::from_str(value.trim()).map_err(|e| TxError::InvalidAccountId {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Builds a signer from a near-cli style `ed25519:<base58>` secret.
pub fn signer_for(account_id: &str, secret: &str) -> Result<InMemorySigner, TxError> {
    let account_id = parse_account_id(account_id)?;
    let secret = Zeroizing::new(secret.trim().to_string());
    let secret_key =
        SecretKey::from_str(&secret).map_err(|e| TxError::InvalidKey(e.to_string()))?;
    Ok(InMemorySigner::from_secret_key(account_id, secret_key))
}

/// Nonce for the next transaction signed with an access key whose current
/// nonce is `current`.
pub fn next_nonce(current: Nonce) -> Result<Nonce, TxError> {
    current.checked_add(1).ok_or(TxError::NonceOverflow(current))
}

pub fn function_call(method_name: &str, args: Vec<u8>, gas: Gas, deposit: Balance) -> Action {
    Action::FunctionCall(FunctionCallAction {
        method_name: method_name.to_string(),
        args,
        gas,
        deposit,
    })
}

pub fn sign_transaction(
    signer: &InMemorySigner,
    receiver_id: AccountId,
    nonce: Nonce,
    block_hash: CryptoHash,
    actions: Vec<Action>,
) -> SignedTransaction {
    let tx = Transaction {
        signer_id: signer.account_id.clone(),
        public_key: signer.public_key.clone(),
        nonce,
        receiver_id,
        block_hash,
        actions,
    };
    let (hash, _size) = tx.get_hash_and_size();
    let signature = signer.sign(hash.as_ref());
    SignedTransaction::new(signature, tx)
}
