//! NEAR JSON-RPC collaborators: reading the greeting and submitting updates.

use crate::modules::config::GreetingConfig;
use crate::modules::error::CoreError;
use crate::modules::tx::{
    function_call, next_nonce, parse_account_id, sign_transaction, signer_for,
    DEFAULT_FUNCTION_CALL_GAS,
};
use greeting_protocol::{Network, TransactionResult, TxStatus};
use near_jsonrpc_client::errors::JsonRpcError;
use near_jsonrpc_client::methods::broadcast_tx_commit::{
    RpcBroadcastTxCommitRequest, RpcTransactionError,
};
use near_jsonrpc_client::methods::query::{RpcQueryError, RpcQueryRequest};
use near_jsonrpc_client::JsonRpcClient;
use near_jsonrpc_primitives::types::query::QueryResponseKind;
use near_primitives::types::{AccountId, BlockReference, Finality};
use near_primitives::views::{FinalExecutionOutcomeView, FinalExecutionStatus, QueryRequest};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const GET_METHOD: &str = "get_greeting";
pub const SET_METHOD: &str = "set_greeting";
pub const UPDATE_MESSAGE: &str = "Successfully updated greeting";

/// Single-shot read of the contract's current greeting.
pub trait GreetingReader: Send + Sync + 'static {
    fn fetch_greeting(&self, network: Network) -> impl Future<Output = Result<String, CoreError>> + Send;
}

/// Signs and submits a `set_greeting` call, resolving once the network has
/// accepted (or rejected) it.
pub trait TransactionSubmitter: Send + Sync + 'static {
    fn submit(
        &self,
        update: GreetingUpdate,
    ) -> impl Future<Output = Result<TransactionResult, CoreError>> + Send;
}

#[derive(Clone, PartialEq, Eq)]
pub struct GreetingUpdate {
    pub network: Network,
    pub account_id: String,
    pub private_key: String,
    pub greeting: String,
}

impl fmt::Debug for GreetingUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreetingUpdate")
            .field("network", &self.network)
            .field("account_id", &self.account_id)
            .field("private_key", &"<redacted>")
            .field("greeting", &self.greeting)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("query failed: {0}")]
    Query(#[from] JsonRpcError<RpcQueryError>),
    #[error("broadcast failed: {0}")]
    Broadcast(#[from] JsonRpcError<RpcTransactionError>),
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected query response, wanted {0}")]
    UnexpectedResponse(&'static str),
    #[error("{0}")]
    Parse(String),
}

#[derive(Clone)]
struct Endpoint {
    client: JsonRpcClient,
    contract_id: AccountId,
    timeout: Duration,
}

#[derive(Clone)]
pub struct NearRpc {
    config: GreetingConfig,
    testnet: Endpoint,
    mainnet: Endpoint,
}

impl NearRpc {
    pub fn new(config: GreetingConfig) -> Result<Self, CoreError> {
        let endpoint = |network: Network| -> Result<Endpoint, CoreError> {
            let net = config.network(network);
            let contract_id = parse_account_id(&net.contract_id)
                .map_err(|e| CoreError::Config(format!("{network}: {e}")))?;
            Ok(Endpoint {
                client: JsonRpcClient::connect(net.rpc_url.as_str()),
                contract_id,
                timeout: net.http_timeout(),
            })
        };
        Ok(Self {
            testnet: endpoint(Network::Testnet)?,
            mainnet: endpoint(Network::Mainnet)?,
            config,
        })
    }

    pub fn config(&self) -> &GreetingConfig {
        &self.config
    }

    fn endpoint(&self, network: Network) -> &Endpoint {
        match network {
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        }
    }

    async fn fetch(&self, network: Network) -> Result<String, RpcError> {
        let endpoint = self.endpoint(network);
        let request = RpcQueryRequest {
            block_reference: BlockReference::Finality(Finality::Final),
            request: QueryRequest::CallFunction {
                account_id: endpoint.contract_id.clone(),
                method_name: GET_METHOD.to_string(),
                args: b"{}".to_vec().into(),
            },
        };

        tracing::debug!(%network, contract_id = %endpoint.contract_id, "querying greeting");
        let response = timed(endpoint.timeout, endpoint.client.call(request)).await?;
        match response.kind {
            QueryResponseKind::CallResult(result) => {
                decode_greeting(&result.result).map_err(RpcError::Parse)
            }
            _ => Err(RpcError::UnexpectedResponse("CallResult")),
        }
    }

    async fn send_update(&self, update: GreetingUpdate) -> Result<TransactionResult, CoreError> {
        let tx_err = |e: RpcError| CoreError::Transaction(e.to_string());
        let endpoint = self.endpoint(update.network);
        let signer = signer_for(&update.account_id, &update.private_key)?;

        let access_key = timed(
            endpoint.timeout,
            endpoint.client.call(RpcQueryRequest {
                block_reference: BlockReference::Finality(Finality::Final),
                request: QueryRequest::ViewAccessKey {
                    account_id: signer.account_id.clone(),
                    public_key: signer.public_key.clone(),
                },
            }),
        )
        .await
        .map_err(tx_err)?;

        let current_nonce = match access_key.kind {
            QueryResponseKind::AccessKey(view) => view.nonce,
            _ => return Err(tx_err(RpcError::UnexpectedResponse("AccessKey"))),
        };

        let args = serde_json::to_vec(&json!({ "greeting": update.greeting }))
            .map_err(|e| CoreError::Transaction(format!("failed to encode args: {e}")))?;

        let signed = sign_transaction(
            &signer,
            endpoint.contract_id.clone(),
            next_nonce(current_nonce)?,
            access_key.block_hash,
            vec![function_call(SET_METHOD, args, DEFAULT_FUNCTION_CALL_GAS, 0)],
        );

        tracing::info!(
            network = %update.network,
            account_id = %update.account_id,
            tx_hash = %signed.get_hash(),
            "broadcasting greeting update"
        );

        let outcome = timed(
            endpoint.timeout,
            endpoint.client.call(RpcBroadcastTxCommitRequest {
                signed_transaction: signed,
            }),
        )
        .await
        .map_err(tx_err)?;

        outcome_to_result(outcome)
    }
}

async fn timed<T, E>(
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, RpcError>
where
    RpcError: From<E>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(RpcError::from),
        Err(_) => Err(RpcError::Timeout(limit)),
    }
}

impl GreetingReader for NearRpc {
    fn fetch_greeting(&self, network: Network) -> impl Future<Output = Result<String, CoreError>> + Send {
        async move {
            self.fetch(network)
                .await
                .map_err(|e| CoreError::GreetingFetch(e.to_string()))
        }
    }
}

impl TransactionSubmitter for NearRpc {
    fn submit(
        &self,
        update: GreetingUpdate,
    ) -> impl Future<Output = Result<TransactionResult, CoreError>> + Send {
        self.send_update(update)
    }
}

/// Contracts return either `{"greeting": ".."}` or a bare JSON string.
pub fn decode_greeting(raw: &[u8]) -> Result<String, String> {
    #[derive(Deserialize)]
    struct GreetingResponse {
        greeting: String,
    }

    if let Ok(resp) = serde_json::from_slice::<GreetingResponse>(raw) {
        return Ok(resp.greeting);
    }
    if let Ok(text) = serde_json::from_slice::<String>(raw) {
        return Ok(text);
    }
    String::from_utf8(raw.to_vec())
        .map(|s| s.trim_matches('"').to_string())
        .map_err(|e| format!("Failed to parse response as string: {e}"))
}

fn outcome_to_result(outcome: FinalExecutionOutcomeView) -> Result<TransactionResult, CoreError> {
    let status = match &outcome.status {
        FinalExecutionStatus::Failure(err) => {
            return Err(CoreError::Transaction(format!("Failed to update greeting: {err}")));
        }
        FinalExecutionStatus::SuccessValue(_) => TxStatus::Success,
        FinalExecutionStatus::NotStarted | FinalExecutionStatus::Started => TxStatus::Pending,
    };

    let gas_burnt = outcome
        .receipts_outcome
        .iter()
        .fold(outcome.transaction_outcome.outcome.gas_burnt, |acc, r| {
            acc.saturating_add(r.outcome.gas_burnt)
        });
    let transaction_hash = outcome.transaction.hash.to_string();

    tracing::info!(%transaction_hash, gas_burnt, status = status.as_str(), "greeting update resolved");

    Ok(TransactionResult {
        transaction_hash,
        block_hash: outcome.transaction_outcome.block_hash.to_string(),
        status,
        gas_burnt,
        message: UPDATE_MESSAGE.to_string(),
    })
}
