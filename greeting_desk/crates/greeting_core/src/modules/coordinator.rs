//! Network / profile / greeting / transaction state.
//!
//! The coordinator never awaits. Every external call is started with a
//! `start_*` method that hands back a [`Ticket`] tagged with the network it
//! was issued for, and finished with the matching `finish_*` method. A result
//! whose ticket is no longer awaited (superseded, or issued before a network
//! switch) is discarded without touching state.

use crate::modules::error::CoreError;
use crate::modules::network::NetworkContext;
use crate::modules::profiles::{ProfileRegistry, ProfileView};
use crate::modules::request::{RequestState, RequestTracker, Ticket};
use crate::modules::rpc::GreetingUpdate;
use greeting_protocol::{Credential, Network, TransactionResult};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Resolution {
    Applied,
    Discarded,
}

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub ticket: Ticket,
    pub update: GreetingUpdate,
}

/// What the profile dropdown should say, keeping "failed to load" apart from
/// "loaded, but nothing for this network".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProfileAvailability {
    Idle,
    Loading,
    Error(String),
    NoAccounts,
    Available(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub network: Network,
    pub profiles: Vec<ProfileView>,
    pub active_profile: Option<ProfileView>,
    pub credentials: ProfileAvailability,
    pub greeting: RequestState<String>,
    pub submit: RequestState<TransactionResult>,
    pub last_result: Option<TransactionResult>,
    pub draft: String,
    pub can_submit: bool,
}

pub struct Coordinator {
    network: NetworkContext,
    credentials: Vec<Credential>,
    registry: ProfileRegistry,
    draft: String,
    last_result: Option<TransactionResult>,

    credential_state: RequestState<()>,
    greeting: RequestState<String>,
    submit: RequestState<TransactionResult>,

    credential_requests: RequestTracker,
    greeting_requests: RequestTracker,
    submit_requests: RequestTracker,
}

impl Coordinator {
    pub fn new(network: Network) -> Self {
        Self {
            network: NetworkContext::new(network),
            credentials: Vec::new(),
            registry: ProfileRegistry::default(),
            draft: String::new(),
            last_result: None,
            credential_state: RequestState::Idle,
            greeting: RequestState::Idle,
            submit: RequestState::Idle,
            credential_requests: RequestTracker::default(),
            greeting_requests: RequestTracker::default(),
            submit_requests: RequestTracker::default(),
        }
    }

    pub fn network(&self) -> Network {
        self.network.current()
    }

    pub fn subscribe_network(&self) -> watch::Receiver<Network> {
        self.network.subscribe()
    }

    pub fn profiles(&self) -> &[Credential] {
        self.registry.profiles()
    }

    pub fn active_profile(&self) -> Option<&Credential> {
        self.registry.active()
    }

    pub fn greeting(&self) -> &RequestState<String> {
        &self.greeting
    }

    pub fn submit_state(&self) -> &RequestState<TransactionResult> {
        &self.submit
    }

    pub fn last_result(&self) -> Option<&TransactionResult> {
        self.last_result.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn availability(&self) -> ProfileAvailability {
        match &self.credential_state {
            RequestState::Idle => ProfileAvailability::Idle,
            RequestState::Loading => ProfileAvailability::Loading,
            RequestState::Failed(e) => ProfileAvailability::Error(e.to_string()),
            RequestState::Success(()) if self.registry.profiles().is_empty() => {
                ProfileAvailability::NoAccounts
            }
            RequestState::Success(()) => {
                ProfileAvailability::Available(self.registry.profiles().len())
            }
        }
    }

    /// Switching re-derives the profile set from the credentials already held,
    /// drops tracking of greeting/submit requests issued for the old network,
    /// and starts a fresh credential load. Re-selecting the active network
    /// does nothing.
    pub fn select_network(&mut self, network: Network) -> Option<Ticket> {
        if !self.network.select(network) {
            tracing::debug!(%network, "network unchanged");
            return None;
        }
        tracing::info!(%network, "network selected");

        self.registry.rederive(&self.credentials, network);

        self.greeting_requests.invalidate();
        self.greeting = RequestState::Idle;

        if self.submit_requests.in_flight() {
            tracing::warn!(%network, "network switched while a submission was in flight; its result will not be shown");
        }
        self.submit_requests.invalidate();
        if self.submit.is_loading() {
            self.submit = RequestState::Idle;
        }

        Some(self.start_credential_load())
    }

    pub fn start_credential_load(&mut self) -> Ticket {
        self.credential_state = RequestState::Loading;
        self.credential_requests.issue(self.network())
    }

    pub fn finish_credential_load(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Credential>, CoreError>,
    ) -> Resolution {
        let network = self.network();
        if !self.credential_requests.settle(ticket, network) {
            tracing::debug!(issued_for = %ticket.network, %network, seq = ticket.seq, "discarding stale credential load");
            return Resolution::Discarded;
        }

        match result {
            Ok(credentials) => {
                self.credentials = credentials;
                self.registry.rederive(&self.credentials, network);
                self.credential_state = RequestState::Success(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "credential load failed");
                self.credentials.clear();
                self.registry.clear();
                self.credential_state = RequestState::Failed(e);
            }
        }
        Resolution::Applied
    }

    pub fn select_profile(&mut self, account_id: &str) -> Result<(), CoreError> {
        let network = self.network();
        let selected = self.registry.select(account_id, network)?;
        tracing::info!(account_id = %selected.account_id, %network, "profile selected");
        Ok(())
    }

    pub fn start_greeting_fetch(&mut self) -> Ticket {
        self.greeting = RequestState::Loading;
        self.greeting_requests.issue(self.network())
    }

    pub fn finish_greeting_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<String, CoreError>,
    ) -> Resolution {
        if !self.greeting_requests.settle(ticket, self.network()) {
            tracing::debug!(issued_for = %ticket.network, seq = ticket.seq, "discarding stale greeting");
            return Resolution::Discarded;
        }
        self.greeting = match result {
            Ok(text) => RequestState::Success(text),
            Err(e) => RequestState::Failed(e),
        };
        Resolution::Applied
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn can_submit(&self) -> bool {
        self.registry.active().is_some()
            && !self.draft.trim().is_empty()
            && !self.submit_requests.in_flight()
    }

    /// Gates a submission. A profile without a private key is recorded as a
    /// failed submission without issuing anything.
    pub fn start_submit(&mut self) -> Result<SubmitRequest, CoreError> {
        if self.submit_requests.in_flight() {
            return Err(CoreError::SubmissionInFlight);
        }
        let network = self.network();
        let profile = self.registry.active().ok_or(CoreError::NoProfileSelected)?;
        if self.draft.trim().is_empty() {
            return Err(CoreError::EmptyGreeting);
        }

        let Some(private_key) = profile.private_key.clone().filter(|_| profile.can_sign()) else {
            let err = CoreError::MissingSigningKey {
                account_id: profile.account_id.clone(),
            };
            self.submit = RequestState::Failed(err.clone());
            return Err(err);
        };

        let update = GreetingUpdate {
            network,
            account_id: profile.account_id.clone(),
            private_key,
            greeting: self.draft.clone(),
        };
        self.submit = RequestState::Loading;
        let ticket = self.submit_requests.issue(network);
        tracing::info!(%network, account_id = %update.account_id, seq = ticket.seq, "submitting greeting update");
        Ok(SubmitRequest { ticket, update })
    }

    /// On success the draft is cleared (unless it was edited meanwhile) and the
    /// result replaces the previous one. On failure the draft and the previous
    /// successful result are both kept.
    pub fn finish_submit(
        &mut self,
        ticket: Ticket,
        submitted: &str,
        result: Result<TransactionResult, CoreError>,
    ) -> Resolution {
        if !self.submit_requests.settle(ticket, self.network()) {
            match &result {
                Ok(r) => tracing::warn!(
                    issued_for = %ticket.network,
                    tx_hash = %r.transaction_hash,
                    "greeting update landed after a network switch; not shown"
                ),
                Err(e) => tracing::debug!(issued_for = %ticket.network, error = %e, "discarding stale submit failure"),
            }
            return Resolution::Discarded;
        }

        match result {
            Ok(r) => {
                if self.draft == submitted {
                    self.draft.clear();
                }
                self.last_result = Some(r.clone());
                self.submit = RequestState::Success(r);
            }
            Err(e) => {
                tracing::warn!(error = %e, "greeting update failed");
                self.submit = RequestState::Failed(e);
            }
        }
        Resolution::Applied
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            network: self.network(),
            profiles: self.registry.profiles().iter().map(ProfileView::from).collect(),
            active_profile: self.registry.active().map(ProfileView::from),
            credentials: self.availability(),
            greeting: self.greeting.clone(),
            submit: self.submit.clone(),
            last_result: self.last_result.clone(),
            draft: self.draft.clone(),
            can_submit: self.can_submit(),
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Network::default())
    }
}
