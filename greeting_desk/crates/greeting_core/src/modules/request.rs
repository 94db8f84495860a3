use crate::modules::error::CoreError;
use greeting_protocol::Network;
use serde::Serialize;

/// Lifecycle of one async concern. Each concern owns its own value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RequestState<T> {
    Idle,
    Loading,
    Success(T),
    Failed(CoreError),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Idle
    }
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            RequestState::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            RequestState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Tag carried by an in-flight request: the network it was issued for and its
/// position in the concern's issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub network: Network,
}

/// Issues tickets for one concern and remembers which one is still awaited.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_seq: u64,
    awaited: Option<Ticket>,
}

impl RequestTracker {
    pub fn issue(&mut self, network: Network) -> Ticket {
        self.next_seq += 1;
        let ticket = Ticket {
            seq: self.next_seq,
            network,
        };
        self.awaited = Some(ticket);
        ticket
    }

    pub fn in_flight(&self) -> bool {
        self.awaited.is_some()
    }

    /// Consumes the awaited slot if `ticket` is the newest one and was issued
    /// for the network that is active now. Anything else is stale.
    pub fn settle(&mut self, ticket: Ticket, active: Network) -> bool {
        if self.awaited == Some(ticket) && ticket.network == active {
            self.awaited = None;
            true
        } else {
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.awaited = None;
    }
}
