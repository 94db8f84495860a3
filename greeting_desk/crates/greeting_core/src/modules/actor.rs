use crate::modules::coordinator::{Coordinator, Resolution, Snapshot};
use crate::modules::credentials::CredentialStore;
use crate::modules::error::CoreError;
use crate::modules::request::Ticket;
use crate::modules::rpc::{GreetingReader, TransactionSubmitter};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use greeting_protocol::{Credential, Network, TransactionResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub const COMMAND_CAP: usize = 64;

pub enum UiCommand {
    SelectNetwork(Network),
    SelectProfile { account_id: String },
    ReloadCredentials,
    FetchGreeting,
    SetDraft(String),
    SubmitGreeting,
    Snapshot(oneshot::Sender<Snapshot>),
}

impl UiCommand {
    fn name(&self) -> &'static str {
        match self {
            UiCommand::SelectNetwork(_) => "select_network",
            UiCommand::SelectProfile { .. } => "select_profile",
            UiCommand::ReloadCredentials => "reload_credentials",
            UiCommand::FetchGreeting => "fetch_greeting",
            UiCommand::SetDraft(_) => "set_greeting_draft",
            UiCommand::SubmitGreeting => "submit_greeting",
            UiCommand::Snapshot(_) => "get_snapshot",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    State(Snapshot),
    Rejected {
        command: &'static str,
        error: CoreError,
    },
}

/// Where the actor publishes state. The desktop host forwards to the webview;
/// the CLI and tests read from a channel.
pub trait EventSink: Send + 'static {
    fn emit(&self, event: UiEvent);
}

impl EventSink for mpsc::UnboundedSender<UiEvent> {
    fn emit(&self, event: UiEvent) {
        let _ = self.send(event);
    }
}

pub struct Services<S, R, T> {
    pub store: Arc<S>,
    pub reader: Arc<R>,
    pub submitter: Arc<T>,
}

impl<S, R, T> Clone for Services<S, R, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reader: Arc::clone(&self.reader),
            submitter: Arc::clone(&self.submitter),
        }
    }
}

enum Completion {
    Credentials {
        ticket: Ticket,
        result: Result<Vec<Credential>, CoreError>,
    },
    Greeting {
        ticket: Ticket,
        result: Result<String, CoreError>,
    },
    Submit {
        ticket: Ticket,
        submitted: String,
        result: Result<TransactionResult, CoreError>,
    },
}

type Pending = FuturesUnordered<BoxFuture<'static, Completion>>;

/// Owns the [`Coordinator`] and is its only writer. External calls run as
/// pending futures on this task; their completions are applied in arrival
/// order. Returns when every command sender has been dropped.
pub async fn run<S, R, T, E>(
    mut rx: mpsc::Receiver<UiCommand>,
    services: Services<S, R, T>,
    sink: E,
    initial: Network,
) where
    S: CredentialStore,
    R: GreetingReader,
    T: TransactionSubmitter,
    E: EventSink,
{
    let mut coordinator = Coordinator::new(initial);
    let mut pending: Pending = FuturesUnordered::new();

    let ticket = coordinator.start_credential_load();
    pending.push(load_credentials(&services, ticket));
    sink.emit(UiEvent::State(coordinator.snapshot()));

    loop {
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else { return };
                handle_command(&mut coordinator, &services, &mut pending, &sink, cmd);
            }
            Some(done) = pending.next(), if !pending.is_empty() => {
                if apply(&mut coordinator, done) == Resolution::Applied {
                    sink.emit(UiEvent::State(coordinator.snapshot()));
                }
            }
        }
    }
}

fn handle_command<S, R, T, E>(
    coordinator: &mut Coordinator,
    services: &Services<S, R, T>,
    pending: &mut Pending,
    sink: &E,
    cmd: UiCommand,
) where
    S: CredentialStore,
    R: GreetingReader,
    T: TransactionSubmitter,
    E: EventSink,
{
    let name = cmd.name();
    let outcome: Result<(), CoreError> = match cmd {
        UiCommand::Snapshot(reply) => {
            let _ = reply.send(coordinator.snapshot());
            return;
        }
        UiCommand::SelectNetwork(network) => {
            match coordinator.select_network(network) {
                Some(ticket) => pending.push(load_credentials(services, ticket)),
                None => return,
            }
            Ok(())
        }
        UiCommand::SelectProfile { account_id } => coordinator.select_profile(&account_id),
        UiCommand::ReloadCredentials => {
            let ticket = coordinator.start_credential_load();
            pending.push(load_credentials(services, ticket));
            Ok(())
        }
        UiCommand::FetchGreeting => {
            let ticket = coordinator.start_greeting_fetch();
            let reader = Arc::clone(&services.reader);
            pending.push(Box::pin(async move {
                let result = reader.fetch_greeting(ticket.network).await;
                Completion::Greeting { ticket, result }
            }));
            Ok(())
        }
        UiCommand::SetDraft(text) => {
            coordinator.set_draft(text);
            Ok(())
        }
        UiCommand::SubmitGreeting => coordinator.start_submit().map(|req| {
            let submitter = Arc::clone(&services.submitter);
            let ticket = req.ticket;
            let submitted = req.update.greeting.clone();
            pending.push(Box::pin(async move {
                let result = submitter.submit(req.update).await;
                Completion::Submit {
                    ticket,
                    submitted,
                    result,
                }
            }));
        }),
    };

    match outcome {
        Ok(()) => sink.emit(UiEvent::State(coordinator.snapshot())),
        Err(error) => {
            tracing::warn!(command = name, error = %error, "command rejected");
            if matches!(error, CoreError::MissingSigningKey { .. }) {
                sink.emit(UiEvent::State(coordinator.snapshot()));
            }
            sink.emit(UiEvent::Rejected {
                command: name,
                error,
            });
        }
    }
}

fn load_credentials<S, R, T>(services: &Services<S, R, T>, ticket: Ticket) -> BoxFuture<'static, Completion>
where
    S: CredentialStore,
{
    let store = Arc::clone(&services.store);
    Box::pin(async move {
        let result = store.load_credentials().await;
        Completion::Credentials { ticket, result }
    })
}

fn apply(coordinator: &mut Coordinator, done: Completion) -> Resolution {
    match done {
        Completion::Credentials { ticket, result } => coordinator.finish_credential_load(ticket, result),
        Completion::Greeting { ticket, result } => coordinator.finish_greeting_fetch(ticket, result),
        Completion::Submit {
            ticket,
            submitted,
            result,
        } => coordinator.finish_submit(ticket, &submitted, result),
    }
}

/// Cloneable front door to a running actor.
#[derive(Clone)]
pub struct ActorHandle {
    tx: mpsc::Sender<UiCommand>,
}

#[derive(Debug, thiserror::Error)]
#[error("greeting actor unavailable")]
pub struct ActorGone;

impl ActorHandle {
    pub fn new(tx: mpsc::Sender<UiCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, cmd: UiCommand) -> Result<(), ActorGone> {
        self.tx.send(cmd).await.map_err(|_| ActorGone)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ActorGone> {
        let (reply, rx) = oneshot::channel();
        self.send(UiCommand::Snapshot(reply)).await?;
        rx.await.map_err(|_| ActorGone)
    }
}

/// Spawns the actor on the current tokio runtime.
pub fn spawn<S, R, T, E>(services: Services<S, R, T>, sink: E, initial: Network) -> ActorHandle
where
    S: CredentialStore,
    R: GreetingReader,
    T: TransactionSubmitter,
    E: EventSink,
{
    let (tx, rx) = mpsc::channel(COMMAND_CAP);
    tokio::spawn(run(rx, services, sink, initial));
    ActorHandle::new(tx)
}
