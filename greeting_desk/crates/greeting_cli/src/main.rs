use clap::{Parser, Subcommand};
use greeting_core::actor::{self, ActorHandle, Services, UiCommand, UiEvent};
use greeting_core::config::GreetingConfig;
use greeting_core::coordinator::{ProfileAvailability, Snapshot};
use greeting_core::credentials::FsCredentialStore;
use greeting_core::protocol::Network;
use greeting_core::request::RequestState;
use greeting_core::rpc::NearRpc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "greeting_cli")]
struct Args {
    #[arg(long, default_value_t = Network::Testnet)]
    network: Network,

    /// network_config.toml to use instead of GREETING_CONFIG / ./network_config.toml.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Credentials root (defaults to ~/.near-credentials).
    #[arg(long, value_name = "PATH")]
    credentials_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the accounts available on the selected network.
    Profiles,
    /// Read the contract's current greeting.
    Get,
    /// Sign and submit a greeting update.
    Set {
        #[arg(long)]
        account: Option<String>,
        greeting: String,
    },
}

type Events = mpsc::UnboundedReceiver<UiEvent>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = GreetingConfig::resolve(args.config.as_deref())?;
    let store = match args.credentials_dir {
        Some(dir) => FsCredentialStore::new(dir),
        None => FsCredentialStore::from_home()?,
    };
    eprintln!("credentials: {}", store.root().display());

    let rpc = Arc::new(NearRpc::new(config)?);
    let services = Services {
        store: Arc::new(store),
        reader: Arc::clone(&rpc),
        submitter: rpc,
    };
    let (sink, mut events) = mpsc::unbounded_channel();
    let handle = actor::spawn(services, sink, args.network);

    let snap = wait_for(&mut events, |s| {
        !matches!(s.credentials, ProfileAvailability::Idle | ProfileAvailability::Loading)
    })
    .await?;

    match args.command {
        Command::Profiles => print_profiles(&snap),
        Command::Get => {
            handle.send(UiCommand::FetchGreeting).await?;
            let snap = wait_for(&mut events, |s| {
                matches!(s.greeting, RequestState::Success(_) | RequestState::Failed(_))
            })
            .await?;
            match snap.greeting {
                RequestState::Success(text) => println!("{text}"),
                RequestState::Failed(e) => return Err(anyhow::anyhow!("{e}")),
                _ => {}
            }
        }
        Command::Set { account, greeting } => {
            if let ProfileAvailability::Error(msg) = &snap.credentials {
                return Err(anyhow::anyhow!("could not load credentials: {msg}"));
            }
            submit(&handle, &mut events, account, greeting).await?;
        }
    }

    Ok(())
}

fn print_profiles(snap: &Snapshot) {
    match &snap.credentials {
        ProfileAvailability::Error(msg) => eprintln!("credential load failed: {msg}"),
        ProfileAvailability::NoAccounts => eprintln!("no accounts for {}", snap.network),
        _ => {}
    }
    let active = snap.active_profile.as_ref().map(|p| p.account_id.as_str());
    for p in &snap.profiles {
        let marker = if Some(p.account_id.as_str()) == active { "*" } else { " " };
        let access = if p.can_sign { "full-access" } else { "read-only" };
        println!("{marker} {}\t{}\t{access}", p.account_id, p.public_key);
    }
}

async fn submit(
    handle: &ActorHandle,
    events: &mut Events,
    account: Option<String>,
    greeting: String,
) -> anyhow::Result<()> {
    if let Some(account_id) = account {
        handle.send(UiCommand::SelectProfile { account_id }).await?;
    }
    handle.send(UiCommand::SetDraft(greeting)).await?;
    handle.send(UiCommand::SubmitGreeting).await?;

    let snap = wait_for(events, |s| {
        matches!(s.submit, RequestState::Success(_) | RequestState::Failed(_))
    })
    .await?;
    match snap.submit {
        RequestState::Success(result) => {
            eprintln!("{}", result.message);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        RequestState::Failed(e) => Err(anyhow::anyhow!("{e}")),
        _ => Ok(()),
    }
}

/// Reads actor events until a snapshot satisfies `pred`. A rejected command
/// ends the wait with its error.
async fn wait_for(events: &mut Events, pred: impl Fn(&Snapshot) -> bool) -> anyhow::Result<Snapshot> {
    loop {
        match events.recv().await {
            Some(UiEvent::State(snap)) if pred(&snap) => return Ok(snap),
            Some(UiEvent::State(_)) => {}
            Some(UiEvent::Rejected { command, error }) => {
                return Err(anyhow::anyhow!("{command} rejected: {error}"));
            }
            None => return Err(anyhow::anyhow!("greeting actor stopped")),
        }
    }
}
