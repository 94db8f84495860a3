#[cfg(feature = "desktop")]
mod commands;
mod tauri_utils;

#[cfg(feature = "desktop")]
fn main() {
    use crate::tauri_utils::app_state::AppState;
    use crate::tauri_utils::events::TauriSink;
    use greeting_core::actor::{self, ActorHandle, Services, COMMAND_CAP};
    use greeting_core::config::GreetingConfig;
    use greeting_core::credentials::FsCredentialStore;
    use greeting_core::protocol::Network;
    use greeting_core::rpc::NearRpc;
    use std::sync::Arc;
    use tauri::Manager;
    use tokio::sync::mpsc;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            let _ = app.get_webview_window("main").map(|w| w.set_focus());
        }))
        .setup(|app| {
            let config = GreetingConfig::resolve(None)?;
            let store = FsCredentialStore::from_home().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to ./.near-credentials");
                FsCredentialStore::new(".near-credentials")
            });
            let rpc = Arc::new(NearRpc::new(config)?);
            let services = Services {
                store: Arc::new(store.clone()),
                reader: Arc::clone(&rpc),
                submitter: rpc,
            };

            let (tx, rx) = mpsc::channel(COMMAND_CAP);
            app.manage(AppState {
                actor: ActorHandle::new(tx),
                store,
            });

            let sink = TauriSink(app.handle().clone());
            tauri::async_runtime::spawn(async move {
                actor::run(rx, services, sink, Network::default()).await;
                tracing::info!("greeting actor stopped");
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::load_near_credentials,
            commands::select_network,
            commands::select_profile,
            commands::reload_credentials,
            commands::fetch_greeting,
            commands::set_greeting_draft,
            commands::submit_greeting,
            commands::get_snapshot
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(not(feature = "desktop"))]
fn main() {
    eprintln!("greeting_desk was built without the `desktop` feature; rebuild with `--features desktop` or use greeting_cli.");
}
