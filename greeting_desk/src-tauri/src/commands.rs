use greeting_core::actor::UiCommand;
use greeting_core::coordinator::Snapshot;
use greeting_core::protocol::{CredentialResponse, Network};
use tauri::State;

use crate::tauri_utils::app_state::AppState;

async fn forward(state: &AppState, cmd: UiCommand) -> Result<(), String> {
    state.actor.send(cmd).await.map_err(|e| e.to_string())
}

/// Raw `{credentials, error?}` envelope straight from disk. Private keys are
/// included; the actor's snapshots never carry them.
#[tauri::command]
pub async fn load_near_credentials(state: State<'_, AppState>) -> Result<CredentialResponse, String> {
    Ok(state.store.load_response().await)
}

#[tauri::command]
pub async fn select_network(state: State<'_, AppState>, network: Network) -> Result<(), String> {
    forward(&state, UiCommand::SelectNetwork(network)).await
}

#[tauri::command]
pub async fn select_profile(state: State<'_, AppState>, account_id: String) -> Result<(), String> {
    forward(&state, UiCommand::SelectProfile { account_id }).await
}

#[tauri::command]
pub async fn reload_credentials(state: State<'_, AppState>) -> Result<(), String> {
    forward(&state, UiCommand::ReloadCredentials).await
}

#[tauri::command]
pub async fn fetch_greeting(state: State<'_, AppState>) -> Result<(), String> {
    forward(&state, UiCommand::FetchGreeting).await
}

#[tauri::command]
pub async fn set_greeting_draft(state: State<'_, AppState>, text: String) -> Result<(), String> {
    forward(&state, UiCommand::SetDraft(text)).await
}

#[tauri::command]
pub async fn submit_greeting(state: State<'_, AppState>) -> Result<(), String> {
    forward(&state, UiCommand::SubmitGreeting).await
}

#[tauri::command]
pub async fn get_snapshot(state: State<'_, AppState>) -> Result<Snapshot, String> {
    state.actor.snapshot().await.map_err(|e| e.to_string())
}
