use greeting_core::actor::ActorHandle;
use greeting_core::credentials::FsCredentialStore;

pub struct AppState {
    pub actor: ActorHandle,
    pub store: FsCredentialStore,
}
