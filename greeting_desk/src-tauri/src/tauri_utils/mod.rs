#[cfg(feature = "desktop")]
pub mod app_state;
pub mod events;
