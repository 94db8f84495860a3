pub mod modules;

pub use greeting_protocol as protocol;
pub use modules::{actor, config, coordinator, credentials, error, network, profiles, request, rpc, tx};
