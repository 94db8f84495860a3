pub mod actor;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod network;
pub mod profiles;
pub mod request;
pub mod rpc;
pub mod tx;
