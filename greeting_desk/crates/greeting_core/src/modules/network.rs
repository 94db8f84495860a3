use greeting_protocol::Network;
use tokio::sync::watch;

/// Holds the single active network. Subscribers are woken once per distinct
/// new value; re-selecting the current network is a silent no-op.
pub struct NetworkContext {
    tx: watch::Sender<Network>,
}

impl NetworkContext {
    pub fn new(initial: Network) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Network {
        *self.tx.borrow()
    }

    /// Returns `true` when the active network actually changed.
    pub fn select(&self, network: Network) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == network {
                false
            } else {
                *current = network;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Network> {
        self.tx.subscribe()
    }
}

impl Default for NetworkContext {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_once_per_distinct_value() {
        let ctx = NetworkContext::new(Network::Testnet);
        let mut rx = ctx.subscribe();

        assert!(!ctx.select(Network::Testnet));
        assert!(!rx.has_changed().unwrap());

        assert!(ctx.select(Network::Mainnet));
        assert!(!ctx.select(Network::Mainnet));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Network::Mainnet);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(ctx.current(), Network::Mainnet);
    }
}
