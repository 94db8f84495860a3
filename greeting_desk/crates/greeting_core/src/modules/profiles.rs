use crate::modules::error::CoreError;
use greeting_protocol::{Credential, Network};
use serde::Serialize;

/// Credentials belonging to `network`, in source order.
pub fn derive(all: &[Credential], network: Network) -> Vec<Credential> {
    all.iter().filter(|c| c.network == network).cloned().collect()
}

/// Keeps `previous` if it is still a member of `profiles` (by account id and
/// network), otherwise falls back to the first profile, or nothing.
pub fn reconcile_active_profile(
    previous: Option<&Credential>,
    profiles: &[Credential],
) -> Option<Credential> {
    if let Some(prev) = previous {
        if let Some(kept) = profiles.iter().find(|p| p.same_identity(prev)) {
            return Some(kept.clone());
        }
    }
    profiles.first().cloned()
}

#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Credential>,
    active: Option<Credential>,
}

impl ProfileRegistry {
    pub fn profiles(&self) -> &[Credential] {
        &self.profiles
    }

    pub fn active(&self) -> Option<&Credential> {
        self.active.as_ref()
    }

    pub fn rederive(&mut self, all: &[Credential], network: Network) {
        let next = derive(all, network);
        let active = reconcile_active_profile(self.active.as_ref(), &next);
        let unchanged = match (self.active.as_ref(), active.as_ref()) {
            (Some(prev), Some(next)) => prev.same_identity(next),
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            tracing::debug!(
                %network,
                active = active.as_ref().map(|c| c.account_id.as_str()).unwrap_or("<none>"),
                "active profile reset"
            );
        }
        self.profiles = next;
        self.active = active;
    }

    pub fn clear(&mut self) {
        self.profiles.clear();
        self.active = None;
    }

    pub fn select(&mut self, account_id: &str, network: Network) -> Result<&Credential, CoreError> {
        let found = self
            .profiles
            .iter()
            .find(|p| p.account_id == account_id && p.network == network)
            .cloned()
            .ok_or_else(|| CoreError::UnknownProfile {
                account_id: account_id.to_string(),
                network,
            })?;
        Ok(self.active.insert(found))
    }
}

/// What the UI may see of a credential: never the private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub account_id: String,
    pub public_key: String,
    pub network: Network,
    pub can_sign: bool,
}

impl From<&Credential> for ProfileView {
    fn from(c: &Credential) -> Self {
        Self {
            account_id: c.account_id.clone(),
            public_key: c.public_key.clone(),
            network: c.network,
            can_sign: c.can_sign(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(id: &str, network: Network, key: Option<&str>) -> Credential {
        Credential {
            account_id: id.to_string(),
            public_key: format!("ed25519:{id}"),
            network,
            private_key: key.map(str::to_string),
        }
    }

    fn sample() -> Vec<Credential> {
        vec![
            cred("a1", Network::Testnet, Some("k1")),
            cred("a2", Network::Mainnet, Some("k2")),
            cred("b1", Network::Testnet, None),
            cred("shared", Network::Mainnet, Some("k3")),
            cred("shared", Network::Testnet, Some("k4")),
        ]
    }

    #[test]
    fn derive_filters_and_preserves_order() {
        let ids: Vec<_> = derive(&sample(), Network::Testnet)
            .into_iter()
            .map(|c| c.account_id)
            .collect();
        assert_eq!(ids, ["a1", "b1", "shared"]);
    }

    #[test]
    fn reconcile_keeps_member_or_falls_back() {
        let testnet = derive(&sample(), Network::Testnet);
        let b1 = cred("b1", Network::Testnet, None);
        assert_eq!(
            reconcile_active_profile(Some(&b1), &testnet).unwrap().account_id,
            "b1"
        );

        let a2 = cred("a2", Network::Mainnet, Some("k2"));
        assert_eq!(
            reconcile_active_profile(Some(&a2), &testnet).unwrap().account_id,
            "a1"
        );
        assert_eq!(reconcile_active_profile(Some(&a2), &[]), None);
        assert_eq!(reconcile_active_profile(None, &[]), None);
    }

    #[test]
    fn same_account_id_on_other_network_is_a_different_profile() {
        let all = sample();
        let mut registry = ProfileRegistry::default();
        registry.rederive(&all, Network::Mainnet);
        registry.select("shared", Network::Mainnet).unwrap();

        registry.rederive(&all, Network::Testnet);
        let active = registry.active().unwrap();
        assert_eq!(active.network, Network::Testnet);
        // "shared" exists on testnet too, but identity includes the network,
        // so the selection falls back to the first testnet profile.
        assert_eq!(active.account_id, "a1");
    }

    #[test]
    fn active_is_always_a_member_across_switch_sequences() {
        let all = sample();
        for mask in 0u32..(1 << 8) {
            let mut registry = ProfileRegistry::default();
            for step in 0..8 {
                let network = if mask & (1 << step) == 0 {
                    Network::Testnet
                } else {
                    Network::Mainnet
                };
                registry.rederive(&all, network);
                if step % 3 == 2 {
                    let _ = registry.select("b1", network);
                }
                let active = registry.active().expect("both networks have profiles");
                assert_eq!(active.network, network);
                assert!(registry.profiles().iter().any(|p| p.same_identity(active)));
            }
        }
    }

    #[test]
    fn select_rejects_profiles_outside_the_set() {
        let mut registry = ProfileRegistry::default();
        registry.rederive(&sample(), Network::Testnet);
        let err = registry.select("a2", Network::Testnet).unwrap_err();
        assert!(matches!(err, CoreError::UnknownProfile { .. }));
        assert_eq!(registry.active().unwrap().account_id, "a1");
    }

    #[test]
    fn empty_network_yields_no_selection() {
        let mut registry = ProfileRegistry::default();
        let only_testnet = vec![cred("a1", Network::Testnet, Some("k1"))];
        registry.rederive(&only_testnet, Network::Testnet);
        registry.rederive(&only_testnet, Network::Mainnet);
        assert!(registry.profiles().is_empty());
        assert!(registry.active().is_none());
    }

    #[test]
    fn view_hides_private_key() {
        let view = ProfileView::from(&cred("a1", Network::Testnet, Some("secret")));
        assert!(view.can_sign);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("secret"));
    }
}
