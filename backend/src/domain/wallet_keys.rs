//! Wallet API key resolution.
//!
//! Keys are opaque bearer strings. Each wallet has an admin key and an
//! invoice (read-only) key; which one a caller presented decides what it may
//! do. The wallet system that issues the keys is external, so the resolver
//! is a trait and the bundled implementation is a static table loaded from
//! configuration.

use super::errors::AllowanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyScope {
    Invoice,
    Admin,
}

/// Who is calling, resolved from the presented key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccess {
    pub wallet_id: String,
    pub user_id: String,
    pub scope: KeyScope,
    /// Every wallet owned by the same user, including `wallet_id`
    pub user_wallet_ids: Vec<String>,
}

impl WalletAccess {
    pub fn require_admin(&self) -> Result<(), AllowanceError> {
        if self.scope == KeyScope::Admin {
            Ok(())
        } else {
            Err(AllowanceError::InsufficientScope)
        }
    }

    /// Write access: only the wallet the key belongs to
    pub fn can_manage(&self, wallet_id: &str) -> bool {
        self.scope == KeyScope::Admin && self.wallet_id == wallet_id
    }

    /// Read access: any wallet of the same user
    pub fn can_read(&self, wallet_id: &str) -> bool {
        self.user_wallet_ids.iter().any(|id| id == wallet_id)
    }
}

pub trait WalletKeyResolver: Send + Sync {
    fn resolve(&self, api_key: &str) -> Option<WalletAccess>;
}

#[derive(Debug, Clone)]
struct WalletEntry {
    wallet_id: String,
    user_id: String,
    admin_key: String,
    invoice_key: String,
}

/// Fixed key table
#[derive(Debug, Clone, Default)]
pub struct StaticWalletKeys {
    wallets: Vec<WalletEntry>,
}

impl StaticWalletKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(
        mut self,
        wallet_id: &str,
        user_id: &str,
        admin_key: &str,
        invoice_key: &str,
    ) -> Self {
        self.wallets.push(WalletEntry {
            wallet_id: wallet_id.to_string(),
            user_id: user_id.to_string(),
            admin_key: admin_key.to_string(),
            invoice_key: invoice_key.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

impl WalletKeyResolver for StaticWalletKeys {
    fn resolve(&self, api_key: &str) -> Option<WalletAccess> {
        if api_key.is_empty() {
            return None;
        }

        let (entry, scope) = self.wallets.iter().find_map(|w| {
            if w.admin_key == api_key {
                Some((w, KeyScope::Admin))
            } else if w.invoice_key == api_key {
                Some((w, KeyScope::Invoice))
            } else {
                None
            }
        })?;

        let user_wallet_ids = self
            .wallets
            .iter()
            .filter(|w| w.user_id == entry.user_id)
            .map(|w| w.wallet_id.clone())
            .collect();

        Some(WalletAccess {
            wallet_id: entry.wallet_id.clone(),
            user_id: entry.user_id.clone(),
            scope,
            user_wallet_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> StaticWalletKeys {
        StaticWalletKeys::new()
            .with_wallet("w1", "alice", "admin-1", "inv-1")
            .with_wallet("w2", "alice", "admin-2", "inv-2")
            .with_wallet("w3", "bob", "admin-3", "inv-3")
    }

    #[test]
    fn test_resolve_admin_and_invoice_keys() {
        let keys = keys();

        let admin = keys.resolve("admin-1").unwrap();
        assert_eq!(admin.wallet_id, "w1");
        assert_eq!(admin.scope, KeyScope::Admin);
        assert_eq!(admin.user_wallet_ids, vec!["w1".to_string(), "w2".to_string()]);

        let invoice = keys.resolve("inv-3").unwrap();
        assert_eq!(invoice.wallet_id, "w3");
        assert_eq!(invoice.scope, KeyScope::Invoice);
        assert_eq!(invoice.user_wallet_ids, vec!["w3".to_string()]);
    }

    #[test]
    fn test_unknown_or_empty_key() {
        let keys = keys();
        assert!(keys.resolve("nope").is_none());
        assert!(keys.resolve("").is_none());
    }

    #[test]
    fn test_access_rules() {
        let keys = keys();
        let admin = keys.resolve("admin-1").unwrap();
        let invoice = keys.resolve("inv-1").unwrap();

        assert!(admin.require_admin().is_ok());
        assert_eq!(invoice.require_admin(), Err(AllowanceError::InsufficientScope));

        assert!(admin.can_manage("w1"));
        assert!(!admin.can_manage("w2"));
        assert!(!invoice.can_manage("w1"));

        assert!(invoice.can_read("w2"));
        assert!(!invoice.can_read("w3"));
    }
}
