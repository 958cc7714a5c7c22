//! Domain-level command types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs defined in the
//! `shared` crate plus the resolved caller onto these types.

pub mod allowance {
    use shared::AllowanceDraft;

    use crate::domain::wallet_keys::WalletAccess;

    /// Input for creating a new allowance.
    #[derive(Debug, Clone)]
    pub struct CreateAllowanceCommand {
        pub caller: WalletAccess,
        pub draft: AllowanceDraft,
    }

    /// Input for reading a single allowance.
    #[derive(Debug, Clone)]
    pub struct GetAllowanceCommand {
        pub caller: WalletAccess,
        pub allowance_id: String,
    }

    /// Partial update. Absent draft fields keep their stored values.
    #[derive(Debug, Clone)]
    pub struct UpdateAllowanceCommand {
        pub caller: WalletAccess,
        pub allowance_id: String,
        pub patch: AllowanceDraft,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteAllowanceCommand {
        pub caller: WalletAccess,
        pub allowance_id: String,
    }

    /// Lists every allowance paid from any wallet of the caller's user.
    #[derive(Debug, Clone)]
    pub struct ListAllowancesCommand {
        pub caller: WalletAccess,
    }
}
