use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::commands::allowance::{
    CreateAllowanceCommand, DeleteAllowanceCommand, GetAllowanceCommand, ListAllowancesCommand,
    UpdateAllowanceCommand,
};
use crate::domain::errors::AllowanceError;
use crate::domain::models::Allowance;
use crate::domain::record_locks::RecordLocks;
use crate::domain::validation::{apply_patch, check_patch, validate_draft};
use crate::storage::{AllowanceRepository, AllowanceStorage, DbConnection};

/// Service for managing allowance records on behalf of wallet key holders
#[derive(Clone)]
pub struct AllowanceService {
    storage: Arc<dyn AllowanceStorage>,
    locks: RecordLocks,
}

impl AllowanceService {
    /// Create a new AllowanceService backed by SQLite
    pub fn new(db: Arc<DbConnection>, locks: RecordLocks) -> Self {
        let allowance_repository = AllowanceRepository::new((*db).clone());
        Self::with_storage(Arc::new(allowance_repository), locks)
    }

    pub fn with_storage(storage: Arc<dyn AllowanceStorage>, locks: RecordLocks) -> Self {
        Self { storage, locks }
    }

    /// Validate and persist a new allowance
    pub async fn create_allowance(
        &self,
        command: CreateAllowanceCommand,
    ) -> Result<Allowance, AllowanceError> {
        command.caller.require_admin()?;
        let allowance = validate_draft(&command.draft, &command.caller, Utc::now())?;

        let stored = self
            .storage
            .store_allowance(&allowance)
            .await
            .map_err(AllowanceError::store)?;

        info!(
            "Created allowance {} ({} {} {}) for wallet {}",
            stored.display_id(),
            stored.amount,
            stored.currency,
            stored.frequency_type,
            stored.wallet
        );
        Ok(stored)
    }

    /// Get one allowance, readable by any wallet of the owning user
    pub async fn get_allowance(
        &self,
        command: GetAllowanceCommand,
    ) -> Result<Allowance, AllowanceError> {
        let allowance = self.load(&command.allowance_id).await?;

        if !command.caller.can_read(&allowance.wallet) {
            warn!(
                "Wallet {} tried to read allowance {} of wallet {}",
                command.caller.wallet_id, command.allowance_id, allowance.wallet
            );
            return Err(AllowanceError::UnauthorizedWallet);
        }
        Ok(allowance)
    }

    /// Apply a partial update
    pub async fn update_allowance(
        &self,
        command: UpdateAllowanceCommand,
    ) -> Result<Allowance, AllowanceError> {
        command.caller.require_admin()?;
        check_patch(&command.patch)?;

        let _guard = self.locks.lock(&command.allowance_id).await;
        let existing = self.load(&command.allowance_id).await?;
        if !command.caller.can_manage(&existing.wallet) {
            warn!(
                "Wallet {} tried to update allowance {} of wallet {}",
                command.caller.wallet_id, command.allowance_id, existing.wallet
            );
            return Err(AllowanceError::UnauthorizedWallet);
        }

        let updated = apply_patch(&existing, &command.patch, &command.caller, Utc::now())?;
        let found = self
            .storage
            .update_allowance(&updated)
            .await
            .map_err(AllowanceError::store)?;
        if !found {
            return Err(AllowanceError::NotFound);
        }

        info!("Updated allowance {}", command.allowance_id);
        Ok(updated)
    }

    /// Hard delete
    pub async fn delete_allowance(&self, command: DeleteAllowanceCommand) -> Result<(), AllowanceError> {
        command.caller.require_admin()?;

        let _guard = self.locks.lock(&command.allowance_id).await;
        let existing = self.load(&command.allowance_id).await?;
        if !command.caller.can_manage(&existing.wallet) {
            warn!(
                "Wallet {} tried to delete allowance {} of wallet {}",
                command.caller.wallet_id, command.allowance_id, existing.wallet
            );
            return Err(AllowanceError::UnauthorizedWallet);
        }

        let removed = self
            .storage
            .delete_allowance(&command.allowance_id)
            .await
            .map_err(AllowanceError::store)?;
        if !removed {
            return Err(AllowanceError::NotFound);
        }
        info!("Deleted allowance {}", command.allowance_id);
        Ok(())
    }

    /// All allowances of the caller's user, in creation order
    pub async fn list_allowances(
        &self,
        command: ListAllowancesCommand,
    ) -> Result<Vec<Allowance>, AllowanceError> {
        let allowances = self
            .storage
            .list_allowances(&command.caller.user_wallet_ids)
            .await
            .map_err(AllowanceError::store)?;

        info!(
            "Listed {} allowances for user {}",
            allowances.len(),
            command.caller.user_id
        );
        Ok(allowances)
    }

    async fn load(&self, allowance_id: &str) -> Result<Allowance, AllowanceError> {
        self.storage
            .get_allowance(allowance_id)
            .await
            .map_err(AllowanceError::store)?
            .ok_or(AllowanceError::NotFound)
    }
}
