//! The movement recorder: the ledger's only write path.
//!
//! One store transaction appends the movement and rewrites the asset's
//! denormalized state; readers never see one without the other.

use chrono::Utc;
use thiserror::Error;

use kegtrail_assets::{Asset, AssetKind, Location};
use kegtrail_core::{MovementId, UserId};
use kegtrail_customers::Customer;
use kegtrail_ledger::{Movement, NewMovement};
use kegtrail_store::{DocumentStore, StoreError, to_document_data};

use crate::collections;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("asset not found")]
    AssetNotFound,

    #[error("customer not found")]
    CustomerNotFound,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Write path for the movement ledger.
pub struct MovementRecorder<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> MovementRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record one movement.
    ///
    /// Inside one transaction: re-read asset and customer (catching
    /// concurrent deletion), capture the denormalized snapshots, apply the
    /// transition table to the asset and commit the movement insert together
    /// with the asset update. Optimistic conflicts are retried by the store
    /// itself; exhausted retries surface as `StoreError::Conflict`.
    pub fn record(&self, new: &NewMovement, actor: UserId) -> Result<Movement, RecordError> {
        // The variety rule needs only the asset's immutable kind, so the
        // pre-read cannot go stale in a way the transaction must catch.
        let asset: Asset = self
            .store
            .get(collections::ASSETS, &new.asset_id.to_string())
            .map_err(|e| match e {
                StoreError::NotFound { .. } => RecordError::AssetNotFound,
                other => RecordError::Store(other),
            })?
            .to_typed()?;
        validate_variety(asset.kind, new)?;

        let mut recorded: Option<Movement> = None;
        let result = self.store.run_transaction(&mut |txn| {
            let asset: Asset = txn
                .get(collections::ASSETS, &new.asset_id.to_string())?
                .to_typed()?;
            let customer: Customer = txn
                .get(collections::CUSTOMERS, &new.customer_id.to_string())?
                .to_typed()?;

            let recorded_at = Utc::now();
            let movement = Movement {
                id: MovementId::new(),
                asset_id: asset.id,
                asset_code: asset.code.clone(),
                asset_kind: asset.kind,
                kind: new.kind,
                customer_id: customer.id,
                customer_name: customer.name.clone(),
                user_id: actor,
                recorded_at,
                variety: new.variety.clone(),
            };

            let mut updated = asset;
            let effect = new.kind.effect();
            if let Some(fill) = effect.fill {
                updated.status.fill = fill;
            }
            updated.status.location = effect.location;
            match effect.location {
                Location::EnCliente => {
                    updated.holder_id = Some(customer.id);
                    updated.holder_name = Some(customer.name.clone());
                }
                Location::EnPlanta => {
                    updated.holder_id = None;
                    updated.holder_name = None;
                }
            }
            updated.last_movement_at = recorded_at;
            if new.kind.implies_fill() && movement.variety.is_some() {
                updated.variety = movement.variety.clone();
            }

            txn.insert(collections::MOVEMENTS, to_document_data(&movement)?)?;
            txn.update(
                collections::ASSETS,
                &movement.asset_id.to_string(),
                to_document_data(&updated)?,
            );
            recorded = Some(movement);
            Ok(())
        });

        match result {
            Ok(()) => recorded.ok_or_else(|| {
                RecordError::Store(StoreError::Unavailable(
                    "transaction committed without a movement".to_string(),
                ))
            }),
            Err(StoreError::NotFound { collection, .. }) if collection == collections::ASSETS => {
                Err(RecordError::AssetNotFound)
            }
            Err(StoreError::NotFound { collection, .. })
                if collection == collections::CUSTOMERS =>
            {
                Err(RecordError::CustomerNotFound)
            }
            Err(e) => Err(RecordError::Store(e)),
        }
    }

    /// Admin correction: remove a ledger entry.
    ///
    /// Deliberately leaves the asset's denormalized state untouched; deleting
    /// a movement is a bookkeeping fix, not a state transition.
    pub fn delete(&self, id: MovementId) -> Result<(), RecordError> {
        self.store
            .delete(collections::MOVEMENTS, &id.to_string())
            .map_err(RecordError::Store)
    }
}

/// A movement may carry a variety only for a Barril and only when the
/// movement's fill effect is `Lleno`.
fn validate_variety(kind: AssetKind, new: &NewMovement) -> Result<(), RecordError> {
    if new.variety.is_none() {
        return Ok(());
    }
    if kind != AssetKind::Barril {
        return Err(RecordError::InvalidTransition(format!(
            "variety is only valid for BARRIL assets, asset is {kind}"
        )));
    }
    if !new.kind.implies_fill() {
        return Err(RecordError::InvalidTransition(format!(
            "movement {} does not fill the asset, variety not allowed",
            new.kind
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kegtrail_ledger::MovementKind;

    #[test]
    fn variety_rules() {
        let base = NewMovement {
            asset_id: kegtrail_core::AssetId::new(),
            kind: MovementKind::LlenadoEnPlanta,
            customer_id: kegtrail_core::CustomerId::new(),
            variety: Some("IPA".to_string()),
        };

        assert!(validate_variety(AssetKind::Barril, &base).is_ok());
        assert!(matches!(
            validate_variety(AssetKind::Co2, &base),
            Err(RecordError::InvalidTransition(_))
        ));

        let non_fill = NewMovement {
            kind: MovementKind::EntregaACliente,
            ..base.clone()
        };
        assert!(matches!(
            validate_variety(AssetKind::Barril, &non_fill),
            Err(RecordError::InvalidTransition(_))
        ));

        let no_variety = NewMovement {
            variety: None,
            ..base
        };
        assert!(validate_variety(AssetKind::Co2, &no_variety).is_ok());
    }
}
