//! Asset registry and customer directory: the CRUD write paths.
//!
//! Code generation runs inside the creation transaction so concurrent batch
//! creations cannot hand out the same code twice; everything else is plain
//! validated CRUD against the store.

use chrono::Utc;
use thiserror::Error;

use kegtrail_assets::{
    Asset, AssetKind, AssetStatus, validate_batch_quantity, validate_format,
};
use kegtrail_core::{AssetId, CustomerId, DomainError};
use kegtrail_customers::{Customer, CustomerType, validate_customer};
use kegtrail_store::{DocumentStore, Query, StoreError, to_document_data};

use crate::collections;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Request to register one or more identical assets.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssetBatch {
    pub kind: AssetKind,
    pub format: String,
    pub quantity: u32,
}

/// Mutable asset fields; `code` and `kind` are immutable after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetUpdate {
    pub format: Option<String>,
    pub variety: Option<String>,
}

/// Write path for the asset registry.
pub struct AssetRegistry<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> AssetRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a batch of identical assets, assigning sequential codes.
    ///
    /// The whole batch is one validation unit and one transaction: any
    /// failure registers nothing.
    pub fn create_batch(&self, batch: &NewAssetBatch) -> Result<Vec<Asset>, RegistryError> {
        validate_format(&batch.format)?;
        validate_batch_quantity(batch.quantity)?;

        let mut created: Vec<Asset> = Vec::new();
        self.store.run_transaction(&mut |txn| {
            created.clear();
            let existing = txn.query(&Query::collection(collections::ASSETS))?;
            let mut codes: Vec<String> = existing
                .iter()
                .filter_map(|d| d.data.get("code").and_then(|c| c.as_str()))
                .map(str::to_string)
                .collect();

            let now = Utc::now();
            for _ in 0..batch.quantity {
                let code = kegtrail_assets::next_code(batch.kind, codes.iter().map(String::as_str));
                let asset = Asset {
                    id: AssetId::new(),
                    code: code.clone(),
                    kind: batch.kind,
                    format: batch.format.clone(),
                    status: AssetStatus::initial(),
                    holder_id: None,
                    holder_name: None,
                    last_movement_at: now,
                    variety: None,
                    created_at: now,
                };
                txn.insert(collections::ASSETS, to_document_data(&asset)?)?;
                codes.push(code);
                created.push(asset);
            }
            Ok(())
        })?;
        Ok(created)
    }

    /// Register a single asset.
    pub fn create(&self, kind: AssetKind, format: &str) -> Result<Asset, RegistryError> {
        let batch = NewAssetBatch {
            kind,
            format: format.to_string(),
            quantity: 1,
        };
        let mut created = self.create_batch(&batch)?;
        created.pop().ok_or_else(|| {
            RegistryError::Store(StoreError::Unavailable(
                "batch of one produced no asset".to_string(),
            ))
        })
    }

    pub fn get(&self, id: AssetId) -> Result<Asset, RegistryError> {
        Ok(self
            .store
            .get(collections::ASSETS, &id.to_string())?
            .to_typed()?)
    }

    /// Update the mutable fields. Code, kind and status are untouchable from
    /// here; status belongs to the movement recorder.
    pub fn update(&self, id: AssetId, changes: &AssetUpdate) -> Result<Asset, RegistryError> {
        if let Some(format) = &changes.format {
            validate_format(format)?;
        }
        if changes.variety.is_some() {
            // Kind is immutable, so this pre-read cannot go stale.
            let asset = self.get(id)?;
            if asset.kind != AssetKind::Barril {
                return Err(RegistryError::Domain(DomainError::validation(format!(
                    "variety is only valid for BARRIL assets, asset is {}",
                    asset.kind
                ))));
            }
        }
        let mut updated: Option<Asset> = None;
        self.store.run_transaction(&mut |txn| {
            let mut asset: Asset = txn.get(collections::ASSETS, &id.to_string())?.to_typed()?;
            if let Some(format) = &changes.format {
                asset.format = format.clone();
            }
            if let Some(variety) = &changes.variety {
                asset.variety = Some(variety.clone());
            }
            txn.update(collections::ASSETS, &id.to_string(), to_document_data(&asset)?);
            updated = Some(asset);
            Ok(())
        })?;
        updated.ok_or_else(|| {
            RegistryError::Store(StoreError::Unavailable(
                "update committed without an asset".to_string(),
            ))
        })
    }

    pub fn delete(&self, id: AssetId) -> Result<(), RegistryError> {
        Ok(self.store.delete(collections::ASSETS, &id.to_string())?)
    }
}

/// Request to register a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub phone: String,
    pub kind: CustomerType,
}

/// Write path for the customer directory.
pub struct CustomerDirectory<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CustomerDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create(&self, new: &NewCustomer) -> Result<Customer, RegistryError> {
        validate_customer(&new.name, &new.phone)?;
        let customer = Customer {
            id: CustomerId::new(),
            name: new.name.clone(),
            address: new.address.clone(),
            contact: new.contact.clone(),
            phone: new.phone.clone(),
            kind: new.kind,
            created_at: Utc::now(),
        };
        self.store
            .insert(collections::CUSTOMERS, to_document_data(&customer)?)?;
        Ok(customer)
    }

    pub fn get(&self, id: CustomerId) -> Result<Customer, RegistryError> {
        Ok(self
            .store
            .get(collections::CUSTOMERS, &id.to_string())?
            .to_typed()?)
    }

    pub fn update(&self, id: CustomerId, new: &NewCustomer) -> Result<Customer, RegistryError> {
        validate_customer(&new.name, &new.phone)?;
        let mut updated: Option<Customer> = None;
        self.store.run_transaction(&mut |txn| {
            let mut customer: Customer =
                txn.get(collections::CUSTOMERS, &id.to_string())?.to_typed()?;
            customer.name = new.name.clone();
            customer.address = new.address.clone();
            customer.contact = new.contact.clone();
            customer.phone = new.phone.clone();
            customer.kind = new.kind;
            txn.update(
                collections::CUSTOMERS,
                &id.to_string(),
                to_document_data(&customer)?,
            );
            updated = Some(customer);
            Ok(())
        })?;
        updated.ok_or_else(|| {
            RegistryError::Store(StoreError::Unavailable(
                "update committed without a customer".to_string(),
            ))
        })
    }

    /// Delete a customer.
    ///
    /// No cascade: movements keep their `customer_name` snapshots and assets
    /// currently held keep theirs.
    pub fn delete(&self, id: CustomerId) -> Result<(), RegistryError> {
        Ok(self.store.delete(collections::CUSTOMERS, &id.to_string())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kegtrail_store::{MemoryStore, default_indexes};
    use std::sync::Arc;

    fn registry() -> AssetRegistry<Arc<MemoryStore>> {
        AssetRegistry::new(Arc::new(MemoryStore::with_indexes(default_indexes())))
    }

    #[test]
    fn batch_creation_assigns_sequential_codes() {
        let registry = registry();
        let batch = NewAssetBatch {
            kind: AssetKind::Barril,
            format: "50L".to_string(),
            quantity: 3,
        };
        let assets = registry.create_batch(&batch).unwrap();
        let codes: Vec<&str> = assets.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["KEG-001", "KEG-002", "KEG-003"]);

        // A second batch continues the sequence; CO2 has its own.
        let more = registry
            .create_batch(&NewAssetBatch {
                kind: AssetKind::Barril,
                format: "30L".to_string(),
                quantity: 1,
            })
            .unwrap();
        assert_eq!(more[0].code, "KEG-004");

        let co2 = registry.create(AssetKind::Co2, "6kg").unwrap();
        assert_eq!(co2.code, "CO2-001");
    }

    #[test]
    fn invalid_batches_register_nothing() {
        let registry = registry();
        assert!(
            registry
                .create_batch(&NewAssetBatch {
                    kind: AssetKind::Barril,
                    format: " ".to_string(),
                    quantity: 3,
                })
                .is_err()
        );
        assert!(
            registry
                .create_batch(&NewAssetBatch {
                    kind: AssetKind::Barril,
                    format: "50L".to_string(),
                    quantity: 101,
                })
                .is_err()
        );
    }

    #[test]
    fn update_touches_only_mutable_fields() {
        let registry = registry();
        let asset = registry.create(AssetKind::Barril, "50L").unwrap();
        let updated = registry
            .update(
                asset.id,
                &AssetUpdate {
                    format: Some("30L".to_string()),
                    variety: Some("IPA".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.format, "30L");
        assert_eq!(updated.variety.as_deref(), Some("IPA"));
        assert_eq!(updated.code, asset.code);
        assert_eq!(updated.kind, asset.kind);
        assert_eq!(updated.status, asset.status);
    }

    #[test]
    fn variety_updates_are_rejected_for_co2_assets() {
        let registry = registry();
        let co2 = registry.create(AssetKind::Co2, "6kg").unwrap();
        let result = registry.update(
            co2.id,
            &AssetUpdate {
                format: None,
                variety: Some("IPA".to_string()),
            },
        );
        assert!(matches!(
            result,
            Err(RegistryError::Domain(DomainError::Validation(_)))
        ));
        assert_eq!(registry.get(co2.id).unwrap().variety, None);

        // Kegs still accept a variety.
        let keg = registry.create(AssetKind::Barril, "50L").unwrap();
        let updated = registry
            .update(
                keg.id,
                &AssetUpdate {
                    format: None,
                    variety: Some("IPA".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.variety.as_deref(), Some("IPA"));
    }

    #[test]
    fn customer_phone_validation_gates_create_and_update() {
        let store = Arc::new(MemoryStore::with_indexes(default_indexes()));
        let directory = CustomerDirectory::new(store);
        let bad = NewCustomer {
            name: "Bar Centro".to_string(),
            address: "Calle 1".to_string(),
            contact: "Ana".to_string(),
            phone: "12345".to_string(),
            kind: CustomerType::Bar,
        };
        assert!(matches!(
            directory.create(&bad),
            Err(RegistryError::Domain(DomainError::Validation(_)))
        ));

        let good = NewCustomer {
            phone: "123456789".to_string(),
            ..bad.clone()
        };
        let customer = directory.create(&good).unwrap();
        assert!(directory.update(customer.id, &bad).is_err());
    }
}
