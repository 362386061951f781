use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kegtrail_assets::AssetKind;
use kegtrail_core::{AssetId, CustomerId, MovementId, UserId};

use crate::MovementKind;

/// One immutable ledger entry: a single asset changing hands or fill state.
///
/// `asset_code`, `asset_kind` and `customer_name` are value copies captured at
/// write time, never live references: historical rows stay readable even if
/// the asset or customer record is later changed or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub asset_id: AssetId,
    pub asset_code: String,
    /// Denormalized so history pages can filter by asset kind without a join.
    pub asset_kind: AssetKind,
    pub kind: MovementKind,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub user_id: UserId,
    pub recorded_at: DateTime<Utc>,
    pub variety: Option<String>,
}

/// A proposed movement, before validation and snapshot capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMovement {
    pub asset_id: AssetId,
    pub kind: MovementKind,
    pub customer_id: CustomerId,
    pub variety: Option<String>,
}
