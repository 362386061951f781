use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kegtrail_core::{AssetId, CustomerId, DomainError, DomainResult};

/// Physical kind of a tracked asset. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "BARRIL")]
    Barril,
    #[serde(rename = "CO2")]
    Co2,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Barril => "BARRIL",
            Self::Co2 => "CO2",
        }
    }

    /// Prefix used for auto-generated asset codes (`KEG-001`, `CO2-014`).
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Self::Barril => "KEG",
            Self::Co2 => "CO2",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "BARRIL" => Ok(Self::Barril),
            "CO2" => Ok(Self::Co2),
            other => Err(DomainError::validation(format!(
                "unknown asset kind '{other}' (expected BARRIL or CO2)"
            ))),
        }
    }
}

impl core::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fill state of an asset, independent of where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillState {
    #[serde(rename = "LLENO")]
    Lleno,
    #[serde(rename = "VACIO")]
    Vacio,
}

impl FillState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lleno => "LLENO",
            Self::Vacio => "VACIO",
        }
    }
}

/// Physical location of an asset, independent of its fill state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "EN_PLANTA")]
    EnPlanta,
    #[serde(rename = "EN_CLIENTE")]
    EnCliente,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnPlanta => "EN_PLANTA",
            Self::EnCliente => "EN_CLIENTE",
        }
    }
}

/// Current coarse state of an asset: two independent dimensions.
///
/// The source system conflated fill state and location into one enum in some
/// places and split them in others; here they are always two fields, written
/// together by the movement recorder inside one store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStatus {
    pub fill: FillState,
    pub location: Location,
}

impl AssetStatus {
    /// Status of a freshly registered asset: empty, at the plant.
    pub fn initial() -> Self {
        Self {
            fill: FillState::Vacio,
            location: Location::EnPlanta,
        }
    }
}

/// A tracked physical unit (keg or CO2 cylinder).
///
/// `code` and `kind` are immutable after creation; `status`, the holder
/// snapshot and `last_movement_at` are written only by the movement recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub code: String,
    pub kind: AssetKind,
    pub format: String,
    pub status: AssetStatus,
    /// Denormalized current holder; set when `status.location == EnCliente`,
    /// cleared on return. The ledger remains the source of truth.
    pub holder_id: Option<CustomerId>,
    pub holder_name: Option<String>,
    pub last_movement_at: DateTime<Utc>,
    /// Last-known beverage variety (Barril only).
    pub variety: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Format label used by per-customer holdings breakdowns.
    ///
    /// CO2 formats are labeled distinctly so a "6kg" cylinder never merges
    /// with a hypothetical "6kg" keg format.
    pub fn format_label(&self) -> String {
        match self.kind {
            AssetKind::Barril => self.format.clone(),
            AssetKind::Co2 => format!("CO2 {}", self.format),
        }
    }
}

/// Bounds for batch asset creation.
pub const BATCH_QUANTITY_MIN: u32 = 1;
pub const BATCH_QUANTITY_MAX: u32 = 100;

/// Validate the free-text format descriptor (e.g. "50L", "6kg").
pub fn validate_format(format: &str) -> DomainResult<()> {
    if format.trim().is_empty() {
        return Err(DomainError::validation("format must not be empty"));
    }
    Ok(())
}

/// Validate a batch creation quantity (1-100 units per batch).
pub fn validate_batch_quantity(quantity: u32) -> DomainResult<()> {
    if !(BATCH_QUANTITY_MIN..=BATCH_QUANTITY_MAX).contains(&quantity) {
        return Err(DomainError::validation(format!(
            "quantity must be between {BATCH_QUANTITY_MIN} and {BATCH_QUANTITY_MAX}, got {quantity}"
        )));
    }
    Ok(())
}

/// Render the `n`-th code for a kind: `KEG-001`, `CO2-014`.
pub fn format_code(kind: AssetKind, n: u32) -> String {
    format!("{}-{:03}", kind.code_prefix(), n)
}

/// Next free code for a kind, given every existing code in the collection.
///
/// Scans for the highest numeric suffix among codes carrying this kind's
/// prefix; codes with foreign prefixes or non-numeric suffixes are ignored.
/// Callers must run this inside the creation transaction so concurrent batch
/// creations cannot hand out the same code twice.
pub fn next_code<'a>(kind: AssetKind, existing: impl Iterator<Item = &'a str>) -> String {
    let prefix = kind.code_prefix();
    let max = existing
        .filter_map(|code| code.strip_prefix(prefix)?.strip_prefix('-'))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format_code(kind, max + 1)
}
