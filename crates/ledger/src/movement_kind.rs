//! The movement vocabulary and its state-transition table.
//!
//! The source system carried two partially overlapping vocabularies; this is
//! the reconciled canonical one. Legacy wire names are still accepted on
//! input ([`MovementKind::parse`]) but normalized before anything is
//! persisted, and never emitted.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use kegtrail_assets::{FillState, Location};
use kegtrail_core::DomainError;

/// Canonical movement vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    #[serde(rename = "LLENADO_EN_PLANTA")]
    LlenadoEnPlanta,
    #[serde(rename = "SALIDA_A_REPARTO")]
    SalidaAReparto,
    #[serde(rename = "ENTREGA_A_CLIENTE")]
    EntregaACliente,
    #[serde(rename = "SALIDA_VACIO")]
    SalidaVacio,
    #[serde(rename = "RECOLECCION_DE_CLIENTE")]
    RecoleccionDeCliente,
    #[serde(rename = "RECEPCION_EN_PLANTA")]
    RecepcionEnPlanta,
    #[serde(rename = "DEVOLUCION")]
    Devolucion,
}

/// Effect of one movement kind on an asset's status.
///
/// Every kind lands the asset at a definite location; the fill effect is
/// optional (`None` = unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEffect {
    pub fill: Option<FillState>,
    pub location: Location,
}

impl MovementKind {
    /// Every canonical kind, in wire order.
    pub const ALL: [MovementKind; 7] = [
        Self::LlenadoEnPlanta,
        Self::SalidaAReparto,
        Self::EntregaACliente,
        Self::SalidaVacio,
        Self::RecoleccionDeCliente,
        Self::RecepcionEnPlanta,
        Self::Devolucion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlenadoEnPlanta => "LLENADO_EN_PLANTA",
            Self::SalidaAReparto => "SALIDA_A_REPARTO",
            Self::EntregaACliente => "ENTREGA_A_CLIENTE",
            Self::SalidaVacio => "SALIDA_VACIO",
            Self::RecoleccionDeCliente => "RECOLECCION_DE_CLIENTE",
            Self::RecepcionEnPlanta => "RECEPCION_EN_PLANTA",
            Self::Devolucion => "DEVOLUCION",
        }
    }

    /// Parse a wire name, accepting the legacy vocabulary.
    ///
    /// Legacy mapping: `SALIDA_LLENO` → `SalidaAReparto`, `ENTRADA_LLENO` →
    /// `LlenadoEnPlanta`, `DEVOLUCION_VACIO` → `RecoleccionDeCliente`.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "LLENADO_EN_PLANTA" => Ok(Self::LlenadoEnPlanta),
            "SALIDA_A_REPARTO" => Ok(Self::SalidaAReparto),
            "ENTREGA_A_CLIENTE" => Ok(Self::EntregaACliente),
            "SALIDA_VACIO" => Ok(Self::SalidaVacio),
            "RECOLECCION_DE_CLIENTE" => Ok(Self::RecoleccionDeCliente),
            "RECEPCION_EN_PLANTA" => Ok(Self::RecepcionEnPlanta),
            "DEVOLUCION" => Ok(Self::Devolucion),
            // Legacy vocabulary, normalized on input.
            "SALIDA_LLENO" => Ok(Self::SalidaAReparto),
            "ENTRADA_LLENO" => Ok(Self::LlenadoEnPlanta),
            "DEVOLUCION_VACIO" => Ok(Self::RecoleccionDeCliente),
            other => Err(DomainError::validation(format!(
                "unknown movement kind '{other}'"
            ))),
        }
    }

    /// The transition table: what this movement does to an asset's status.
    pub fn effect(&self) -> TransitionEffect {
        match self {
            Self::LlenadoEnPlanta => TransitionEffect {
                fill: Some(FillState::Lleno),
                location: Location::EnPlanta,
            },
            Self::SalidaAReparto => TransitionEffect {
                fill: None,
                location: Location::EnCliente,
            },
            Self::EntregaACliente => TransitionEffect {
                fill: None,
                location: Location::EnCliente,
            },
            Self::SalidaVacio => TransitionEffect {
                fill: Some(FillState::Vacio),
                location: Location::EnCliente,
            },
            Self::RecoleccionDeCliente => TransitionEffect {
                fill: Some(FillState::Vacio),
                location: Location::EnPlanta,
            },
            Self::RecepcionEnPlanta => TransitionEffect {
                fill: None,
                location: Location::EnPlanta,
            },
            Self::Devolucion => TransitionEffect {
                fill: Some(FillState::Lleno),
                location: Location::EnPlanta,
            },
        }
    }

    /// Kinds that land the asset at a customer (used by the holdings
    /// projector to attribute possession).
    pub fn is_delivery(&self) -> bool {
        self.effect().location == Location::EnCliente
    }

    /// Kinds that may carry a beverage variety: those whose fill effect is
    /// `Lleno`. The recorder additionally requires the asset to be a Barril.
    pub fn implies_fill(&self) -> bool {
        self.effect().fill == Some(FillState::Lleno)
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_definite_location() {
        // Exhaustive over ALL; the match in effect() is already total, this
        // pins the landing locations.
        for kind in MovementKind::ALL {
            let effect = kind.effect();
            match kind {
                MovementKind::SalidaAReparto
                | MovementKind::EntregaACliente
                | MovementKind::SalidaVacio => {
                    assert_eq!(effect.location, Location::EnCliente, "{kind}")
                }
                _ => assert_eq!(effect.location, Location::EnPlanta, "{kind}"),
            }
        }
    }

    #[test]
    fn fill_implying_kinds() {
        assert!(MovementKind::LlenadoEnPlanta.implies_fill());
        assert!(MovementKind::Devolucion.implies_fill());
        assert!(!MovementKind::SalidaVacio.implies_fill());
        assert!(!MovementKind::EntregaACliente.implies_fill());
    }

    #[test]
    fn canonical_names_round_trip() {
        for kind in MovementKind::ALL {
            assert_eq!(MovementKind::parse(kind.as_str()).unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn legacy_names_normalize_and_are_never_emitted() {
        let cases = [
            ("SALIDA_LLENO", MovementKind::SalidaAReparto),
            ("ENTRADA_LLENO", MovementKind::LlenadoEnPlanta),
            ("DEVOLUCION_VACIO", MovementKind::RecoleccionDeCliente),
            ("SALIDA_VACIO", MovementKind::SalidaVacio),
        ];
        for (legacy, canonical) in cases {
            let parsed = MovementKind::parse(legacy).unwrap();
            assert_eq!(parsed, canonical);
            // Emission always uses the canonical name.
            assert_ne!(parsed.as_str(), "ENTRADA_LLENO");
            assert_ne!(parsed.as_str(), "SALIDA_LLENO");
            assert_ne!(parsed.as_str(), "DEVOLUCION_VACIO");
        }
    }

    #[test]
    fn unknown_kind_is_a_validation_error() {
        assert!(MovementKind::parse("TELETRANSPORTE").is_err());
    }
}
