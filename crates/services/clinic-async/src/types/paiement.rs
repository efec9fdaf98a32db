use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Consultation, Editable, Entity, Validate, common::local_datetime, require};
use crate::error::ClinicError;

/// How a payment was made
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModePaiement {
    /// Card
    #[default]
    Carte,
    /// Cash
    Especes,
    /// Cheque
    Cheque,
    /// Bank transfer
    Virement,
}

impl ModePaiement {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Carte => "CARTE",
            Self::Especes => "ESPECES",
            Self::Cheque => "CHEQUE",
            Self::Virement => "VIREMENT",
        }
    }
}

/// A payment for a consultation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paiement {
    /// Backend id
    pub id: i64,
    /// Amount
    pub montant: f64,
    /// When it was paid
    #[serde(with = "local_datetime")]
    pub date_paiement: NaiveDateTime,
    /// Payment method
    pub mode_paiement: ModePaiement,
    /// Consultation paid for
    #[serde(default)]
    pub consultation: Option<Consultation>,
}

/// Create/update payload for [`Paiement`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaiementInput {
    /// Amount
    pub montant: Option<f64>,
    /// When it was paid
    #[serde(default, with = "local_datetime::option")]
    pub date_paiement: Option<NaiveDateTime>,
    /// Payment method
    pub mode_paiement: ModePaiement,
    /// Consultation id
    pub consultation_id: Option<i64>,
}

impl From<&Paiement> for PaiementInput {
    fn from(p: &Paiement) -> Self {
        Self {
            montant: Some(p.montant),
            date_paiement: Some(p.date_paiement),
            mode_paiement: p.mode_paiement,
            consultation_id: p.consultation.as_ref().map(|c| c.id),
        }
    }
}

impl Validate for PaiementInput {
    fn validate(&self) -> Result<(), ClinicError> {
        require(self.consultation_id.as_ref(), "consultationId")?;
        match self.montant {
            None => return Err(ClinicError::Validation("montant is required".into())),
            Some(m) if !m.is_finite() || m <= 0.0 => {
                return Err(ClinicError::Validation(format!(
                    "montant must be positive, got {m}"
                )));
            }
            Some(_) => {}
        }
        require(self.date_paiement.as_ref(), "datePaiement")
    }
}

impl Entity for Paiement {
    const PATH: &'static str = "paiements";
    type Input = PaiementInput;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Editable for Paiement {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        let mut input = PaiementInput {
            montant: Some(0.0),
            date_paiement: crate::types::common::parse_local_datetime("2025-03-10T11:00"),
            mode_paiement: ModePaiement::Especes,
            consultation_id: Some(4),
        };
        assert!(input.validate().is_err());

        input.montant = Some(350.0);
        assert!(input.validate().is_ok());

        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["modePaiement"], "ESPECES");
        assert_eq!(json["consultationId"], 4);
    }
}
