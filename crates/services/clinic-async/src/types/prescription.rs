use serde::{Deserialize, Serialize};

use super::{Consultation, Editable, Entity, Validate, require, require_text};
use crate::error::ClinicError;

/// A prescription written during a consultation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    /// Backend id
    pub id: i64,
    /// Drug name
    pub medicament: String,
    /// Dosage
    #[serde(default)]
    pub dosage: Option<String>,
    /// Instructions for the patient
    #[serde(default)]
    pub instructions: Option<String>,
    /// Consultation it belongs to
    #[serde(default)]
    pub consultation: Option<Consultation>,
}

/// Create/update payload for [`Prescription`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionInput {
    /// Drug name
    pub medicament: String,
    /// Dosage
    pub dosage: String,
    /// Instructions for the patient
    pub instructions: String,
    /// Consultation id
    pub consultation_id: Option<i64>,
}

impl From<&Prescription> for PrescriptionInput {
    fn from(p: &Prescription) -> Self {
        Self {
            medicament: p.medicament.clone(),
            dosage: p.dosage.clone().unwrap_or_default(),
            instructions: p.instructions.clone().unwrap_or_default(),
            consultation_id: p.consultation.as_ref().map(|c| c.id),
        }
    }
}

impl Validate for PrescriptionInput {
    fn validate(&self) -> Result<(), ClinicError> {
        require(self.consultation_id.as_ref(), "consultationId")?;
        require_text(&self.medicament, "medicament")
    }
}

impl Entity for Prescription {
    const PATH: &'static str = "prescriptions";
    type Input = PrescriptionInput;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Editable for Prescription {}
