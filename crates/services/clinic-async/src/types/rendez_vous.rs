use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Editable, Entity, Patient, Validate, common::local_datetime, require};
use crate::error::ClinicError;

/// Appointment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatutRendezVous {
    /// Confirmed by the clinic
    Confirme,
    /// Requested, awaiting confirmation
    #[default]
    EnAttente,
    /// Cancelled
    Annule,
    /// Took place
    Termine,
}

impl StatutRendezVous {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirme => "CONFIRME",
            Self::EnAttente => "EN_ATTENTE",
            Self::Annule => "ANNULE",
            Self::Termine => "TERMINE",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirme => "Confirmé",
            Self::EnAttente => "En attente",
            Self::Annule => "Annulé",
            Self::Termine => "Terminé",
        }
    }
}

/// An appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendezVous {
    /// Backend id
    pub id: i64,
    /// Scheduled local date-time
    #[serde(with = "local_datetime")]
    pub date_heure: NaiveDateTime,
    /// Reason for the visit
    #[serde(default)]
    pub motif: Option<String>,
    /// Current status
    #[serde(default)]
    pub statut: StatutRendezVous,
    /// Patient, when the backend embeds it
    #[serde(default)]
    pub patient: Option<Patient>,
}

/// Create/update payload for [`RendezVous`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendezVousInput {
    /// Scheduled local date-time
    #[serde(default, with = "local_datetime::option")]
    pub date_heure: Option<NaiveDateTime>,
    /// Reason for the visit
    pub motif: String,
    /// Status to store
    pub statut: StatutRendezVous,
    /// Patient id
    pub patient_id: Option<i64>,
}

impl From<&RendezVous> for RendezVousInput {
    fn from(r: &RendezVous) -> Self {
        Self {
            date_heure: Some(r.date_heure),
            motif: r.motif.clone().unwrap_or_default(),
            statut: r.statut,
            patient_id: r.patient.as_ref().map(|p| p.id),
        }
    }
}

impl Validate for RendezVousInput {
    fn validate(&self) -> Result<(), ClinicError> {
        require(self.patient_id.as_ref(), "patientId")?;
        require(self.date_heure.as_ref(), "dateHeure")
    }
}

impl Entity for RendezVous {
    const PATH: &'static str = "rendez-vous";
    type Input = RendezVousInput;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Editable for RendezVous {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_shape() {
        let r: RendezVous = serde_json::from_value(serde_json::json!({
            "id": 7,
            "dateHeure": "2025-03-10T09:00",
            "motif": "Détartrage",
            "statut": "EN_ATTENTE",
            "patient": {"id": 1, "nom": "Alaoui", "prenom": "Sara"}
        }))
        .unwrap();
        assert_eq!(r.statut, StatutRendezVous::EnAttente);
        assert_eq!(r.patient.unwrap().id, 1);
        assert_eq!(r.date_heure.format("%H:%M").to_string(), "09:00");
    }

    #[test]
    fn input_requires_patient_and_date() {
        let input = RendezVousInput {
            motif: "Contrôle".into(),
            ..Default::default()
        };
        assert!(input.validate().unwrap_err().to_string().contains("patientId"));

        let input = RendezVousInput {
            patient_id: Some(3),
            ..input
        };
        assert!(input.validate().unwrap_err().to_string().contains("dateHeure"));
    }

    #[test]
    fn input_serializes_backend_field_names() {
        let input = RendezVousInput {
            date_heure: crate::types::common::parse_local_datetime("2025-03-10T14:00"),
            motif: "Contrôle".into(),
            statut: StatutRendezVous::Confirme,
            patient_id: Some(3),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["dateHeure"], "2025-03-10T14:00:00");
        assert_eq!(json["statut"], "CONFIRME");
        assert_eq!(json["patientId"], 3);
    }
}
