use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Editable, Entity, Patient, RendezVous, Validate, common::local_datetime, require};
use crate::error::ClinicError;

/// A consultation, optionally tied to the appointment it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    /// Backend id
    pub id: i64,
    /// When it took place
    #[serde(with = "local_datetime")]
    pub date_heure: NaiveDateTime,
    /// Diagnosis
    #[serde(default)]
    pub diagnostic: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Patient
    #[serde(default)]
    pub patient: Option<Patient>,
    /// Originating appointment
    #[serde(default)]
    pub rendez_vous: Option<RendezVous>,
}

impl Consultation {
    /// Patient display name, or an empty string
    #[must_use]
    pub fn patient_name(&self) -> String {
        self.patient.as_ref().map(Patient::full_name).unwrap_or_default()
    }
}

/// Create/update payload for [`Consultation`]
///
/// `rendezVousId` is always sent, as `null` when unlinked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationInput {
    /// When it took place
    #[serde(default, with = "local_datetime::option")]
    pub date_heure: Option<NaiveDateTime>,
    /// Diagnosis
    pub diagnostic: String,
    /// Free-form notes
    pub notes: String,
    /// Patient id
    pub patient_id: Option<i64>,
    /// Originating appointment id
    pub rendez_vous_id: Option<i64>,
}

impl From<&Consultation> for ConsultationInput {
    fn from(c: &Consultation) -> Self {
        Self {
            date_heure: Some(c.date_heure),
            diagnostic: c.diagnostic.clone().unwrap_or_default(),
            notes: c.notes.clone().unwrap_or_default(),
            patient_id: c.patient.as_ref().map(|p| p.id),
            rendez_vous_id: c.rendez_vous.as_ref().map(|r| r.id),
        }
    }
}

impl Validate for ConsultationInput {
    fn validate(&self) -> Result<(), ClinicError> {
        require(self.patient_id.as_ref(), "patientId")?;
        require(self.date_heure.as_ref(), "dateHeure")
    }
}

impl Entity for Consultation {
    const PATH: &'static str = "consultations";
    type Input = ConsultationInput;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Editable for Consultation {}
