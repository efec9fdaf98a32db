//! Clinic entities and request payloads
//!
//! Field names follow the backend's JSON (camelCase French names).

/// Shared wire helpers
pub mod common;
/// Consultation types
pub mod consultation;
/// Dashboard statistics
pub mod dashboard;
/// Payment types
pub mod paiement;
/// Patient types
pub mod patient;
/// Prescription types
pub mod prescription;
/// Appointment types
pub mod rendez_vous;
/// Appointment self-booking slots
pub mod reservation;
/// Client-side search
pub mod search;
/// Stock products and movements
pub mod stock;

pub use common::IdRef;
pub use consultation::{Consultation, ConsultationInput};
pub use dashboard::Statistiques;
pub use paiement::{ModePaiement, Paiement, PaiementInput};
pub use patient::{Patient, PatientInput};
pub use prescription::{Prescription, PrescriptionInput};
pub use rendez_vous::{RendezVous, RendezVousInput, StatutRendezVous};
pub use reservation::{AppointmentRequest, available_slots};
pub use search::{Searchable, filter};
pub use stock::{MouvementStock, MouvementStockInput, Produit, ProduitInput, StockLevel, TypeMouvement};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::ClinicError;

/// Client-side checks run before a payload is sent
pub trait Validate {
    /// Returns [`ClinicError::Validation`] naming the first missing or invalid field
    fn validate(&self) -> Result<(), ClinicError>;
}

/// A backend collection served under `/{PATH}`
pub trait Entity: DeserializeOwned + Send + Sync {
    /// Collection path relative to the API base
    const PATH: &'static str;
    /// Payload accepted by create (and update, when editable)
    type Input: Serialize + Validate + Send + Sync;

    /// Backend identifier
    fn id(&self) -> i64;
}

/// Marker for collections that accept PUT and DELETE
pub trait Editable: Entity {}

pub(crate) fn require<T>(value: Option<&T>, field: &str) -> Result<(), ClinicError> {
    if value.is_none() {
        return Err(ClinicError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<(), ClinicError> {
    if value.trim().is_empty() {
        return Err(ClinicError::Validation(format!("{field} is required")));
    }
    Ok(())
}
