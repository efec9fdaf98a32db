use serde::{Deserialize, Serialize};

/// Headline counters shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistiques {
    /// Registered patients
    pub total_patients: u64,
    /// Appointments scheduled today
    pub rendez_vous_aujourdhui: u64,
    /// Consultations held today
    pub consultations_aujourdhui: u64,
    /// All consultations
    pub total_consultations: u64,
    /// All prescriptions
    pub total_prescriptions: u64,
    /// All payments
    pub total_paiements: u64,
}
