use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use super::{RendezVousInput, StatutRendezVous};

/// Days ahead offered for self-booking by default
pub const DEFAULT_BOOKING_DAYS: u32 = 14;

/// Bookable hours: mornings 9-11, afternoons 14-17 (no noon slot)
pub const SLOT_HOURS: [u32; 7] = [9, 10, 11, 14, 15, 16, 17];

/// Bookable slots over the `days` days following `today`, weekends excluded
#[must_use]
pub fn available_slots(today: NaiveDate, days: u32) -> Vec<NaiveDateTime> {
    (1..=u64::from(days))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .flat_map(|date| {
            SLOT_HOURS
                .iter()
                .filter_map(move |&hour| NaiveTime::from_hms_opt(hour, 0, 0).map(|t| date.and_time(t)))
        })
        .collect()
}

/// A patient's booking request; it always lands as `EN_ATTENTE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    /// Patient booking the slot
    pub patient_id: i64,
    /// Chosen slot
    pub date_heure: NaiveDateTime,
    /// Reason for the visit
    pub motif: String,
}

impl From<AppointmentRequest> for RendezVousInput {
    fn from(req: AppointmentRequest) -> Self {
        Self {
            date_heure: Some(req.date_heure),
            motif: req.motif,
            statut: StatutRendezVous::EnAttente,
            patient_id: Some(req.patient_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_weekends_and_today() {
        // Friday
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let slots = available_slots(today, 3);

        // Sat and Sun skipped, Monday only
        assert_eq!(slots.len(), SLOT_HOURS.len());
        assert!(slots.iter().all(|s| s.date() == NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()));
        assert_eq!(slots[0].format("%H:%M").to_string(), "09:00");
        assert_eq!(slots[3].format("%H:%M").to_string(), "14:00");
    }

    #[test]
    fn two_weeks_yields_ten_working_days() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let slots = available_slots(today, DEFAULT_BOOKING_DAYS);
        assert_eq!(slots.len(), 10 * SLOT_HOURS.len());
        assert!(slots.iter().all(|s| s.date() > today));
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn request_becomes_pending_appointment() {
        let slot = available_slots(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(), 3)[0];
        let input: RendezVousInput = AppointmentRequest {
            patient_id: 9,
            date_heure: slot,
            motif: "Douleur".into(),
        }
        .into();
        assert_eq!(input.statut, StatutRendezVous::EnAttente);
        assert_eq!(input.patient_id, Some(9));
    }
}
