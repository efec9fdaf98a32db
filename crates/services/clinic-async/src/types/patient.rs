use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Editable, Entity, Validate, require, require_text};
use crate::error::ClinicError;

/// A clinic patient
///
/// `cin` (national id) and `assurance` (insurer) are not returned by every
/// backend build; both default to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Backend id
    pub id: i64,
    /// Family name
    pub nom: String,
    /// Given name
    pub prenom: String,
    /// Date of birth
    #[serde(default)]
    pub date_naissance: Option<NaiveDate>,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// National identity card number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cin: Option<String>,
    /// Insurance provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assurance: Option<String>,
}

impl Patient {
    /// "Prenom Nom"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

/// Create/update payload for [`Patient`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    /// Family name
    pub nom: String,
    /// Given name
    pub prenom: String,
    /// Date of birth
    pub date_naissance: Option<NaiveDate>,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// National identity card number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cin: Option<String>,
    /// Insurance provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assurance: Option<String>,
}

impl From<&Patient> for PatientInput {
    fn from(p: &Patient) -> Self {
        Self {
            nom: p.nom.clone(),
            prenom: p.prenom.clone(),
            date_naissance: p.date_naissance,
            adresse: p.adresse.clone(),
            telephone: p.telephone.clone(),
            email: p.email.clone(),
            cin: p.cin.clone(),
            assurance: p.assurance.clone(),
        }
    }
}

impl Validate for PatientInput {
    fn validate(&self) -> Result<(), ClinicError> {
        require_text(&self.nom, "nom")?;
        require_text(&self.prenom, "prenom")?;
        require(self.date_naissance.as_ref(), "dateNaissance")?;
        if let Some(email) = self.email.as_deref().map(str::trim)
            && !email.is_empty()
            && !email.contains('@')
        {
            return Err(ClinicError::Validation(format!(
                "email is not a valid address: {email}"
            )));
        }
        Ok(())
    }
}

impl Entity for Patient {
    const PATH: &'static str = "patients";
    type Input = PatientInput;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Editable for Patient {}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> PatientInput {
        PatientInput {
            nom: "Alaoui".into(),
            prenom: "Sara".into(),
            date_naissance: NaiveDate::from_ymd_opt(1990, 4, 2),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_patient_validates() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn missing_names_are_rejected() {
        let mut input = valid_input();
        input.nom = "  ".into();
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("nom"));

        let mut input = valid_input();
        input.date_naissance = None;
        assert!(input.validate().unwrap_err().to_string().contains("dateNaissance"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut input = valid_input();
        input.email = Some("sara.example.com".into());
        assert!(input.validate().is_err());

        input.email = Some(String::new());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn decodes_without_optional_identity_fields() {
        let p: Patient = serde_json::from_value(serde_json::json!({
            "id": 1,
            "nom": "Alaoui",
            "prenom": "Sara",
            "dateNaissance": "1990-04-02",
            "telephone": "0600000000"
        }))
        .unwrap();
        assert_eq!(p.full_name(), "Sara Alaoui");
        assert!(p.cin.is_none());
        assert!(p.assurance.is_none());
    }

    #[test]
    fn input_omits_empty_optionals() {
        let json = serde_json::to_value(valid_input()).unwrap();
        assert_eq!(json["dateNaissance"], "1990-04-02");
        assert!(json.get("email").is_none());
        assert!(json.get("cin").is_none());
    }
}
