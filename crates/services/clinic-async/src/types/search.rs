//! Case-insensitive substring search over already-fetched lists.

use super::{
    Consultation, MouvementStock, Paiement, Patient, Prescription, Produit, RendezVous,
};

/// Something the list views can filter by a free-text term
pub trait Searchable {
    /// Fields the term is matched against
    fn search_fields(&self) -> Vec<&str>;

    /// True when any field contains `term`, ignoring case. Blank terms match everything.
    fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Keeps the items matching `term`, in order
pub fn filter<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.matches(term)).collect()
}

fn patient_fields(patient: Option<&Patient>) -> [&str; 2] {
    patient.map_or(["", ""], |p| [p.nom.as_str(), p.prenom.as_str()])
}

impl Searchable for Patient {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.nom.as_str(),
            self.prenom.as_str(),
            self.email.as_deref().unwrap_or_default(),
        ]
    }
}

impl Searchable for RendezVous {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = patient_fields(self.patient.as_ref()).to_vec();
        fields.push(self.motif.as_deref().unwrap_or_default());
        fields
    }
}

impl Searchable for Consultation {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = patient_fields(self.patient.as_ref()).to_vec();
        fields.push(self.diagnostic.as_deref().unwrap_or_default());
        fields
    }
}

impl Searchable for Prescription {
    fn search_fields(&self) -> Vec<&str> {
        let patient = self.consultation.as_ref().and_then(|c| c.patient.as_ref());
        let mut fields = patient_fields(patient).to_vec();
        fields.push(self.medicament.as_str());
        fields
    }
}

impl Searchable for Paiement {
    fn search_fields(&self) -> Vec<&str> {
        let patient = self.consultation.as_ref().and_then(|c| c.patient.as_ref());
        let mut fields = patient_fields(patient).to_vec();
        fields.push(self.mode_paiement.as_str());
        fields
    }
}

impl Searchable for Produit {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.nom.as_str(), self.description.as_deref().unwrap_or_default()]
    }
}

impl Searchable for MouvementStock {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.produit.as_ref().map_or("", |p| p.nom.as_str()),
            self.type_mouvement.as_str(),
        ]
    }
}
