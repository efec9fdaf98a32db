use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Editable, Entity, IdRef, Validate, common::local_datetime, require_text};
use crate::error::ClinicError;

/// Reorder threshold used when a product has none
pub const DEFAULT_SEUIL_MINIMAL: i64 = 5;

/// Stock health of a product relative to its reorder threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockLevel {
    /// At or below the threshold
    Low,
    /// Within 1.5x of the threshold
    Warning,
    /// Comfortably stocked
    Ok,
}

impl StockLevel {
    /// Classifies `quantite` against `seuil`
    #[must_use]
    pub fn classify(quantite: i64, seuil: i64) -> Self {
        if quantite <= seuil {
            Self::Low
        } else if quantite as f64 <= seuil as f64 * 1.5 {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    /// Short label for display
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Warning => "warning",
            Self::Ok => "ok",
        }
    }
}

/// A stocked product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Produit {
    /// Backend id
    pub id: i64,
    /// Product name
    pub nom: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    #[serde(default)]
    pub prix: Option<f64>,
    /// Units in stock
    #[serde(default)]
    pub quantite: i64,
    /// Reorder threshold
    #[serde(default)]
    pub seuil_minimal: Option<i64>,
}

impl Produit {
    /// Effective reorder threshold
    #[must_use]
    pub fn seuil(&self) -> i64 {
        self.seuil_minimal.unwrap_or(DEFAULT_SEUIL_MINIMAL)
    }

    /// Current stock level
    #[must_use]
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.quantite, self.seuil())
    }
}

/// Create/update payload for [`Produit`]; empty optionals are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduitInput {
    /// Product name
    pub nom: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prix: Option<f64>,
    /// Units in stock
    pub quantite: i64,
    /// Reorder threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seuil_minimal: Option<i64>,
}

impl From<&Produit> for ProduitInput {
    fn from(p: &Produit) -> Self {
        Self {
            nom: p.nom.clone(),
            description: p.description.clone(),
            prix: p.prix,
            quantite: p.quantite,
            seuil_minimal: p.seuil_minimal,
        }
    }
}

impl Validate for ProduitInput {
    fn validate(&self) -> Result<(), ClinicError> {
        require_text(&self.nom, "nom")?;
        if self.quantite < 0 {
            return Err(ClinicError::Validation(
                "quantite cannot be negative".into(),
            ));
        }
        if self.prix.is_some_and(|p| p < 0.0) {
            return Err(ClinicError::Validation("prix cannot be negative".into()));
        }
        Ok(())
    }
}

impl Entity for Produit {
    const PATH: &'static str = "produits";
    type Input = ProduitInput;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Editable for Produit {}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeMouvement {
    /// Units received
    Entree,
    /// Units consumed
    Sortie,
}

impl TypeMouvement {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entree => "ENTREE",
            Self::Sortie => "SORTIE",
        }
    }
}

/// A recorded stock movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouvementStock {
    /// Backend id
    pub id: i64,
    /// Direction
    #[serde(rename = "type")]
    pub type_mouvement: TypeMouvement,
    /// Units moved
    pub quantite: i64,
    /// When it was recorded
    #[serde(default, with = "local_datetime::option")]
    pub date: Option<NaiveDateTime>,
    /// Product moved
    #[serde(default)]
    pub produit: Option<Produit>,
}

/// Payload recording a stock movement
///
/// The backend adjusts the product quantity itself; refetch products afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouvementStockInput {
    /// Product moved
    pub produit: IdRef,
    /// Direction
    #[serde(rename = "type")]
    pub type_mouvement: TypeMouvement,
    /// Units moved
    pub quantite: i64,
}

impl MouvementStockInput {
    /// Builds a movement for product `produit_id`
    #[must_use]
    pub const fn new(produit_id: i64, type_mouvement: TypeMouvement, quantite: i64) -> Self {
        Self {
            produit: IdRef { id: produit_id },
            type_mouvement,
            quantite,
        }
    }
}

impl Validate for MouvementStockInput {
    fn validate(&self) -> Result<(), ClinicError> {
        if self.quantite <= 0 {
            return Err(ClinicError::Validation(
                "quantite must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Entity for MouvementStock {
    const PATH: &'static str = "mouvements-stock";
    type Input = MouvementStockInput;

    fn id(&self) -> i64 {
        self.id
    }
}
