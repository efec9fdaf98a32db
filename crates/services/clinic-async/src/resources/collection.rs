use std::marker::PhantomData;

use crate::{
    client::Client,
    config::Config,
    error::ClinicError,
    types::{
        AppointmentRequest, Consultation, Editable, Entity, MouvementStock, Paiement, Patient,
        Prescription, Produit, RendezVous, RendezVousInput, Searchable, Validate,
    },
};

/// API resource for one entity collection (`/patients`, `/rendez-vous`, ...)
pub struct Collection<'c, C: Config, E: Entity> {
    client: &'c Client<C>,
    _entity: PhantomData<fn() -> E>,
}

impl<'c, C: Config, E: Entity> Collection<'c, C, E> {
    /// Creates a new collection resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }

    /// Fetches every item
    pub async fn list(&self) -> Result<Vec<E>, ClinicError> {
        self.client.get(E::PATH).await
    }

    /// Fetches one item by id
    pub async fn get(&self, id: i64) -> Result<E, ClinicError> {
        self.client.get(&format!("{}/{id}", E::PATH)).await
    }

    /// Validates and creates an item
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] without touching the network when the
    /// payload is incomplete.
    pub async fn create(&self, input: &E::Input) -> Result<E, ClinicError> {
        input.validate()?;
        self.client.post(E::PATH, input).await
    }

    /// Fetches every item and keeps those matching `term`
    pub async fn search(&self, term: &str) -> Result<Vec<E>, ClinicError>
    where
        E: Searchable,
    {
        let mut items = self.list().await?;
        items.retain(|item| item.matches(term));
        Ok(items)
    }
}

impl<C: Config, E: Editable> Collection<'_, C, E> {
    /// Validates and replaces an item
    pub async fn update(&self, id: i64, input: &E::Input) -> Result<E, ClinicError> {
        input.validate()?;
        self.client.put(&format!("{}/{id}", E::PATH), input).await
    }

    /// Deletes an item
    pub async fn delete(&self, id: i64) -> Result<(), ClinicError> {
        self.client.delete(&format!("{}/{id}", E::PATH)).await
    }
}

impl<C: Config> Collection<'_, C, RendezVous> {
    /// Books a slot on behalf of a patient; the appointment starts as `EN_ATTENTE`
    pub async fn request(&self, req: AppointmentRequest) -> Result<RendezVous, ClinicError> {
        self.create(&RendezVousInput::from(req)).await
    }
}

// Add accessors to client
impl<C: Config> crate::Client<C> {
    /// Returns the `/patients` resource
    #[must_use]
    pub const fn patients(&self) -> Collection<'_, C, Patient> {
        Collection::new(self)
    }

    /// Returns the `/rendez-vous` resource
    #[must_use]
    pub const fn rendez_vous(&self) -> Collection<'_, C, RendezVous> {
        Collection::new(self)
    }

    /// Returns the `/consultations` resource
    #[must_use]
    pub const fn consultations(&self) -> Collection<'_, C, Consultation> {
        Collection::new(self)
    }

    /// Returns the `/prescriptions` resource
    #[must_use]
    pub const fn prescriptions(&self) -> Collection<'_, C, Prescription> {
        Collection::new(self)
    }

    /// Returns the `/paiements` resource
    #[must_use]
    pub const fn paiements(&self) -> Collection<'_, C, Paiement> {
        Collection::new(self)
    }

    /// Returns the `/produits` resource
    #[must_use]
    pub const fn produits(&self) -> Collection<'_, C, Produit> {
        Collection::new(self)
    }

    /// Returns the `/mouvements-stock` resource (create and list only)
    #[must_use]
    pub const fn mouvements_stock(&self) -> Collection<'_, C, MouvementStock> {
        Collection::new(self)
    }
}
