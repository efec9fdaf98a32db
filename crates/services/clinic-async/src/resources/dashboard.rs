use crate::{
    client::Client,
    config::Config,
    error::ClinicError,
    types::{RendezVous, Statistiques},
};

/// Both dashboard sections; each is `None` when its fetch failed
#[derive(Debug, Clone, Default)]
pub struct DashboardOverview {
    /// Headline counters
    pub statistiques: Option<Statistiques>,
    /// Upcoming appointments
    pub prochains_rendez_vous: Option<Vec<RendezVous>>,
}

/// API resource for the `/dashboard` endpoints
pub struct Dashboard<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Dashboard<'c, C> {
    /// Creates a new Dashboard resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Headline counters
    pub async fn statistiques(&self) -> Result<Statistiques, ClinicError> {
        self.client.get("dashboard/statistiques").await
    }

    /// Upcoming appointments
    pub async fn prochains_rendez_vous(&self) -> Result<Vec<RendezVous>, ClinicError> {
        self.client.get("dashboard/prochains-rendez-vous").await
    }

    /// Fetches both sections concurrently. A failing section is logged and left empty.
    pub async fn overview(&self) -> DashboardOverview {
        let (stats, upcoming) = futures::join!(self.statistiques(), self.prochains_rendez_vous());

        DashboardOverview {
            statistiques: stats
                .inspect_err(|e| tracing::warn!(error = %e, "dashboard statistics unavailable"))
                .ok(),
            prochains_rendez_vous: upcoming
                .inspect_err(|e| tracing::warn!(error = %e, "upcoming appointments unavailable"))
                .ok(),
        }
    }
}

// Add accessor to client
impl<C: Config> crate::Client<C> {
    /// Returns the Dashboard API resource
    #[must_use]
    pub const fn dashboard(&self) -> Dashboard<'_, C> {
        Dashboard::new(self)
    }
}
