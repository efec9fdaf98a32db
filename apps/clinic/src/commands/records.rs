//! Record listing, dashboard and reservation slots.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use clinic_async::types::{RendezVous, available_slots};
use colored::Colorize;
use serde::Serialize;

use crate::context::AppContext;

/// Collections `clinic list` can show.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Resource {
    Patients,
    RendezVous,
    Consultations,
    Prescriptions,
    Paiements,
    Produits,
    Mouvements,
}

/// Prints the collection as JSON, filtered by `search` when given.
pub async fn list(ctx: &AppContext, resource: Resource, search: Option<&str>) -> Result<()> {
    let client = ctx.api_client().await?;
    let term = search.unwrap_or_default();

    let rendered = match resource {
        Resource::Patients => render(&client.patients().search(term).await?)?,
        Resource::RendezVous => render(&client.rendez_vous().search(term).await?)?,
        Resource::Consultations => render(&client.consultations().search(term).await?)?,
        Resource::Prescriptions => render(&client.prescriptions().search(term).await?)?,
        Resource::Paiements => render(&client.paiements().search(term).await?)?,
        Resource::Produits => render(&client.produits().search(term).await?)?,
        Resource::Mouvements => render(&client.mouvements_stock().search(term).await?)?,
    };
    println!("{rendered}");
    Ok(())
}

fn render<T: Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

pub async fn dashboard(ctx: &AppContext) -> Result<()> {
    let client = ctx.api_client().await?;
    let overview = client.dashboard().overview().await;

    println!("{}", "Statistics".bold());
    match overview.statistiques {
        Some(stats) => {
            println!("  Patients:              {}", stats.total_patients);
            println!("  Appointments today:    {}", stats.rendez_vous_aujourdhui);
            println!("  Consultations today:   {}", stats.consultations_aujourdhui);
            println!("  Consultations (total): {}", stats.total_consultations);
            println!("  Prescriptions (total): {}", stats.total_prescriptions);
            println!("  Payments (total):      {}", stats.total_paiements);
        }
        None => println!("  {} unavailable", "WARN".yellow()),
    }

    println!("\n{}", "Upcoming appointments".bold());
    match overview.prochains_rendez_vous {
        Some(upcoming) if upcoming.is_empty() => println!("  (none)"),
        Some(upcoming) => {
            for rdv in &upcoming {
                println!("  {}", appointment_line(rdv));
            }
        }
        None => println!("  {} unavailable", "WARN".yellow()),
    }
    Ok(())
}

fn appointment_line(rdv: &RendezVous) -> String {
    let patient = rdv
        .patient
        .as_ref()
        .map_or_else(|| "-".to_string(), clinic_async::types::Patient::full_name);
    format!(
        "{}  {}  {}  [{}]",
        rdv.date_heure.format("%d/%m/%Y %H:%M"),
        patient,
        rdv.motif.as_deref().unwrap_or("-"),
        rdv.statut.label()
    )
}

/// Prints the bookable slots of the next `days` days, one line per day.
pub fn slots(days: u32) {
    print!("{}", format_slots(Local::now().date_naive(), days));
}

fn format_slots(today: NaiveDate, days: u32) -> String {
    let mut out = String::new();
    let mut current: Option<NaiveDate> = None;

    for slot in available_slots(today, days) {
        if current != Some(slot.date()) {
            if current.is_some() {
                out.push('\n');
            }
            out.push_str(&slot.format("%a %d/%m/%Y:").to_string());
            current = Some(slot.date());
        }
        out.push_str(&slot.format(" %H:%M").to_string());
    }
    if current.is_some() {
        out.push('\n');
    }
    out
}
