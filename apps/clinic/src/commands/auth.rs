//! Login, logout and session inspection.

use anyhow::{Context, Result};
use clinic_async::auth::SessionStatus;
use colored::Colorize;

use crate::context::AppContext;

/// Prints the authorization URL, or completes the login when the redirect's
/// `code` and `state` are given.
pub async fn login(ctx: &AppContext, code: Option<String>, state: Option<String>) -> Result<()> {
    let session = ctx.session().await?;

    if let (Some(code), Some(state)) = (code, state) {
        session
            .complete_login(&code, &state)
            .await
            .context("Login failed")?;

        let name = session
            .user_profile()
            .map_or_else(|| "user".to_string(), |p| p.display_name().to_string());
        println!("{} Logged in as {}", "OK".green(), name.cyan());
        return Ok(());
    }

    if session.is_authenticated() {
        println!("{} Already logged in; continuing will replace the session", "INFO".blue());
    }

    let redirect = session.login().await.context("Could not start login")?;
    println!("Open this URL in a browser to log in:\n\n  {}\n", redirect.url);
    println!(
        "Then run: clinic login --code <code> --state {}",
        redirect.state
    );
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    let session = ctx.session().await?;
    let url = session.logout().await.context("Logout failed")?;

    println!("{} Logged out", "OK".green());
    println!("End the browser session at:\n  {url}");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let session = ctx.session().await?;
    let snapshot = session.snapshot();

    match snapshot.status {
        SessionStatus::Authenticated => {
            let profile = snapshot.user_profile.unwrap_or_default();
            println!("{} {}", "Logged in as".green(), profile.display_name().cyan());
            if let Some(username) = &profile.username {
                println!("  Username: {username}");
            }
            if let Some(email) = &profile.email {
                println!("  Email:    {email}");
            }
            if snapshot.roles.is_empty() {
                println!("  Roles:    (none)");
            } else {
                println!("  Roles:    {}", snapshot.roles.join(", "));
            }
        }
        SessionStatus::Unauthenticated | SessionStatus::Loading => {
            println!("Not logged in");
            if let Some(error) = snapshot.last_error {
                println!("  {} {}", "WARN".yellow(), error);
            }
        }
    }
    Ok(())
}
