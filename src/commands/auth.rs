//! Authentication command handlers for OAuth flow.
//!
//! This module implements the CLI commands for:
//! - `moverperfect auth` - Initial OAuth consent flow
//! - `moverperfect auth --verify` - Verify and refresh authentication

use crate::api::TokenProvider;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;

/// Handles the `moverperfect auth` command - runs the OAuth consent flow
///
/// This is the ONLY command that should open a browser for OAuth authentication.
///
/// This guides the user through setting up Google Sheets authentication:
/// 1. Reads client_secret.json
/// 2. Prints the consent URL and waits for the browser to be redirected back to localhost
/// 3. Saves tokens to token.json with required scopes
///
/// # Errors
/// Returns an error if OAuth flow fails or if client_secret.json is missing
pub async fn auth(config: &Config) -> Result<Out<()>> {
    let _ = TokenProvider::initialize(config.client_secret_path(), config.token_path()).await?;
    Ok("Authentication complete".into())
}

/// Handles the `moverperfect auth --verify` command - verifies authentication
///
/// This command NEVER opens a browser or triggers an interactive OAuth flow. It checks that the
/// stored tokens exist and carry the required scopes, then refreshes the access token.
///
/// # Errors
/// Returns an error if verification fails, credentials are missing, or tokens are invalid.
pub async fn auth_verify(config: &Config) -> Result<Out<()>> {
    let mut token_provider = TokenProvider::load(config.client_secret_path(), config.token_path())
        .await
        .context(
            "Unable to use the existing tokens found in the token JSON file. \n\n\
            You should run 'moverperfect auth' (without the --verify flag).",
        )?;
    token_provider
        .refresh()
        .await
        .context("Unable to refresh the token")?;
    Ok("Your OAuth token is valid!".into())
}
