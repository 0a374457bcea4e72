use anyhow::{Context, Result};

use super::CommandContext;
use crate::access::AccessError;
use crate::api::types::User;
use crate::credentials::{self, prompt_for_login, CredentialError, ENV_TOKEN_VAR};
use crate::session::{self, Session};

pub async fn login(ctx: &CommandContext, current: Option<&Session>) -> Result<()> {
    let (username, password) = prompt_for_login(current.map(|s| s.username.as_str()))?;
    let response = ctx
        .client
        .login(&username, &password)
        .await
        .context("Login failed")?;

    match credentials::store_token(response.token).await {
        Ok(()) => {}
        Err(CredentialError::KeyringUnavailable(msg)) | Err(CredentialError::StoreFailed(msg)) => {
            anyhow::bail!(
                "Logged in, but the token could not be stored in the system keyring ({}). \
                Set {} to the token instead.",
                msg,
                ENV_TOKEN_VAR
            );
        }
        Err(e) => return Err(e.into()),
    }

    let session = Session::from_user(response.user, ctx.client.base_url());
    session::save_session(&session::get_session_path(), &session)?;
    tracing::debug!("Session saved to {}", session::get_session_path().display());

    println!("Logged in as {} ({})", session.username, session.role);
    Ok(())
}

pub async fn logout() -> Result<()> {
    credentials::delete_token()
        .await
        .context("Failed to remove token from keyring")?;
    session::clear_session(&session::get_session_path())?;
    println!("Logged out.");
    Ok(())
}

/// The stored session no longer describes `user` on this server.
fn needs_refresh(current: Option<&Session>, user: &User, api_url: &str) -> bool {
    !current.is_some_and(|s| s.username == user.username && s.role == user.role && s.is_for(api_url))
}

/// Ask the server who the token belongs to and refresh the session with
/// the role it reports.
pub async fn whoami(ctx: &CommandContext, current: Option<&Session>) -> Result<()> {
    if !ctx.client.has_token() {
        return Err(AccessError::NotAuthenticated.into());
    }
    let user = ctx.client.me().await?;

    if needs_refresh(current, &user, ctx.client.base_url()) {
        let session = Session::from_user(user.clone(), ctx.client.base_url());
        session::save_session(&session::get_session_path(), &session)?;
        tracing::debug!("Session updated for {} ({})", user.username, user.role);
    }

    ctx.emit(&user, || format!("{} ({})", user.username, user.role))
}
