//! Sign-in, sign-out and password change.

use std::io::{self, IsTerminal};

use anyhow::anyhow;
use hrms_client::ClientError;
use hrms_forms::{ChangePasswordDraft, FormMode};
use tracing::info;

use crate::cli::LoginArgs;
use crate::client::{AppContext, CliError, CliResult};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let username = args.username.trim().to_string();
    if username.is_empty() {
        return Err(CliError::validation("username cannot be empty"));
    }
    let password = match args.password {
        Some(value) => value,
        None => prompt_secret("Password: ")?,
    };
    if password.trim().is_empty() {
        return Err(CliError::validation("password cannot be empty"));
    }

    let tokens = ctx
        .client
        .login(&username, &password)
        .await
        .map_err(login_error)?;
    info!(username = %username, "signed in");
    match tokens.role.as_deref() {
        Some(role) => println!("Signed in as {username} (role: {role})."),
        None => println!("Signed in as {username}."),
    }
    Ok(())
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.client.logout()?;
    println!("Signed out.");
    Ok(())
}

pub(crate) async fn handle_password(ctx: &AppContext) -> CliResult<()> {
    ctx.require_session()?;
    let draft = ChangePasswordDraft {
        old_password: prompt_secret("Current password: ")?,
        new_password: prompt_secret("New password: ")?,
        confirm_password: prompt_secret("Confirm new password: ")?,
    };
    change_password(ctx, &draft).await
}

pub(crate) async fn change_password(ctx: &AppContext, draft: &ChangePasswordDraft) -> CliResult<()> {
    let outcome = ctx.submitter().submit(draft, FormMode::Create).await?;
    println!("{}", outcome.message);
    Ok(())
}

fn prompt_secret(prompt: &str) -> CliResult<String> {
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "password required; pass --password or set HRMS_PASSWORD when stdin is not a terminal",
        ));
    }
    rpassword::prompt_password(prompt)
        .map_err(|err| CliError::failure(anyhow!("failed to read password: {err}")))
}

/// Bad credentials are a user mistake, not an operational failure.
fn login_error(err: ClientError) -> CliError {
    match err.status() {
        Some(400 | 401) => CliError::validation(
            err.backend_message()
                .unwrap_or_else(|| "invalid username or password".to_string()),
        ),
        _ => err.into(),
    }
}
