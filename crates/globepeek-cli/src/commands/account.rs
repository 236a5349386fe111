//! Account commands: sign-up, sign-in, OAuth, password, profile and newsletter.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use globepeek_cli::output::{format_profile, format_user};
use globepeek_lib::{AuthGate, GateState, Profile, ProfileUpdate, SignUpOutcome};

use super::Context;

#[derive(Debug, clap::Subcommand)]
pub enum ProfileCommand {
    /// Show the stored profile.
    Show,
    /// Change one or more profile fields.
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Upload an image file and use it as the avatar.
    Avatar {
        /// Path to a .png, .jpg, .gif or .webp file.
        path: std::path::PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct Subscription<'a> {
    email: &'a str,
    subscribed: bool,
}

pub async fn register(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let outcome = ctx
        .clients
        .supabase
        .sign_up(email, password)
        .await
        .context("sign-up failed")?;

    if let SignUpOutcome::SignedIn { session } = &outcome {
        ctx.sign_in(session.clone())?;
    }
    ctx.emit(&outcome, |p| match &outcome {
        SignUpOutcome::SignedIn { session } => {
            format!("{}Signed up and signed in as {}{}", p.ok, format_user(&session.user), p.reset)
        }
        SignUpOutcome::ConfirmationRequired { user } => format!(
            "Account created for {}. Check your inbox to confirm it, then run `globepeek login`.",
            format_user(user)
        ),
    })
}

pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let session = ctx
        .clients
        .supabase
        .sign_in_with_password(email, password)
        .await
        .context("sign-in failed")?;
    ctx.sign_in(session.clone())?;
    tracing::info!(user_id = %session.user.id, "signed in");

    ctx.emit(&session.user, |p| {
        format!("{}Signed in as {}{}", p.ok, format_user(&session.user), p.reset)
    })
}

pub fn oauth_url(ctx: &Context, provider: &str, redirect_to: Option<&str>) -> Result<()> {
    let url = ctx
        .clients
        .supabase
        .oauth_authorize_url(provider, redirect_to)
        .context("cannot build the OAuth sign-in URL")?;
    ctx.emit(url.as_str(), |_| url.to_string())
}

/// Revoke the stored session upstream and forget it locally. The local copy is
/// removed even if revocation fails.
pub async fn logout(ctx: &Context) -> Result<()> {
    if let Some(session) = ctx.session.current() {
        if let Err(e) = ctx.clients.supabase.sign_out(&session.access_token).await {
            tracing::warn!(error = %e, "could not revoke session, removing it locally");
        }
    }
    ctx.sign_out()?;
    ctx.emit(&serde_json::json!({"signed_out": true}), |_| "Signed out.".to_string())
}

/// Check the stored session against the auth provider. A rejected token
/// counts as signed out.
pub async fn whoami(ctx: &Context) -> Result<()> {
    let mut gate = AuthGate::new();
    match ctx.session.current() {
        Some(session) => {
            let supabase = &ctx.clients.supabase;
            gate.check(async { supabase.get_user(&session.access_token).await.map(Some) })
                .await;
        }
        None => {
            gate.resolve(None);
        }
    }

    ctx.emit(gate.state(), |p| match gate.state() {
        GateState::Authenticated(user) => format_user(user),
        _ => format!("{}Not signed in.{}", p.muted, p.reset),
    })
}

pub async fn change_password(ctx: &Context, password: &str) -> Result<()> {
    let session = ctx.require_session()?;
    let user = ctx
        .clients
        .supabase
        .update_password(&session.access_token, password)
        .await
        .context("password change failed")?;
    ctx.emit(&user, |p| format!("{}Password updated.{}", p.ok, p.reset))
}

pub async fn profile(ctx: &Context, command: ProfileCommand) -> Result<()> {
    let session = ctx.require_session()?;
    let supabase = &ctx.clients.supabase;

    let profile = match command {
        ProfileCommand::Show => supabase
            .get_profile(&session)
            .await
            .context("failed to load profile")?
            .unwrap_or_else(|| Profile::blank(&session.user.id)),
        ProfileCommand::Update { full_name, country } => {
            if full_name.is_none() && country.is_none() {
                bail!("nothing to update: pass --full-name and/or --country");
            }
            let update = ProfileUpdate {
                full_name,
                country,
                ..ProfileUpdate::default()
            };
            supabase
                .update_profile(&session, update)
                .await
                .context("failed to update profile")?
        }
        ProfileCommand::Avatar { path } => {
            let avatar_url = upload_avatar(ctx, &path).await?;
            let update = ProfileUpdate {
                avatar_url: Some(avatar_url),
                ..ProfileUpdate::default()
            };
            supabase
                .update_profile(&session, update)
                .await
                .context("avatar uploaded but the profile could not be updated")?
        }
    };

    ctx.emit(&profile, |_| format_profile(&profile))
}

async fn upload_avatar(ctx: &Context, path: &Path) -> Result<String> {
    let session = ctx.require_session()?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} is not a file name", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(file = file_name, bytes = bytes.len(), "uploading avatar");

    ctx.clients
        .supabase
        .upload_avatar(&session, file_name, bytes)
        .await
        .context("avatar upload failed")
}

pub async fn subscribe(ctx: &Context, email: &str) -> Result<()> {
    let email = email.trim();
    let subscribed = ctx
        .clients
        .supabase
        .subscribe_newsletter(email)
        .await
        .context("newsletter sign-up failed")?;

    ctx.emit(&Subscription { email, subscribed }, |p| {
        if subscribed {
            format!("{}Subscribed {email} to the newsletter.{}", p.ok, p.reset)
        } else {
            format!("{email} is already subscribed.")
        }
    })
}
