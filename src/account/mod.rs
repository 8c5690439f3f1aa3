//! Member accounts and sign-in
//!
//! Credential checks and storage belong to the hosted service; this module
//! only sequences the calls and keeps the local session.

mod client;
mod name;
mod session;

pub(crate) use client::{AccountClient, AccountService};
pub(crate) use name::{admin_display_name, member_display_name};
pub(crate) use session::{Session, SessionStore};

use tracing::{info, warn};

use crate::error::{AppError, ValidationError};

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Create a member row unless one already exists for `email`.
pub(crate) fn register(
    service: &dyn AccountService,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    require(email, "email")?;
    require(password, "password")?;

    if service.find_member(email, None)? {
        return Err(AppError::Auth("Account already exists".to_string()));
    }
    service.insert_member(email, password)?;
    info!(email, "member account created");
    Ok(())
}

pub(crate) fn member_login(
    service: &dyn AccountService,
    email: &str,
    password: &str,
) -> Result<Session, AppError> {
    require(email, "email")?;
    require(password, "password")?;

    if !service.find_member(email, Some(password))? {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }
    info!(email, "member signed in");
    Ok(Session::member(email, member_display_name(email)))
}

pub(crate) fn admin_login(
    service: &dyn AccountService,
    email: &str,
    password: &str,
) -> Result<Session, AppError> {
    require(email, "email")?;
    require(password, "password")?;

    let token = service.sign_in_admin(email, password)?;
    info!(email, "admin signed in");
    Ok(Session::admin(email, admin_display_name(email), token))
}

/// Revoke the remote token if there is one, then forget the local session.
///
/// A failed revoke is logged and does not keep the user signed in.
pub(crate) fn logout(
    service: Option<&dyn AccountService>,
    store: &SessionStore,
) -> Result<Option<Session>, AppError> {
    let session = store.load();
    if let (Some(service), Some(token)) = (
        service,
        session.as_ref().and_then(|s| s.access_token.as_deref()),
    ) && let Err(e) = service.sign_out(token)
    {
        warn!(error = %e, "sign out error");
    }
    store.clear()?;
    Ok(session)
}
