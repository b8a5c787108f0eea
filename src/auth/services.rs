use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest, UpdateProfileRequest},
    password::{hash_password, verify_password},
    repo_types::{ProfileUpdate, User},
    validation,
};
use crate::{error::AppError, state::AppState};

/// Outcome of a successful login.
pub struct LoggedIn {
    pub user: User,
    pub access_token: String,
}

/// Validates, checks uniqueness, hashes and stores a new user.
pub async fn register_user(state: &AppState, req: &RegisterRequest) -> Result<User, AppError> {
    let registration = validation::validate(req)?;
    let role = registration.role();

    // Fast path only; the unique constraint decides concurrent registrations.
    if state.directory.find_by_mobile(registration.mobile()).await?.is_some() {
        warn!(role = %role, "mobile already registered");
        return Err(AppError::Conflict);
    }

    let hash = hash_password(registration.password())?;
    let new_user = registration.into_new_user(hash);

    let user = state.directory.create(new_user).await.map_err(|e| {
        warn!(error = %e, role = %role, "create user failed");
        AppError::from(e)
    })?;

    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
}

/// Unknown mobile and wrong password are indistinguishable to the caller.
pub async fn login_user(state: &AppState, req: &LoginRequest) -> Result<LoggedIn, AppError> {
    let mobile = validation::normalize_mobile(req.mobile.as_deref().unwrap_or_default());
    let password = req.password.as_deref().unwrap_or_default();
    if mobile.is_empty() || password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let user = match state.directory.find_by_mobile(&mobile).await? {
        Some(u) => u,
        None if !state.directory.is_authoritative() => {
            warn!("login lookup missed while user storage is degraded");
            return Err(AppError::Unavailable);
        }
        None => {
            warn!("login unknown mobile");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let access_token = state.jwt.issue(user.id, user.role)?;
    info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok(LoggedIn { user, access_token })
}

/// Loads the caller's record; a token for a vanished user is treated as unauthenticated.
pub async fn load_profile(state: &AppState, user_id: uuid::Uuid) -> Result<User, AppError> {
    state.directory.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token for unknown user");
        AppError::Unauthenticated
    })
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn update_profile(
    state: &AppState,
    user_id: uuid::Uuid,
    req: UpdateProfileRequest,
) -> Result<User, AppError> {
    let changes = ProfileUpdate {
        name: non_blank(req.name),
        email: non_blank(req.email)
            .map(|e| validation::checked_email(&e))
            .transpose()?,
        state: non_blank(req.state),
        district: non_blank(req.district),
        village: non_blank(req.village),
    };
    if changes.is_empty() {
        return load_profile(state, user_id).await;
    }

    let user = state
        .directory
        .update(user_id, changes)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}
