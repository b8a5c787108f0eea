use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LocationView, LoginRequest, LoginResponse, MessageResponse, ProfileResponse,
            RegisterRequest, UpdateProfileRequest,
        },
        extractors::{AppJson, AuthUser},
        repo_types::Role,
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/farmer/dashboard", get(farmer_dashboard))
        .route("/consumer/dashboard", get(consumer_dashboard))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::register_user(&state, &payload).await?;
    Ok(Json(MessageResponse::new("Registered successfully")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let services::LoggedIn { user, access_token } = services::login_user(&state, &payload).await?;
    Ok(Json(LoginResponse {
        message: "Login success".into(),
        role: user.role,
        user_id: user.id,
        location: LocationView::from(&user),
        name: user.name,
        access_token,
        token_type: "bearer",
    }))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = services::load_profile(&state, auth.0.user_id).await?;
    Ok(Json(ProfileResponse::from(user)))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.0.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::update_profile(&state, auth.0.user_id, payload).await?;
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

#[instrument(skip(auth), fields(user_id = %auth.0.user_id))]
pub async fn farmer_dashboard(auth: AuthUser) -> Result<Json<MessageResponse>, AppError> {
    auth.require_role(Role::Farmer)?;
    Ok(Json(MessageResponse::new("Welcome to the farmer dashboard")))
}

#[instrument(skip(auth), fields(user_id = %auth.0.user_id))]
pub async fn consumer_dashboard(auth: AuthUser) -> Result<Json<MessageResponse>, AppError> {
    auth.require_role(Role::Consumer)?;
    Ok(Json(MessageResponse::new("Welcome to the consumer dashboard")))
}
