use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{dto::WeatherResponse, services::weather_near};
use crate::{
    auth::{extractors::AuthUser, services::load_profile},
    error::AppError,
    state::AppState,
};

pub fn weather_routes() -> Router<AppState> {
    Router::new().route("/weather/me", get(weather_me))
}

/// Current weather at the caller's saved district/state.
#[instrument(skip(state, auth), fields(user_id = %auth.0.user_id))]
pub async fn weather_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<WeatherResponse>, AppError> {
    let user = load_profile(&state, auth.0.user_id).await?;
    let report = weather_near(
        state.weather.as_ref(),
        user.district.as_deref(),
        user.state.as_deref(),
    )
    .await?;
    Ok(Json(report))
}
