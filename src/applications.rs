use crate::db::{self, NewApplication};
use crate::error::ApiError;
use crate::pagination::Pagination;
use crate::startup::AppState;
use axum::{
    extract::{
        Extension,
        Json,
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub name: String,
    pub category: String,
    pub icon: String,
    pub url: String,
}

impl CreateApplicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("name must not be empty".into()));
        }

        let limits = [
            ("name", &self.name, 100),
            ("category", &self.category, 50),
            ("icon", &self.icon, 255),
            ("url", &self.url, 255),
        ];
        for (field, value, max) in limits {
            if value.chars().count() > max {
                return Err(ApiError::InvalidRequest(format!(
                    "{field} must be at most {max} characters"
                )));
            }
        }

        Ok(())
    }
}

pub async fn list_applications(
    Extension(app_state): Extension<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(page) = page?;
    let (skip, limit) = page.resolve()?;
    let applications = db::list_applications(&app_state.db, skip, limit).await?;

    Ok((StatusCode::OK, Json(applications)))
}

pub async fn create_application(
    Extension(app_state): Extension<AppState>,
    payload: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let application = db::create_application(
        &app_state.db,
        &NewApplication {
            name: payload.name.trim(),
            category: &payload.category,
            icon: &payload.icon,
            url: &payload.url,
        },
    )
    .await?;

    info!(id = application.id, name = %application.name, "application created");
    Ok((StatusCode::CREATED, Json(application)))
}
