use crate::db;
use crate::error::ApiError;
use crate::pagination::Pagination;
use crate::sse::{FeedEvent, VoteUpdate, publish};
use crate::startup::AppState;
use crate::votes::VoteType;
use axum::{
    extract::{
        Extension,
        Json,
        Path,
        Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Matches the width of `votes.user_id`, which fits a hyphenated UUID.
pub const MAX_USER_ID_LEN: usize = 36;

#[derive(Debug, Deserialize)]
pub struct CreateSuggestionRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteParams {
    pub vote_type: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub message: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub user_vote: Option<VoteType>,
}

impl VoteParams {
    /// Checked before any storage access.
    fn parse(&self) -> Result<(VoteType, &str), ApiError> {
        let vote_type = self
            .vote_type
            .as_deref()
            .ok_or_else(|| ApiError::InvalidRequest("vote_type is required".into()))?
            .parse::<VoteType>()?;

        let user_id = self
            .user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidRequest("user_id is required".into()))?;

        if user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(ApiError::InvalidRequest(format!(
                "user_id must be at most {MAX_USER_ID_LEN} characters"
            )));
        }

        Ok((vote_type, user_id))
    }
}

/// Suggestions, most upvoted first.
pub async fn list_suggestions(
    Extension(app_state): Extension<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(page) = page?;
    let (skip, limit) = page.resolve()?;
    let suggestions = db::list_suggestions(&app_state.db, skip, limit).await?;

    Ok((StatusCode::OK, Json(suggestions)))
}

pub async fn create_suggestion(
    Extension(app_state): Extension<AppState>,
    payload: Result<Json<CreateSuggestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::InvalidRequest("text must not be empty".into()));
    }

    let suggestion = db::create_suggestion(&app_state.db, text).await?;
    info!(id = suggestion.id, "suggestion created");

    publish(
        &app_state.feed,
        FeedEvent::SuggestionCreated(suggestion.clone()),
    );

    Ok((StatusCode::CREATED, Json(suggestion)))
}

/// Casts, switches or withdraws a user's vote on a suggestion.
pub async fn vote_suggestion(
    Extension(app_state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
    params: Result<Query<VoteParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(suggestion_id) = path?;
    let Query(params) = params?;
    let (vote_type, user_id) = params.parse()?;

    let outcome = db::cast_vote(&app_state.db, suggestion_id, user_id, vote_type)
        .await?
        .ok_or(ApiError::SuggestionNotFound(suggestion_id))?;

    info!(
        suggestion_id,
        requested = %vote_type,
        upvotes = outcome.counters.upvotes,
        downvotes = outcome.counters.downvotes,
        "vote recorded"
    );

    publish(
        &app_state.feed,
        FeedEvent::VoteUpdate(VoteUpdate {
            suggestion_id,
            upvotes: outcome.counters.upvotes,
            downvotes: outcome.counters.downvotes,
        }),
    );

    let response = VoteResponse {
        message: "Vote recorded".to_string(),
        upvotes: outcome.counters.upvotes,
        downvotes: outcome.counters.downvotes,
        user_vote: outcome.user_vote,
    };

    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(vote_type: Option<&str>, user_id: Option<&str>) -> VoteParams {
        VoteParams {
            vote_type: vote_type.map(Into::into),
            user_id: user_id.map(Into::into),
        }
    }

    #[test]
    fn test_parse_vote_params() {
        let p = params(Some("down"), Some("4f1c2a9e-7b1d-4c55-9a43-0d2f9a61b7c3"));
        let (vote_type, user_id) = p.parse().unwrap();
        assert_eq!(vote_type, VoteType::Down);
        assert_eq!(user_id, "4f1c2a9e-7b1d-4c55-9a43-0d2f9a61b7c3");
    }

    #[test]
    fn test_user_id_is_kept_verbatim() {
        // distinct ids must not collapse onto the same ledger row
        let p = params(Some("up"), Some(" alice "));
        assert_eq!(p.parse().unwrap().1, " alice ");
        let p = params(Some("up"), Some("alice"));
        assert_eq!(p.parse().unwrap().1, "alice");
    }

    #[test]
    fn test_parse_rejects_bad_params() {
        assert!(matches!(
            params(Some("meh"), Some("u1")).parse(),
            Err(ApiError::InvalidVoteType(_))
        ));
        assert!(matches!(
            params(None, Some("u1")).parse(),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            params(Some("up"), Some("  ")).parse(),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            params(Some("up"), Some("\t\n")).parse(),
            Err(ApiError::InvalidRequest(_))
        ));
        let long = "u".repeat(MAX_USER_ID_LEN + 1);
        assert!(params(Some("up"), Some(&long)).parse().is_err());
    }
}
