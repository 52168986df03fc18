use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub url: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Suggestion {
    pub id: i32,
    pub text: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub created_at: DateTime<Utc>,
}

/// One row of the vote ledger. `vote_type` holds `"up"` or `"down"`.
#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Vote {
    pub id: i32,
    pub suggestion_id: i32,
    pub user_id: String,
    pub vote_type: String,
}
