use crate::db::connection::DbPool;
use crate::db::models::Suggestion;
use sqlx::Error;

pub async fn list_suggestions(
    pool: &DbPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<Suggestion>, Error> {
    sqlx::query_as::<_, Suggestion>(
        r#"
        SELECT id, text, upvotes, downvotes, created_at
        FROM suggestions
        ORDER BY upvotes DESC, id ASC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn get_suggestion(
    pool: &DbPool,
    suggestion_id: i32,
) -> Result<Option<Suggestion>, Error> {
    sqlx::query_as::<_, Suggestion>(
        "SELECT id, text, upvotes, downvotes, created_at FROM suggestions WHERE id = $1",
    )
    .bind(suggestion_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_suggestion(pool: &DbPool, text: &str) -> Result<Suggestion, Error> {
    sqlx::query_as::<_, Suggestion>(
        r#"
        INSERT INTO suggestions (text)
        VALUES ($1)
        RETURNING id, text, upvotes, downvotes, created_at
        "#,
    )
    .bind(text)
    .fetch_one(pool)
    .await
}
