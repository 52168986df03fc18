use crate::db::connection::DbPool;
use crate::db::models::Vote;
use crate::votes::{Counters, LedgerWrite, VoteType, transition};
use sqlx::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub counters: Counters,
    pub user_vote: Option<VoteType>,
}

/// Applies one vote inside a single transaction. The suggestion row is locked
/// first so votes on the same suggestion are serialized, then exactly one
/// ledger write and one counter update are committed together.
///
/// Returns `Ok(None)` when the suggestion does not exist.
pub async fn cast_vote(
    pool: &DbPool,
    suggestion_id: i32,
    user_id: &str,
    requested: VoteType,
) -> Result<Option<VoteOutcome>, Error> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_as::<_, (i32, i32)>(
        "SELECT upvotes, downvotes FROM suggestions WHERE id = $1 FOR UPDATE",
    )
    .bind(suggestion_id)
    .fetch_optional(&mut *tx)
    .await?;

    if locked.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    let existing = sqlx::query_as::<_, Vote>(
        r#"
        SELECT id, suggestion_id, user_id, vote_type
        FROM votes
        WHERE suggestion_id = $1 AND user_id = $2
        "#,
    )
    .bind(suggestion_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let current = existing
        .as_ref()
        .map(|vote| vote.vote_type.parse::<VoteType>())
        .transpose()
        .map_err(|e| Error::Decode(Box::new(e)))?;

    let t = transition(current, requested);
    debug!(suggestion_id, user_id, ?current, ?t, "applying vote");

    match (t.write, existing.as_ref()) {
        (LedgerWrite::Insert(vote_type), _) => {
            sqlx::query(
                "INSERT INTO votes (suggestion_id, user_id, vote_type) VALUES ($1, $2, $3)",
            )
            .bind(suggestion_id)
            .bind(user_id)
            .bind(vote_type.as_str())
            .execute(&mut *tx)
            .await?;
        }
        (LedgerWrite::Update(vote_type), Some(vote)) => {
            sqlx::query("UPDATE votes SET vote_type = $1 WHERE id = $2")
                .bind(vote_type.as_str())
                .bind(vote.id)
                .execute(&mut *tx)
                .await?;
        }
        (LedgerWrite::Delete, Some(vote)) => {
            sqlx::query("DELETE FROM votes WHERE id = $1")
                .bind(vote.id)
                .execute(&mut *tx)
                .await?;
        }
        (_, None) => {
            return Err(Error::Protocol(
                "vote transition expected an existing ledger entry".into(),
            ));
        }
    }

    let (upvotes, downvotes) = sqlx::query_as::<_, (i32, i32)>(
        r#"
        UPDATE suggestions
        SET upvotes = upvotes + $2, downvotes = downvotes + $3
        WHERE id = $1
        RETURNING upvotes, downvotes
        "#,
    )
    .bind(suggestion_id)
    .bind(t.upvotes_delta)
    .bind(t.downvotes_delta)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(VoteOutcome {
        counters: Counters { upvotes, downvotes },
        user_vote: t.next_state(),
    }))
}

/// Recomputes a suggestion's counters from the ledger.
pub async fn tally_votes(pool: &DbPool, suggestion_id: i32) -> Result<Counters, Error> {
    let (upvotes, downvotes) = sqlx::query_as::<_, (i32, i32)>(
        r#"
        SELECT
            (COUNT(*) FILTER (WHERE vote_type = 'up'))::INT,
            (COUNT(*) FILTER (WHERE vote_type = 'down'))::INT
        FROM votes
        WHERE suggestion_id = $1
        "#,
    )
    .bind(suggestion_id)
    .fetch_one(pool)
    .await?;

    Ok(Counters { upvotes, downvotes })
}

/// Rewrites every suggestion whose counters drifted from the ledger and
/// returns how many rows changed.
pub async fn reconcile_counters(pool: &DbPool) -> Result<u64, Error> {
    let result = sqlx::query(
        r#"
        UPDATE suggestions s
        SET upvotes = t.up, downvotes = t.down
        FROM (
            SELECT
                sg.id,
                (COUNT(v.id) FILTER (WHERE v.vote_type = 'up'))::INT AS up,
                (COUNT(v.id) FILTER (WHERE v.vote_type = 'down'))::INT AS down
            FROM suggestions sg
            LEFT JOIN votes v ON v.suggestion_id = sg.id
            GROUP BY sg.id
        ) t
        WHERE s.id = t.id AND (s.upvotes <> t.up OR s.downvotes <> t.down)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
