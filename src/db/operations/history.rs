use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallRecord {
    pub id: i64,
    pub topic: String,
    pub recall_text: String,
    pub feedback: Value,
    pub score: i64,
    pub created_at: String,
}

/// Append-only: one row per evaluated recall, raw oracle payload kept
/// verbatim for audit. The 0..=100 score constraint is also enforced by
/// the table CHECK, so a bad value fails the write instead of being
/// clamped.
pub async fn insert_recall_record(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
    recall_text: &str,
    raw_feedback: &Value,
    score: i64,
    now: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "recall_history"
            ("topic", "recallText", "feedbackJson", "score", "createdAt")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(topic)
    .bind(recall_text)
    .bind(raw_feedback.to_string())
    .bind(score)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_recall_records(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
    limit: i64,
) -> Result<Vec<RecallRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "recall_history"
        WHERE "topic" = ?
        ORDER BY "createdAt" DESC, "id" DESC
        LIMIT ?
        "#,
    )
    .bind(topic)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(rows.iter().map(map_recall_record).collect())
}

pub async fn count_recall_records(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(r#"SELECT COUNT(*) AS "count" FROM "recall_history" WHERE "topic" = ?"#)
        .bind(topic)
        .fetch_one(executor)
        .await?;
    Ok(row.get("count"))
}

fn map_recall_record(row: &SqliteRow) -> RecallRecord {
    let feedback_json: String = row.get("feedbackJson");
    RecallRecord {
        id: row.get("id"),
        topic: row.get("topic"),
        recall_text: row.get("recallText"),
        feedback: serde_json::from_str(&feedback_json).unwrap_or(Value::Null),
        score: row.get("score"),
        created_at: row.get("createdAt"),
    }
}
