use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

pub const DEFAULT_EASINESS: f64 = 2.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSchedule {
    pub topic: String,
    pub interval_days: i64,
    pub next_review: String,
    pub last_review: Option<String>,
    pub easiness: f64,
}

impl TopicSchedule {
    /// Schedule synthesized for a topic that has never been reviewed.
    pub fn initial(topic: &str, next_review: String) -> Self {
        Self {
            topic: topic.to_string(),
            interval_days: 1,
            next_review,
            last_review: None,
            easiness: DEFAULT_EASINESS,
        }
    }
}

pub async fn get_schedule(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
) -> Result<Option<TopicSchedule>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "topic_schedule" WHERE "topic" = ? LIMIT 1"#)
        .bind(topic)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|r| map_schedule(&r)))
}

pub async fn insert_schedule(
    executor: impl SqliteExecutor<'_>,
    schedule: &TopicSchedule,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "topic_schedule"
            ("topic", "intervalDays", "nextReview", "lastReview", "easiness")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&schedule.topic)
    .bind(schedule.interval_days)
    .bind(&schedule.next_review)
    .bind(&schedule.last_review)
    .bind(schedule.easiness)
    .execute(executor)
    .await?;
    Ok(())
}

/// Returns the number of rows updated; zero means the row vanished or
/// never existed and the caller should fall back to an insert.
pub async fn update_schedule(
    executor: impl SqliteExecutor<'_>,
    schedule: &TopicSchedule,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE "topic_schedule"
        SET "intervalDays" = ?, "nextReview" = ?, "lastReview" = ?, "easiness" = ?
        WHERE "topic" = ?
        "#,
    )
    .bind(schedule.interval_days)
    .bind(&schedule.next_review)
    .bind(&schedule.last_review)
    .bind(schedule.easiness)
    .bind(&schedule.topic)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Used by upload: create the day-one schedule unless the topic already
/// has one.
pub async fn ensure_schedule(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
    next_review: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "topic_schedule" ("topic", "intervalDays", "nextReview", "easiness")
        VALUES (?, 1, ?, ?)
        ON CONFLICT ("topic") DO NOTHING
        "#,
    )
    .bind(topic)
    .bind(next_review)
    .bind(DEFAULT_EASINESS)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_due_topics(
    executor: impl SqliteExecutor<'_>,
    now: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "topic" FROM "topic_schedule"
        WHERE "nextReview" <= ?
        ORDER BY "nextReview" ASC
        "#,
    )
    .bind(now)
    .fetch_all(executor)
    .await?;
    Ok(rows.iter().map(|r| r.get("topic")).collect())
}

fn map_schedule(row: &SqliteRow) -> TopicSchedule {
    TopicSchedule {
        topic: row.get("topic"),
        interval_days: row.get("intervalDays"),
        next_review: row.get("nextReview"),
        last_review: row.get("lastReview"),
        easiness: row.get("easiness"),
    }
}
