use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterial {
    pub id: i64,
    pub topic: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn get_material(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
) -> Result<Option<StudyMaterial>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "study_material" WHERE "topic" = ? LIMIT 1"#)
        .bind(topic)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|r| map_material(&r)))
}

/// Uploading the same topic again replaces the content in place.
pub async fn upsert_material(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
    content: &str,
    now: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "study_material" ("topic", "content", "createdAt", "updatedAt")
        VALUES (?, ?, ?, ?)
        ON CONFLICT ("topic") DO UPDATE SET
            "content" = excluded."content",
            "updatedAt" = excluded."updatedAt"
        "#,
    )
    .bind(topic)
    .bind(content)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

fn map_material(row: &SqliteRow) -> StudyMaterial {
    StudyMaterial {
        id: row.get("id"),
        topic: row.get("topic"),
        content: row.get("content"),
        created_at: row.get("createdAt"),
        updated_at: row.get("updatedAt"),
    }
}
