use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: i64,
    pub topic: String,
    pub front: String,
    pub back: String,
    pub fingerprint: String,
    pub added_to_external_deck: bool,
    pub external_note_id: Option<i64>,
    pub created_at: String,
}

pub async fn fingerprint_exists(
    executor: impl SqliteExecutor<'_>,
    fingerprint: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(r#"SELECT 1 FROM "flashcard" WHERE "fingerprint" = ? LIMIT 1"#)
        .bind(fingerprint)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

pub async fn insert_flashcard(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
    front: &str,
    back: &str,
    fingerprint: &str,
    now: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "flashcard" ("topic", "front", "back", "fingerprint", "createdAt")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(topic)
    .bind(front)
    .bind(back)
    .bind(fingerprint)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_flashcards(
    executor: impl SqliteExecutor<'_>,
    topic: &str,
) -> Result<Vec<Flashcard>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "flashcard" WHERE "topic" = ? ORDER BY "createdAt" ASC, "id" ASC"#,
    )
    .bind(topic)
    .fetch_all(executor)
    .await?;
    Ok(rows.iter().map(map_flashcard).collect())
}

fn map_flashcard(row: &SqliteRow) -> Flashcard {
    Flashcard {
        id: row.get("id"),
        topic: row.get("topic"),
        front: row.get("front"),
        back: row.get("back"),
        fingerprint: row.get("fingerprint"),
        added_to_external_deck: row.get::<i64, _>("addedToExternalDeck") != 0,
        external_note_id: row.get("externalNoteId"),
        created_at: row.get("createdAt"),
    }
}
