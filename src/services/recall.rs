use std::collections::HashSet;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use thiserror::Error;
use tracing::{debug, info};

use crate::db::operations::{self as ops, RecallRecord, TopicSchedule};
use crate::db::{self, Database};
use crate::services::cards::{card_fingerprint, chunk_material};
use crate::services::oracle::{OracleError, RecallAssessment, ScoringOracle};
use crate::services::scheduler::next_interval;

#[derive(Debug, Error)]
pub enum RecallError {
    #[error("no study material for topic")]
    TopicNotFound,
    #[error("scoring failed: {0}")]
    ScoringFailed(#[source] OracleError),
    #[error("invalid oracle response: {0}")]
    InvalidOracleResponse(#[source] OracleError),
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutcome {
    pub feedback: String,
    pub score: i64,
    pub cards_added: i64,
    pub next_review: String,
}

/// Reproducible scoring prompt: both full texts under labeled markers,
/// plus the output contract the validator expects.
pub fn build_scoring_prompt(material: &str, recall_text: &str) -> String {
    format!(
        "You grade a free-recall attempt against source material.\n\
         Respond with strict JSON only: {{\"score\": <integer 0-100>, \
         \"feedback\": <string>, \"flashcards\": [{{\"front\": <string>, \
         \"back\": <string>}}]}}\n\n\
         === SOURCE MATERIAL ===\n{material}\n\n\
         === RECALL ATTEMPT ===\n{recall_text}\n"
    )
}

/// The recall-evaluation pipeline. Validation happens before any
/// persistence; all writes for one call share a single transaction and
/// a single timestamp.
pub async fn evaluate_recall(
    db: &Database,
    oracle: &ScoringOracle,
    topic: &str,
    recall_text: &str,
) -> Result<EvaluationOutcome, RecallError> {
    let material = ops::get_material(db.pool(), topic)
        .await?
        .ok_or(RecallError::TopicNotFound)?;

    let prompt = build_scoring_prompt(&material.content, recall_text);
    let assessment = oracle.score(&prompt).await.map_err(|err| {
        if err.is_invalid_response() {
            RecallError::InvalidOracleResponse(err)
        } else {
            RecallError::ScoringFailed(err)
        }
    })?;

    let outcome = persist_evaluation(db, topic, recall_text, &assessment).await?;
    info!(
        topic,
        score = outcome.score,
        cards_added = outcome.cards_added,
        "recall evaluated"
    );
    Ok(outcome)
}

async fn persist_evaluation(
    db: &Database,
    topic: &str,
    recall_text: &str,
    assessment: &RecallAssessment,
) -> Result<EvaluationOutcome, RecallError> {
    // One timestamp for every write in this call.
    let now = Utc::now();
    let now_iso = db::to_iso(now);

    let mut tx = db.pool().begin().await?;

    ops::insert_recall_record(
        &mut *tx,
        topic,
        recall_text,
        &assessment.raw,
        assessment.score,
        &now_iso,
    )
    .await?;

    let prior = ops::get_schedule(&mut *tx, topic).await?;
    let previous_days = prior.as_ref().map(|s| s.interval_days).unwrap_or(1);
    let easiness = prior
        .as_ref()
        .map(|s| s.easiness)
        .unwrap_or(ops::DEFAULT_EASINESS);

    let interval_days = next_interval(previous_days, assessment.score);
    let next_review = db::to_iso(now + Duration::days(interval_days));
    let schedule = TopicSchedule {
        topic: topic.to_string(),
        interval_days,
        next_review: next_review.clone(),
        last_review: Some(now_iso.clone()),
        easiness,
    };
    upsert_schedule_with_retry(&mut tx, &schedule).await?;

    let mut cards_added = 0i64;
    let mut seen = HashSet::new();
    for card in &assessment.flashcards {
        let fingerprint = card_fingerprint(&card.front, &card.back);
        // Duplicates within one oracle response collapse to one insert.
        if !seen.insert(fingerprint.clone()) {
            continue;
        }
        if ops::fingerprint_exists(&mut *tx, &fingerprint).await? {
            continue;
        }
        match ops::insert_flashcard(&mut *tx, topic, &card.front, &card.back, &fingerprint, &now_iso)
            .await
        {
            Ok(()) => cards_added += 1,
            // A concurrent writer got there first: already known, skip.
            Err(err) if db::is_unique_violation(&err) => {}
            Err(err) => return Err(err.into()),
        }
    }

    tx.commit().await?;

    Ok(EvaluationOutcome {
        feedback: assessment.feedback.clone(),
        score: assessment.score,
        cards_added,
        next_review,
    })
}

async fn upsert_schedule(
    tx: &mut Transaction<'_, Sqlite>,
    schedule: &TopicSchedule,
) -> Result<(), sqlx::Error> {
    if ops::update_schedule(&mut **tx, schedule).await? > 0 {
        return Ok(());
    }
    ops::insert_schedule(&mut **tx, schedule).await
}

/// Losing an insert race against a concurrent evaluation gets one
/// retry, which lands on the update path; a second failure is terminal.
async fn upsert_schedule_with_retry(
    tx: &mut Transaction<'_, Sqlite>,
    schedule: &TopicSchedule,
) -> Result<(), RecallError> {
    match upsert_schedule(tx, schedule).await {
        Ok(()) => Ok(()),
        Err(err) if db::is_unique_violation(&err) => upsert_schedule(tx, schedule)
            .await
            .map_err(RecallError::PersistenceFailed),
        Err(err) => Err(RecallError::PersistenceFailed(err)),
    }
}

/// Upload boundary: material upsert plus a day-one schedule if the
/// topic has never been scheduled, committed together.
pub async fn upload_material(
    db: &Database,
    topic: &str,
    content: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let now_iso = db::to_iso(now);
    let first_review = db::to_iso(now + Duration::days(1));

    let mut tx = db.pool().begin().await?;
    ops::upsert_material(&mut *tx, topic, content, &now_iso).await?;
    ops::ensure_schedule(&mut *tx, topic, &first_review).await?;
    tx.commit().await?;

    debug!(
        topic,
        chunks = chunk_material(content).len(),
        "material uploaded"
    );
    Ok(())
}

pub async fn due_topics(db: &Database) -> Result<Vec<String>, sqlx::Error> {
    ops::list_due_topics(db.pool(), &db::now_iso()).await
}

pub async fn topic_history(
    db: &Database,
    topic: &str,
    limit: i64,
) -> Result<Vec<RecallRecord>, sqlx::Error> {
    ops::list_recall_records(db.pool(), topic, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_both_texts() {
        let prompt = build_scoring_prompt("the material body", "the recall body");
        assert!(prompt.contains("the material body"));
        assert!(prompt.contains("the recall body"));
        assert!(prompt.contains("SOURCE MATERIAL"));
        assert!(prompt.contains("RECALL ATTEMPT"));
    }

    #[test]
    fn test_prompt_reproducible() {
        assert_eq!(
            build_scoring_prompt("m", "r"),
            build_scoring_prompt("m", "r")
        );
    }
}
