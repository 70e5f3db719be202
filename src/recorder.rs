use anyhow::Result;
use tracing::info;

use crate::store::{JsonStore, NewSubmission, Submission};

/// Text submissions must start with this glyph; photos qualify regardless.
pub const SUBMISSION_MARKER: &str = "🎄";

pub fn is_submission(text: &str, photo: Option<&str>) -> bool {
    photo.is_some() || text.starts_with(SUBMISSION_MARKER)
}

/// Store the message if it qualifies. Returns the new record, or `None` if it did not.
pub async fn record(
    store: &JsonStore,
    text: &str,
    photo: Option<&str>,
) -> Result<Option<Submission>> {
    if !is_submission(text, photo) {
        return Ok(None);
    }

    let submission = store
        .insert(NewSubmission {
            text: text.to_string(),
            photo: photo.map(str::to_string),
        })
        .await?;

    info!(
        id = submission.id,
        has_photo = submission.photo.is_some(),
        "New submission recorded"
    );
    Ok(Some(submission))
}
