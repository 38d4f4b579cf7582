//! Attempt is one immutable quiz answer and whether it was correct.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub card_id: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}
