//! Card is a pair <question, answer> belonging to one category
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub category_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Trimmed, case-folded equality against the stored answer.
    pub fn accepts(&self, given: &str) -> bool {
        normalize_answer(given) == normalize_answer(&self.answer)
    }
}

fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}
