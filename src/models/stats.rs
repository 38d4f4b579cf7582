//! Accuracy statistics computed from the attempt log.
//!
//! Everything here is a pure function over attempts already loaded from the store:
//! - Overall summary: totals and accuracy across every attempt
//! - Windows: "today" starts at local midnight, "last 7 days" is a rolling 7×24h span
//! - Hardest cards: per-card accuracy for cards with at least 3 attempts, weakest first
//!
//! Accuracy of an empty set is 0, never NaN.

use super::{Attempt, Card};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Cards with fewer attempts than this are left out of the hardest list.
pub const MIN_ATTEMPTS_FOR_RANKING: usize = 3;

/// Length of the hardest-cards list.
pub const HARDEST_LIMIT: usize = 5;

/// Label used when an attempt points at a card that no longer exists.
pub const MISSING_CARD_LABEL: &str = "(card text missing)";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub accuracy: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowStats {
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RecentStats {
    pub today: WindowStats,
    pub last_7_days: WindowStats,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HardCard {
    pub card_id: String,
    pub label: String,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Everything the statistics screen shows, computed for one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsReport {
    pub summary: Summary,
    pub recent: RecentStats,
    pub hardest: Vec<HardCard>,
}

impl StatsReport {
    pub fn build<Tz: TimeZone>(attempts: &[Attempt], cards: &[Card], now: &DateTime<Tz>) -> Self {
        Self {
            summary: summarize(attempts),
            recent: recent_stats(attempts, now),
            hardest: hardest_cards(attempts, cards),
        }
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Renders an accuracy as a whole percentage, e.g. `0.333` as `"33%"`.
pub fn format_percent(accuracy: f64) -> String {
    format!("{}%", (accuracy * 100.0).round() as i64)
}

pub fn summarize(attempts: &[Attempt]) -> Summary {
    let total = attempts.len();
    let correct = attempts.iter().filter(|a| a.is_correct).count();

    Summary {
        total,
        correct,
        wrong: total - correct,
        accuracy: ratio(correct, total),
    }
}

/// Start of the calendar day containing `now`, in `now`'s own time zone.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let tz = now.timezone();
    // Midnight may be skipped by a DST jump: the day starts at the first local minute that exists
    (0..=24 * 60)
        .map(|minute| midnight + Duration::minutes(minute))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

/// Accuracy for today and for the last 7×24 hours, in a single pass.
pub fn recent_stats<Tz: TimeZone>(attempts: &[Attempt], now: &DateTime<Tz>) -> RecentStats {
    let today_start = start_of_day(now);
    let week_start = now.with_timezone(&Utc) - Duration::days(7);

    let (mut today_attempts, mut today_correct) = (0, 0);
    let (mut week_attempts, mut week_correct) = (0, 0);

    for attempt in attempts {
        let hit = usize::from(attempt.is_correct);

        if attempt.answered_at >= today_start {
            today_attempts += 1;
            today_correct += hit;
        }
        if attempt.answered_at >= week_start {
            week_attempts += 1;
            week_correct += hit;
        }
    }

    RecentStats {
        today: WindowStats {
            attempts: today_attempts,
            correct: today_correct,
            accuracy: ratio(today_correct, today_attempts),
        },
        last_7_days: WindowStats {
            attempts: week_attempts,
            correct: week_correct,
            accuracy: ratio(week_correct, week_attempts),
        },
    }
}

/// Cards with the lowest accuracy, weakest first.
///
/// Groups keep the order in which their card first appears in `attempts`, and the
/// sort is stable, so equal accuracies stay in that order.
pub fn hardest_cards(attempts: &[Attempt], cards: &[Card]) -> Vec<HardCard> {
    let mut groups: IndexMap<&str, (usize, usize)> = IndexMap::new();
    for attempt in attempts {
        let (count, correct) = groups.entry(attempt.card_id.as_str()).or_insert((0, 0));
        *count += 1;
        *correct += usize::from(attempt.is_correct);
    }

    let questions: HashMap<&str, &str> = cards
        .iter()
        .map(|card| (card.id.as_str(), card.question.as_str()))
        .collect();

    let mut ranked: Vec<HardCard> = groups
        .into_iter()
        .filter(|(_, (count, _))| *count >= MIN_ATTEMPTS_FOR_RANKING)
        .map(|(card_id, (count, correct))| HardCard {
            card_id: card_id.to_string(),
            label: questions
                .get(card_id)
                .copied()
                .unwrap_or(MISSING_CARD_LABEL)
                .to_string(),
            attempts: count,
            correct,
            accuracy: ratio(correct, count),
        })
        .collect();

    ranked.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
    ranked.truncate(HARDEST_LIMIT);
    ranked
}
