//! Database operations for the flashcards application
//!
//! Handles SQLite initialization and the reads/writes behind every screen:
//! categories, cards and the append-only attempt log. Rows are mapped into typed
//! entities here; a row that does not fit (e.g. an unparseable timestamp) is an error.

use super::{Result, StoreError};
use crate::models::category::sort_by_name;
use crate::models::{Attempt, Card, Category};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use log::debug;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use uuid::Uuid;

/// Opens (or creates) the database file and makes sure the tables exist
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    debug!("Opened database at {}", path.display());
    Ok(conn)
}

/// Creates tables for categories, cards, attempts and app state flags.
///
/// Attempts reference cards without a foreign key: deleting a card keeps its history.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            category_id TEXT NOT NULL,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS attempts (
            id TEXT PRIMARY KEY,
            card_id TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            answered_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cards_category ON cards(category_id);",
    )?;
    Ok(())
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_timestamp(row, 2)?,
    })
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        category_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
    })
}

fn attempt_from_row(row: &Row) -> rusqlite::Result<Attempt> {
    Ok(Attempt {
        id: row.get(0)?,
        card_id: row.get(1)?,
        is_correct: row.get(2)?,
        answered_at: parse_timestamp(row, 3)?,
    })
}

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(StoreError::Validation(field))
    } else {
        Ok(())
    }
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Retrieves all categories, alphabetically
///
/// Sorted with `sort_by_name` rather than in SQL: SQLite's NOCASE only folds ASCII.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name, created_at FROM categories ORDER BY rowid ASC")?;
    let mut categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    sort_by_name(&mut categories);
    Ok(categories)
}

pub fn get_category(id: &str, conn: &Connection) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name, created_at FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

pub fn create_category(name: &str, conn: &Connection) -> Result<Category> {
    require(name, "category name")?;

    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![category.id, category.name, format_timestamp(category.created_at)],
    )?;

    debug!("Category '{}' created ({})", category.name, category.id);
    Ok(category)
}

pub fn rename_category(id: &str, name: &str, conn: &Connection) -> Result<Category> {
    require(name, "category name")?;

    let changed = conn.execute(
        "UPDATE categories SET name = ?1 WHERE id = ?2",
        params![name.trim(), id],
    )?;
    if changed == 0 {
        return Err(not_found("category", id));
    }

    debug!("Category {} renamed to '{}'", id, name.trim());
    get_category(id, conn)?.ok_or_else(|| not_found("category", id))
}

/// Deletes a category together with its cards. Attempts on those cards are kept.
pub fn delete_category(id: &str, conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let cards_removed = tx.execute("DELETE FROM cards WHERE category_id = ?1", params![id])?;
    let changed = tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    if changed == 0 {
        // dropping tx rolls back
        return Err(not_found("category", id));
    }
    tx.commit()?;

    debug!("Category {} deleted with {} cards", id, cards_removed);
    Ok(())
}

/// Retrieves cards, oldest first, optionally only those of one category
pub fn list_cards(category_id: Option<&str>, conn: &Connection) -> Result<Vec<Card>> {
    let cards = match category_id {
        Some(category_id) => {
            let mut stmt = conn.prepare(
                "SELECT id, category_id, question, answer, created_at FROM cards
                 WHERE category_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let cards = stmt
                .query_map(params![category_id], card_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            cards
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, category_id, question, answer, created_at FROM cards
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let cards = stmt
                .query_map([], card_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            cards
        }
    };
    Ok(cards)
}

pub fn get_card(id: &str, conn: &Connection) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            "SELECT id, category_id, question, answer, created_at FROM cards WHERE id = ?1",
            params![id],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

pub fn create_card(
    category_id: &str,
    question: &str,
    answer: &str,
    conn: &Connection,
) -> Result<Card> {
    require(question, "question")?;
    require(answer, "answer")?;
    if get_category(category_id, conn)?.is_none() {
        return Err(not_found("category", category_id));
    }

    let card = Card {
        id: Uuid::new_v4().to_string(),
        category_id: category_id.to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO cards (id, category_id, question, answer, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            card.id,
            card.category_id,
            card.question,
            card.answer,
            format_timestamp(card.created_at)
        ],
    )?;

    debug!("Card {} added to category {}", card.id, card.category_id);
    Ok(card)
}

pub fn update_card(id: &str, question: &str, answer: &str, conn: &Connection) -> Result<Card> {
    require(question, "question")?;
    require(answer, "answer")?;

    let changed = conn.execute(
        "UPDATE cards SET question = ?1, answer = ?2 WHERE id = ?3",
        params![question, answer, id],
    )?;
    if changed == 0 {
        return Err(not_found("card", id));
    }

    debug!("Card {} updated", id);
    get_card(id, conn)?.ok_or_else(|| not_found("card", id))
}

/// Deletes a card. Its attempts stay in the log.
pub fn delete_card(id: &str, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("card", id));
    }
    debug!("Card {} deleted", id);
    Ok(())
}

/// Retrieves the whole attempt log, newest first
pub fn list_attempts(conn: &Connection) -> Result<Vec<Attempt>> {
    let mut stmt = conn.prepare(
        "SELECT id, card_id, is_correct, answered_at FROM attempts
         ORDER BY answered_at DESC, rowid DESC",
    )?;
    let attempts = stmt
        .query_map([], attempt_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(attempts)
}

/// Appends one quiz answer to the attempt log
pub fn record_attempt(card_id: &str, is_correct: bool, conn: &Connection) -> Result<Attempt> {
    if get_card(card_id, conn)?.is_none() {
        return Err(not_found("card", card_id));
    }

    let attempt = Attempt {
        id: Uuid::new_v4().to_string(),
        card_id: card_id.to_string(),
        is_correct,
        answered_at: now(),
    };
    conn.execute(
        "INSERT INTO attempts (id, card_id, is_correct, answered_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            attempt.id,
            attempt.card_id,
            attempt.is_correct,
            format_timestamp(attempt.answered_at)
        ],
    )?;

    debug!("Attempt on card {} recorded (correct: {})", card_id, is_correct);
    Ok(attempt)
}

const SAMPLE_DATA_KEY: &str = "sample_data_seeded";

/// Fills a fresh database with a starter category so the app has something to show
///
/// Runs at most once per database: the flag in `app_state` stays after the user
/// deletes every category, so the sample does not come back.
pub fn seed_sample_data(conn: &Connection) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;

    let already_seeded = tx
        .query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![SAMPLE_DATA_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .is_some();
    let has_categories = !list_categories(&tx)?.is_empty();

    let seeded = !already_seeded && !has_categories;
    if seeded {
        let category = create_category("Capitals", &tx)?;
        create_card(&category.id, "Capital of France?", "Paris", &tx)?;
        create_card(&category.id, "Capital of Estonia?", "Tallinn", &tx)?;
        create_card(&category.id, "Capital of Japan?", "Tokyo", &tx)?;
    }

    tx.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES (?1, ?2)",
        params![SAMPLE_DATA_KEY, format_timestamp(now())],
    )?;
    tx.commit()?;
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.sqlite3");

        let conn = init_database(&path).unwrap();
        create_category("Persisted", &conn).unwrap();
        drop(conn);

        let conn = init_database(&path).unwrap();
        let categories = list_categories(&conn).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Persisted");
    }

    #[test]
    fn test_categories_sorted_by_name() {
        let conn = test_conn();
        create_category("zoology", &conn).unwrap();
        create_category("Astronomy", &conn).unwrap();
        create_category("chemistry", &conn).unwrap();

        let names: Vec<_> = list_categories(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Astronomy", "chemistry", "zoology"]);
    }

    #[test]
    fn test_store_order_matches_sort_by_name() {
        let conn = test_conn();
        for name in ["Öö", "õun", "Zebra", "äädikas", "apple"] {
            create_category(name, &conn).unwrap();
        }

        let listed = list_categories(&conn).unwrap();
        let mut resorted = listed.clone();
        sort_by_name(&mut resorted);
        assert_eq!(listed, resorted);

        let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "Zebra", "äädikas", "õun", "Öö"]);
    }

    #[test]
    fn test_blank_category_name_rejected() {
        let conn = test_conn();
        let result = create_category("   ", &conn);
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(list_categories(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_rename_category() {
        let conn = test_conn();
        let category = create_category("Geografy", &conn).unwrap();

        let renamed = rename_category(&category.id, "Geography", &conn).unwrap();
        assert_eq!(renamed.id, category.id);
        assert_eq!(renamed.name, "Geography");
        assert_eq!(renamed.created_at, category.created_at);

        let missing = rename_category("nope", "x", &conn);
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_cards_filtered_and_ordered() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();
        let math = create_category("Math", &conn).unwrap();

        create_card(&geo.id, "Capital of France?", "Paris", &conn).unwrap();
        create_card(&math.id, "2 + 2?", "4", &conn).unwrap();
        create_card(&geo.id, "Capital of Italy?", "Rome", &conn).unwrap();

        let geo_cards = list_cards(Some(&geo.id), &conn).unwrap();
        let questions: Vec<_> = geo_cards.iter().map(|c| c.question.as_str()).collect();
        assert_eq!(questions, vec!["Capital of France?", "Capital of Italy?"]);

        assert_eq!(list_cards(None, &conn).unwrap().len(), 3);
    }

    #[test]
    fn test_create_card_requires_category_and_text() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();

        assert!(matches!(
            create_card("missing", "q", "a", &conn),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            create_card(&geo.id, "q", " ", &conn),
            Err(StoreError::Validation("answer"))
        ));
    }

    #[test]
    fn test_update_card() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();
        let card = create_card(&geo.id, "Capital of Frnace?", "paris", &conn).unwrap();

        let updated = update_card(&card.id, "Capital of France?", "Paris", &conn).unwrap();
        assert_eq!(updated.question, "Capital of France?");
        assert_eq!(updated.answer, "Paris");
        assert_eq!(updated.category_id, geo.id);

        assert!(matches!(
            update_card("gone", "q", "a", &conn),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_card_keeps_attempts() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();
        let card = create_card(&geo.id, "Capital of France?", "Paris", &conn).unwrap();
        record_attempt(&card.id, true, &conn).unwrap();

        delete_card(&card.id, &conn).unwrap();

        assert!(get_card(&card.id, &conn).unwrap().is_none());
        assert_eq!(list_attempts(&conn).unwrap().len(), 1);
        assert!(delete_card(&card.id, &conn).is_err());
    }

    #[test]
    fn test_delete_category_removes_its_cards() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();
        let math = create_category("Math", &conn).unwrap();
        let card = create_card(&geo.id, "Capital of France?", "Paris", &conn).unwrap();
        create_card(&math.id, "2 + 2?", "4", &conn).unwrap();
        record_attempt(&card.id, false, &conn).unwrap();

        delete_category(&geo.id, &conn).unwrap();

        let categories = list_categories(&conn).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, math.id);
        assert!(list_cards(Some(&geo.id), &conn).unwrap().is_empty());
        assert_eq!(list_cards(None, &conn).unwrap().len(), 1);
        assert_eq!(list_attempts(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_category_changes_nothing() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();
        create_card(&geo.id, "Capital of France?", "Paris", &conn).unwrap();

        assert!(matches!(
            delete_category("missing", &conn),
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(list_cards(None, &conn).unwrap().len(), 1);
    }

    #[test]
    fn test_record_attempt() {
        let conn = test_conn();
        let geo = create_category("Geography", &conn).unwrap();
        let card = create_card(&geo.id, "Capital of France?", "Paris", &conn).unwrap();

        let first = record_attempt(&card.id, true, &conn).unwrap();
        let second = record_attempt(&card.id, false, &conn).unwrap();
        assert_ne!(first.id, second.id);

        let attempts = list_attempts(&conn).unwrap();
        assert_eq!(attempts.len(), 2);
        // newest first
        assert_eq!(attempts[0].id, second.id);
        assert!(!attempts[0].is_correct);
        assert_eq!(attempts[1], first);

        assert!(matches!(
            record_attempt("missing", true, &conn),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let conn = test_conn();
        conn.execute(
            "INSERT INTO attempts (id, card_id, is_correct, answered_at)
             VALUES ('a1', 'c1', 1, 'yesterday-ish')",
            [],
        )
        .unwrap();

        assert!(matches!(
            list_attempts(&conn),
            Err(StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(3, _, _)))
        ));
    }

    #[test]
    fn test_seed_sample_data_only_once() {
        let conn = test_conn();
        assert!(seed_sample_data(&conn).unwrap());
        assert!(!seed_sample_data(&conn).unwrap());

        assert_eq!(list_categories(&conn).unwrap().len(), 1);
        assert_eq!(list_cards(None, &conn).unwrap().len(), 3);
    }

    #[test]
    fn test_sample_data_not_restored_after_user_deletes_everything() {
        let conn = test_conn();
        assert!(seed_sample_data(&conn).unwrap());

        for category in list_categories(&conn).unwrap() {
            delete_category(&category.id, &conn).unwrap();
        }

        assert!(!seed_sample_data(&conn).unwrap());
        assert!(list_categories(&conn).unwrap().is_empty());
        assert!(list_cards(None, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_existing_data_is_never_seeded() {
        let conn = test_conn();
        create_category("Mine", &conn).unwrap();

        assert!(!seed_sample_data(&conn).unwrap());

        // the flag is set too, so emptying the database later keeps it empty
        let mine = list_categories(&conn).unwrap();
        delete_category(&mine[0].id, &conn).unwrap();
        assert!(!seed_sample_data(&conn).unwrap());
        assert!(list_categories(&conn).unwrap().is_empty());
    }
}
