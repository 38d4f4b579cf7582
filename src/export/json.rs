//! JSON import/export module for categories.
//! A category is written together with its cards; ids and timestamps are not exported,
//! importing always creates a fresh category.

use crate::database::{StoreError, db};
use crate::models::{Card, Category};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportedCard {
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryExport {
    pub name: String,
    pub cards: Vec<ExportedCard>,
}

impl CategoryExport {
    pub fn new(category: &Category, cards: &[Card]) -> Self {
        Self {
            name: category.name.clone(),
            cards: cards
                .iter()
                .filter(|card| card.category_id == category.id)
                .map(|card| ExportedCard {
                    question: card.question.clone(),
                    answer: card.answer.clone(),
                })
                .collect(),
        }
    }
}

/// Exports a category to a JSON file at the specified path.
pub fn export_category_to_path(export: &CategoryExport, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(export)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;

    info!(
        "Category '{}' exported to '{}' ({} cards)",
        export.name,
        path.display(),
        export.cards.len()
    );
    Ok(())
}

/// Reads a category from a JSON file.
pub fn import_category(path: &Path) -> Result<CategoryExport> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let export: CategoryExport = serde_json::from_str(&contents)?;
    Ok(export)
}

/// Creates the category and all of its cards, or nothing if any of them is rejected.
pub fn import_into_store(export: &CategoryExport, conn: &Connection) -> Result<Category> {
    let tx = conn.unchecked_transaction()?;

    let category = db::create_category(&export.name, &tx)?;
    for card in &export.cards {
        db::create_card(&category.id, &card.question, &card.answer, &tx)?;
    }
    tx.commit()?;

    info!(
        "Category '{}' imported with {} cards",
        category.name,
        export.cards.len()
    );
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_test_export() -> CategoryExport {
        CategoryExport {
            name: "Test Category".to_string(),
            cards: vec![
                ExportedCard {
                    question: "hello".to_string(),
                    answer: "tere".to_string(),
                },
                ExportedCard {
                    question: "goodbye".to_string(),
                    answer: "head aega".to_string(),
                },
            ],
        }
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_export_category_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let result = export_category_to_path(&create_test_export(), &path);
        assert!(result.is_ok());
        assert!(fs::metadata(&path).is_ok(), "File should exist");
    }

    #[test]
    fn test_import_category() {
        let json_content = r#"{
  "name": "Import Test Category",
  "cards": [
    {
      "question": "test question",
      "answer": "test answer"
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let export = import_category(&path).unwrap();
        assert_eq!(export.name, "Import Test Category");
        assert_eq!(export.cards.len(), 1);
        assert_eq!(export.cards[0].question, "test question");
        assert_eq!(export.cards[0].answer, "test answer");
    }

    #[test]
    fn test_export_from_store_and_reimport() {
        let conn = test_conn();
        let category = db::create_category("Geography", &conn).unwrap();
        let other = db::create_category("Math", &conn).unwrap();
        db::create_card(&category.id, "Capital of France?", "Paris", &conn).unwrap();
        db::create_card(&other.id, "2 + 2?", "4", &conn).unwrap();

        let cards = db::list_cards(None, &conn).unwrap();
        let export = CategoryExport::new(&category, &cards);
        assert_eq!(export.cards.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geography.json");
        export_category_to_path(&export, &path).unwrap();

        let imported = import_into_store(&import_category(&path).unwrap(), &conn).unwrap();
        assert_ne!(imported.id, category.id);
        assert_eq!(imported.name, "Geography");

        let imported_cards = db::list_cards(Some(&imported.id), &conn).unwrap();
        assert_eq!(imported_cards.len(), 1);
        assert_eq!(imported_cards[0].answer, "Paris");
    }

    #[test]
    fn test_import_rolls_back_on_invalid_card() {
        let conn = test_conn();
        let mut export = create_test_export();
        export.cards[1].answer = "  ".to_string();

        let result = import_into_store(&export, &conn);
        assert!(matches!(
            result,
            Err(ExportError::Store(StoreError::Validation(_)))
        ));
        assert!(db::list_categories(&conn).unwrap().is_empty());
        assert!(db::list_cards(None, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_category(Path::new("nonexistent_file_xyz123.json"));
        assert!(matches!(result, Err(ExportError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let result = import_category(&path);
        assert!(matches!(result, Err(ExportError::Json(_))));
    }
}
