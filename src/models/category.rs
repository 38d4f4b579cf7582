//! Category is a named group of cards
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Sorts categories alphabetically by name, the order every list shows them in.
pub fn sort_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let mut categories = vec![
            category("1", "spanish"),
            category("2", "Geography"),
            category("3", "biology"),
        ];

        sort_by_name(&mut categories);

        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["biology", "Geography", "spanish"]);
    }
}
