//! The fixed set of spending and income categories.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize};

/// What a transaction was for.
///
/// Unknown or missing categories are read as [Category::Other] so that data
/// written by older versions, or edited by hand, still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Groceries, restaurants and takeaways.
    Food,
    /// Fuel, fares and vehicle costs.
    Transport,
    /// Rent, mortgage, utilities and repairs.
    Housing,
    /// Doctors, pharmacy and insurance.
    Health,
    /// Courses, books and school fees.
    Education,
    /// Entertainment, hobbies and holidays.
    Leisure,
    /// Salary, wages and work expenses.
    Work,
    /// Anything else.
    #[default]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Health,
        Category::Education,
        Category::Leisure,
        Category::Work,
        Category::Other,
    ];

    /// The value used in forms, query strings and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Health => "health",
            Category::Education => "education",
            Category::Leisure => "leisure",
            Category::Work => "work",
            Category::Other => "other",
        }
    }

    /// The human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Housing => "Housing",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Leisure => "Leisure",
            Category::Work => "Work",
            Category::Other => "Other",
        }
    }

    /// An emoji shown next to the description in the list.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Food => "🍽️",
            Category::Transport => "🚗",
            Category::Housing => "🏠",
            Category::Health => "🏥",
            Category::Education => "📚",
            Category::Leisure => "🎮",
            Category::Work => "💼",
            Category::Other => "📦",
        }
    }

    /// Read a category from its stored value, falling back to [Category::Other].
    pub fn parse_lossy(value: &str) -> Self {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .unwrap_or_default()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::parse_lossy(&raw))
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Category::parse_lossy)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::Category;

    #[test]
    fn unknown_category_falls_back_to_other() {
        assert_eq!(Category::parse_lossy("groceries"), Category::Other);
        assert_eq!(Category::parse_lossy(""), Category::Other);

        let category: Category = serde_json::from_str("\"gadgets\"").unwrap();
        assert_eq!(category, Category::Other);
    }

    #[test]
    fn missing_category_defaults_to_other() {
        #[derive(Deserialize)]
        struct Record {
            #[serde(default)]
            category: Category,
        }

        let record: Record = serde_json::from_str("{}").unwrap();

        assert_eq!(record.category, Category::Other);
    }

    #[test]
    fn parses_every_category_from_its_own_value() {
        for category in Category::ALL {
            assert_eq!(Category::parse_lossy(category.as_str()), category);
        }
    }

    #[test]
    fn serializes_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&Category::Transport).unwrap(),
            "\"transport\""
        );
    }
}
