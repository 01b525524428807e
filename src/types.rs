use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense fragment identifier, assigned in ingestion order.
pub type FragmentId = u32;

/// One indexable unit of documentation content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub location: String,
    pub page: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub category: Category,
}

impl Fragment {
    pub fn new(
        location: impl Into<String>,
        page: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            location: location.into(),
            page: page.into(),
            title: title.into(),
            text: text.into(),
            category,
        }
    }

    /// Returns the raw text of one searchable field.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Page => &self.page,
            Field::Text => &self.text,
        }
    }
}

/// Fragment category tag. Documentation builds emit `page` and `section`;
/// anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Page,
    Section,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Page => "page",
            Self::Section => "section",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "page" => Self::Page,
            "section" => Self::Section,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Searchable fields of a fragment, in posting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Title,
    Page,
    Text,
}

impl Field {
    pub const ALL: [Self; 3] = [Self::Title, Self::Page, Self::Text];

    pub const fn index(self) -> usize {
        match self {
            Self::Title => 0,
            Self::Page => 1,
            Self::Text => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Page => "page",
            Self::Text => "text",
        }
    }
}

/// A ranked result record handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: FragmentId,
    pub location: String,
    pub page: String,
    pub title: String,
    pub category: Category,
    pub snippet: String,
    pub score: f32,
}
