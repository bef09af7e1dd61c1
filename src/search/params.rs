use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of items requested per fetch. The volumes API caps maxResults at 40;
/// we request 30 and treat a short page as end-of-results.
pub const PAGE_SIZE: usize = 30;

/// Subject filter offered by the search UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Art,
    Biography,
    Computers,
    History,
    Medical,
    Poetry,
}

impl Category {
    pub const ALL_VALUES: [Category; 7] = [
        Category::All,
        Category::Art,
        Category::Biography,
        Category::Computers,
        Category::History,
        Category::Medical,
        Category::Poetry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Art => "art",
            Category::Biography => "biography",
            Category::Computers => "computers",
            Category::History => "history",
            Category::Medical => "medical",
            Category::Poetry => "poetry",
        }
    }

    /// Value for the provider's `subject` query parameter.
    /// Empty string when no category filter is applied.
    pub fn subject_param(&self) -> String {
        match self {
            Category::All => String::new(),
            other => format!("subject:{}", other.as_str()),
        }
    }

    /// Cycle to the next category (wraps around). Used by the TUI selector.
    pub fn next(&self) -> Category {
        let idx = Self::ALL_VALUES.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL_VALUES[(idx + 1) % Self::ALL_VALUES.len()]
    }

    /// Cycle to the previous category (wraps around).
    pub fn prev(&self) -> Category {
        let idx = Self::ALL_VALUES.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL_VALUES[(idx + Self::ALL_VALUES.len() - 1) % Self::ALL_VALUES.len()]
    }

    /// Parse a user-supplied category name (classic mode `\category` command).
    pub fn parse(s: &str) -> Option<Category> {
        Self::ALL_VALUES
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result ordering offered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Relevance,
    Newest,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::Newest => "newest",
        }
    }

    pub fn toggle(&self) -> SortMode {
        match self {
            SortMode::Relevance => SortMode::Newest,
            SortMode::Newest => SortMode::Relevance,
        }
    }

    pub fn parse(s: &str) -> Option<SortMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Some(SortMode::Relevance),
            "newest" => Some(SortMode::Newest),
            _ => None,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full set of query parameters owned by the search controller.
/// Any mutation of these invalidates the accumulated results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchParams {
    pub term: String,
    pub category: Category,
    pub sort: SortMode,
}

impl SearchParams {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }
}
