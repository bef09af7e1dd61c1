//! Persisted search-term history with fuzzy recall.

use anyhow::Result;
use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub term: String,
    pub timestamp: DateTime<Utc>,
    pub execution_count: u32,
    /// How many results the search accumulated, when known.
    #[serde(default)]
    pub result_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HistoryMatch {
    pub entry: HistoryEntry,
    pub score: i64,
    pub indices: Vec<usize>,
}

pub struct SearchHistory {
    entries: Vec<HistoryEntry>,
    history_file: PathBuf,
    matcher: SkimMatcherV2,
    term_counts: HashMap<String, u32>,
}

impl SearchHistory {
    pub fn new() -> Result<Self> {
        let history_file = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".book_search_history.json");
        Self::with_file(history_file)
    }

    pub fn with_file(history_file: PathBuf) -> Result<Self> {
        let mut history = Self {
            entries: Vec::new(),
            history_file,
            matcher: SkimMatcherV2::default(),
            term_counts: HashMap::new(),
        };
        history.load_from_file()?;
        Ok(history)
    }

    /// Record a submitted search. Empty terms and immediate repeats are
    /// skipped; repeats of older terms bump their execution count.
    pub fn add_entry(&mut self, term: String, result_count: Option<usize>) -> Result<()> {
        if term.trim().is_empty() {
            return Ok(());
        }
        if let Some(last) = self.entries.last_mut() {
            if last.term == term {
                last.result_count = result_count.or(last.result_count);
                return self.save_to_file();
            }
        }

        let count = self.term_counts.entry(term.clone()).or_insert(0);
        *count += 1;

        self.entries.push(HistoryEntry {
            execution_count: *count,
            term,
            timestamp: Utc::now(),
            result_count,
        });

        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(0..excess);
        }

        self.save_to_file()
    }

    /// Fuzzy search over past terms. An empty pattern returns recent entries.
    pub fn search(&self, pattern: &str) -> Vec<HistoryMatch> {
        if pattern.is_empty() {
            return self
                .entries
                .iter()
                .rev()
                .take(20)
                .map(|entry| HistoryMatch {
                    entry: entry.clone(),
                    score: 0,
                    indices: Vec::new(),
                })
                .collect();
        }

        let mut matches: Vec<HistoryMatch> = self
            .entries
            .iter()
            .filter_map(|entry| {
                self.matcher
                    .fuzzy_indices(&entry.term, pattern)
                    .map(|(score, indices)| HistoryMatch {
                        entry: entry.clone(),
                        score,
                        indices,
                    })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.entry.execution_count.cmp(&a.entry.execution_count))
                .then(b.entry.timestamp.cmp(&a.entry.timestamp))
        });
        matches.truncate(20);
        matches
    }

    /// Entry at `offset` steps back from the newest, for Up/Down recall.
    pub fn recall(&self, offset: usize) -> Option<&HistoryEntry> {
        self.entries.iter().rev().nth(offset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load_from_file(&mut self) -> Result<()> {
        if !self.history_file.exists() {
            return Ok(());
        }
        let contents = fs::read_to_string(&self.history_file)?;
        if contents.trim().is_empty() {
            return Ok(());
        }
        self.entries = serde_json::from_str(&contents).unwrap_or_default();
        for entry in &self.entries {
            let count = self.term_counts.entry(entry.term.clone()).or_insert(0);
            *count = (*count).max(entry.execution_count);
        }
        Ok(())
    }

    fn save_to_file(&self) -> Result<()> {
        if let Some(parent) = self.history_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.history_file, contents)?;
        Ok(())
    }
}
