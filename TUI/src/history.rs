use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::solve::SolveResult;

/// One past query and the result it produced. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    id: Uuid,
    expression: String,
    result: SolveResult,
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn result(&self) -> &SolveResult {
        &self.result
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `Q: ... A: ...` line used for the solver's context window.
    pub fn context_line(&self) -> String {
        format!("Q: {} A: {}", self.expression, self.result.final_answer())
    }
}

/// Append-only log of the session's queries, in insertion order.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, expression: impl Into<String>, result: SolveResult) -> &HistoryEntry {
        let index = self.entries.len();
        self.entries.push(HistoryEntry {
            id: Uuid::new_v4(),
            expression: expression.into(),
            result,
            created_at: Utc::now(),
        });
        &self.entries[index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Chronological order, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most recent first, at most `limit` entries. Display only.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(limit)
    }

    /// Context string for the solver built from the last `window` entries,
    /// oldest first, joined with `"; "`.
    pub fn context(&self, window: usize) -> String {
        let start = self.entries.len().saturating_sub(window);
        self.entries[start..]
            .iter()
            .map(HistoryEntry::context_line)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::SolvePayload;

    fn answer(text: &str) -> SolveResult {
        SolveResult::math(SolvePayload {
            solution_markdown: format!("= {}", text),
            final_answer: text.to_string(),
            is_graphable: false,
            graph_data: None,
            benny_comment: String::new(),
        })
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = HistoryStore::new();
        store.append("1+1", answer("2"));
        store.append("2+2", answer("4"));

        let exprs: Vec<_> = store.iter().map(|e| e.expression()).collect();
        assert_eq!(exprs, vec!["1+1", "2+2"]);
    }

    #[test]
    fn test_recent_is_newest_first_and_truncated() {
        let mut store = HistoryStore::new();
        for i in 0..15 {
            store.append(format!("{}+0", i), answer(&i.to_string()));
        }

        let recent: Vec<_> = store.recent(10).map(|e| e.expression().to_string()).collect();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0], "14+0");
        assert_eq!(recent[9], "5+0");
        // Display truncation does not drop anything from the log
        assert_eq!(store.len(), 15);
    }

    #[test]
    fn test_context_uses_two_most_recent() {
        let mut store = HistoryStore::new();
        store.append("1+1", answer("2"));
        store.append("2+2", answer("4"));
        store.append("3+3", answer("6"));

        assert_eq!(store.context(2), "Q: 2+2 A: 4; Q: 3+3 A: 6");
    }

    #[test]
    fn test_context_never_exceeds_window() {
        let mut store = HistoryStore::new();
        assert_eq!(store.context(2), "");

        for i in 0..50 {
            store.append(format!("q{}", i), answer("a"));
            let pairs = store.context(2).matches("Q: ").count();
            assert!(pairs <= 2);
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let mut store = HistoryStore::new();
        let id = store.append("7*6", answer("42")).id();
        store.append("1+2", answer("3"));

        let entry = store.get(id).unwrap();
        assert_eq!(entry.expression(), "7*6");
        assert_eq!(entry.result().final_answer(), "42");
        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_earlier_results_unchanged_by_later_appends() {
        let mut store = HistoryStore::new();
        let first = store.append("1+1", answer("2")).clone();
        for i in 0..5 {
            store.append(format!("{}", i), SolveResult::fallback());
        }
        let stored = store.get(first.id()).unwrap();
        assert_eq!(stored.result(), first.result());
        assert_eq!(stored.created_at(), first.created_at());
    }
}
