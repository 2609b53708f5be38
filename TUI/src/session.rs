//! Session state owned by the top-level controller.
//!
//! Holds the history log, the active result, the expression being composed,
//! the navigation mode and the dispatch phase. The phase is a two-state
//! machine: a submission is only accepted while idle, and a completion is
//! only applied when its ticket matches the one in flight.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::assembler::Expression;
use crate::dispatcher::{DispatchOutcome, DispatchRequest};
use crate::history::{HistoryEntry, HistoryStore};
use crate::solve::SolveResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    General,
    Solver,
    Graphing,
    Statistics,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::General, Mode::Solver, Mode::Graphing, Mode::Statistics];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::General => "General Calculator",
            Mode::Solver => "AI Solver & Word Problems",
            Mode::Graphing => "Graphing Tools",
            Mode::Statistics => "Statistics & Probability",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Mode::General => "GENERAL",
            Mode::Solver => "SOLVER",
            Mode::Graphing => "GRAPHING",
            Mode::Statistics => "STATISTICS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchPhase {
    Idle,
    Processing {
        ticket: u64,
        expression: String,
        started_at: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("nothing to solve")]
    Blank,
    #[error("still solving `{0}`")]
    Busy(String),
}

pub struct Session {
    pub expression: Expression,
    pub mode: Mode,
    history: HistoryStore,
    current: Option<Uuid>,
    phase: DispatchPhase,
    next_ticket: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            expression: Expression::new(),
            mode: Mode::default(),
            history: HistoryStore::new(),
            current: None,
            phase: DispatchPhase::Idle,
            next_ticket: 1,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn phase(&self) -> &DispatchPhase {
        &self.phase
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.phase, DispatchPhase::Processing { .. })
    }

    /// Expression snapshot of the request in flight
    pub fn pending_expression(&self) -> Option<&str> {
        match &self.phase {
            DispatchPhase::Processing { expression, .. } => Some(expression),
            DispatchPhase::Idle => None,
        }
    }

    pub fn current_entry(&self) -> Option<&HistoryEntry> {
        self.current.and_then(|id| self.history.get(id))
    }

    pub fn current_result(&self) -> Option<&SolveResult> {
        self.current_entry().map(HistoryEntry::result)
    }

    /// Move to `Processing` and describe the request to send.
    pub fn begin_dispatch(&mut self, context_window: usize) -> Result<DispatchRequest, SubmitError> {
        if let DispatchPhase::Processing { expression, .. } = &self.phase {
            tracing::debug!(pending = %expression, "submission ignored while processing");
            return Err(SubmitError::Busy(expression.clone()));
        }
        if self.expression.is_blank() {
            return Err(SubmitError::Blank);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let expression = self.expression.as_str().to_string();
        self.phase = DispatchPhase::Processing {
            ticket,
            expression: expression.clone(),
            started_at: Utc::now(),
        };

        Ok(DispatchRequest {
            ticket,
            expression,
            context: self.history.context(context_window),
        })
    }

    /// Record the outcome of the request in flight. Outcomes for any other
    /// ticket are dropped.
    pub fn complete_dispatch(&mut self, outcome: DispatchOutcome) -> Option<&HistoryEntry> {
        let expression = match &self.phase {
            DispatchPhase::Processing { ticket, expression, .. } if *ticket == outcome.ticket => {
                expression.clone()
            }
            _ => {
                tracing::debug!(ticket = outcome.ticket, "discarding stale dispatch outcome");
                return None;
            }
        };

        self.phase = DispatchPhase::Idle;
        self.expression.clear();

        let entry = self.history.append(expression, outcome.result);
        self.current = Some(entry.id());
        Some(entry)
    }

    /// Copy a past entry's expression into the assembler. No request is made.
    pub fn replay(&mut self, id: Uuid) -> bool {
        match self.history.get(id) {
            Some(entry) => {
                let text = entry.expression().to_string();
                self.expression.replace(&text);
                true
            }
            None => false,
        }
    }

    /// Re-display a past entry's stored result. No request is made.
    pub fn show(&mut self, id: Uuid) -> bool {
        if self.history.get(id).is_some() {
            self.current = Some(id);
            true
        } else {
            false
        }
    }

    /// Start over: empty history, no active result, idle. Tickets keep
    /// counting so an outcome from before the reset can never match.
    pub fn reset(&mut self) {
        self.expression.clear();
        self.history = HistoryStore::new();
        self.current = None;
        self.phase = DispatchPhase::Idle;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::answer;
    use crate::solve::ResultKind;

    fn submit(session: &mut Session, text: &str, final_answer: &str) -> Uuid {
        session.expression.replace(text);
        let request = session.begin_dispatch(2).unwrap();
        session
            .complete_dispatch(DispatchOutcome {
                ticket: request.ticket,
                result: SolveResult::math(answer(final_answer)),
            })
            .unwrap()
            .id()
    }

    #[test]
    fn test_idle_processing_idle() {
        let mut session = Session::new();
        session.expression.append("2+2");

        let request = session.begin_dispatch(2).unwrap();
        assert!(session.is_processing());
        assert_eq!(session.pending_expression(), Some("2+2"));
        assert_eq!(request.expression, "2+2");

        session.complete_dispatch(DispatchOutcome {
            ticket: request.ticket,
            result: SolveResult::math(answer("4")),
        });

        assert!(!session.is_processing());
        assert!(session.expression.is_empty());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.current_result().unwrap().final_answer(), "4");
    }

    #[test]
    fn test_blank_submission_rejected() {
        let mut session = Session::new();
        assert_eq!(session.begin_dispatch(2), Err(SubmitError::Blank));

        session.expression.append("  ");
        assert_eq!(session.begin_dispatch(2), Err(SubmitError::Blank));
        assert_eq!(*session.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn test_resubmission_while_processing_rejected() {
        let mut session = Session::new();
        session.expression.append("1+1");
        session.begin_dispatch(2).unwrap();

        session.expression.append("+1");
        assert_eq!(session.begin_dispatch(2), Err(SubmitError::Busy("1+1".to_string())));
    }

    #[test]
    fn test_failed_dispatch_still_recorded() {
        let mut session = Session::new();
        session.expression.append("???");
        let request = session.begin_dispatch(2).unwrap();
        session.complete_dispatch(DispatchOutcome {
            ticket: request.ticket,
            result: SolveResult::fallback(),
        });

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.current_result().unwrap().kind(), ResultKind::Chat);
    }

    #[test]
    fn test_stale_outcome_discarded() {
        let mut session = Session::new();
        session.expression.append("5*5");
        let request = session.begin_dispatch(2).unwrap();

        session.reset();
        let applied = session.complete_dispatch(DispatchOutcome {
            ticket: request.ticket,
            result: SolveResult::math(answer("25")),
        });

        assert!(applied.is_none());
        assert!(session.history().is_empty());
        assert!(session.current_result().is_none());

        // Tickets keep increasing across resets
        session.expression.append("1");
        assert!(session.begin_dispatch(2).unwrap().ticket > request.ticket);
    }

    #[test]
    fn test_context_window_limited_to_two() {
        let mut session = Session::new();
        for i in 0..6 {
            submit(&mut session, &format!("{}+{}", i, i), &(i * 2).to_string());
        }

        session.expression.append("next");
        let request = session.begin_dispatch(2).unwrap();
        assert_eq!(request.context, "Q: 4+4 A: 8; Q: 5+5 A: 10");
    }

    #[test]
    fn test_history_is_append_only() {
        let mut session = Session::new();
        let mut last_len = 0;
        let first = submit(&mut session, "1+1", "2");
        let first_result = session.history().get(first).unwrap().result().clone();

        for i in 0..5 {
            submit(&mut session, &format!("x{}", i), "y");
            assert!(session.history().len() > last_len);
            last_len = session.history().len();
        }
        assert_eq!(session.history().get(first).unwrap().result(), &first_result);
    }

    #[test]
    fn test_replay_restores_expression_without_touching_history() {
        let mut session = Session::new();
        let id = submit(&mut session, "sqrt(16)", "4");
        submit(&mut session, "3^2", "9");

        assert!(session.replay(id));
        assert_eq!(session.expression.as_str(), "sqrt(16)");
        assert_eq!(session.history().len(), 2);
        assert!(!session.is_processing());
        // Active result is untouched by replay
        assert_eq!(session.current_result().unwrap().final_answer(), "9");
    }

    #[test]
    fn test_show_redisplays_stored_result() {
        let mut session = Session::new();
        let id = submit(&mut session, "sqrt(16)", "4");
        submit(&mut session, "3^2", "9");

        assert!(session.show(id));
        assert_eq!(session.current_result().unwrap().final_answer(), "4");
        assert_eq!(session.history().len(), 2);
        assert!(session.expression.is_empty());
    }

    #[test]
    fn test_unknown_entry_ignored() {
        let mut session = Session::new();
        assert!(!session.replay(Uuid::new_v4()));
        assert!(!session.show(Uuid::new_v4()));
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(Mode::ALL.len(), 4);
        assert_eq!(Mode::default(), Mode::General);
        assert_eq!(Mode::Graphing.badge(), "GRAPHING");
        assert_eq!(Mode::Solver.label(), "AI Solver & Word Problems");
    }
}
