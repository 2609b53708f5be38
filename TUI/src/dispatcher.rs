use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::{SolveQuery, Solver};
use crate::solve::SolveResult;

/// One accepted submission, identified by its ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub ticket: u64,
    pub expression: String,
    pub context: String,
}

/// Result of a dispatch, delivered back to the UI loop.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub ticket: u64,
    pub result: SolveResult,
}

/// Sends queries to the solver. Never fails: any backend error becomes the
/// fallback result.
#[derive(Clone)]
pub struct Dispatcher {
    solver: Arc<dyn Solver>,
}

impl Dispatcher {
    pub fn new(solver: Arc<dyn Solver>) -> Self {
        Self { solver }
    }

    pub async fn dispatch(&self, expression: &str, context: &str) -> SolveResult {
        let query = SolveQuery {
            expression: expression.to_string(),
            context: context.to_string(),
        };

        let started = Instant::now();
        match self.solver.solve(&query).await {
            Ok(result) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    kind = result.kind().as_str(),
                    graphable = result.is_graphable(),
                    "solved"
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "dispatch failed, using fallback result"
                );
                SolveResult::fallback()
            }
        }
    }

    /// Run one request on the runtime and post the outcome to `outcomes`.
    /// Exactly one outcome is posted per request, even if the solve task
    /// panics or is cancelled.
    pub fn spawn(&self, runtime: &Handle, request: DispatchRequest, outcomes: UnboundedSender<DispatchOutcome>) {
        let dispatcher = self.clone();
        let handle = runtime.clone();
        runtime.spawn(async move {
            let ticket = request.ticket;
            tracing::info!(ticket, expression = %request.expression, "dispatching");

            let solve = handle.spawn(async move { dispatcher.dispatch(&request.expression, &request.context).await });
            let result = match solve.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(ticket, error = %e, "solve task died, using fallback result");
                    SolveResult::fallback()
                }
            };

            // Receiver is gone only when the app is shutting down
            let _ = outcomes.send(DispatchOutcome { ticket, result });
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::solve::{GraphPoint, ResultKind, SolvePayload};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Solver double that replays canned answers and records every query.
    pub(crate) struct ScriptedSolver {
        answers: Mutex<Vec<Result<SolvePayload, BackendError>>>,
        pub(crate) queries: Mutex<Vec<SolveQuery>>,
    }

    impl ScriptedSolver {
        pub(crate) fn new(answers: Vec<Result<SolvePayload, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers),
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Solver for ScriptedSolver {
        async fn solve(&self, query: &SolveQuery) -> Result<SolveResult, BackendError> {
            self.queries.lock().unwrap().push(query.clone());
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                return Err(BackendError::EmptyResponse);
            }
            answers.remove(0).map(SolveResult::math)
        }
    }

    /// Solver whose task dies mid-request.
    pub(crate) struct PanickingSolver;

    #[async_trait]
    impl Solver for PanickingSolver {
        async fn solve(&self, _query: &SolveQuery) -> Result<SolveResult, BackendError> {
            panic!("solver crashed");
        }
    }

    pub(crate) fn answer(final_answer: &str) -> SolvePayload {
        SolvePayload {
            solution_markdown: format!("The answer is **{}**.", final_answer),
            final_answer: final_answer.to_string(),
            is_graphable: false,
            graph_data: None,
            benny_comment: "Math is fun!".to_string(),
        }
    }

    pub(crate) fn parabola(samples: usize) -> SolvePayload {
        let graph_data = (0..samples)
            .map(|i| {
                let x = -10.0 + 20.0 * i as f64 / (samples - 1) as f64;
                GraphPoint::new(x, x * x)
            })
            .collect();
        SolvePayload {
            solution_markdown: "## Parabola\n\n1. Vertex at the origin\n2. Opens upward".to_string(),
            final_answer: "y = x^2".to_string(),
            is_graphable: true,
            graph_data: Some(graph_data),
            benny_comment: "What a lovely curve!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_is_math_with_answer() {
        let solver = ScriptedSolver::new(vec![Ok(answer("4"))]);
        let dispatcher = Dispatcher::new(solver.clone());

        let result = dispatcher.dispatch("2+2", "").await;

        assert_eq!(result.kind(), ResultKind::Math);
        assert_eq!(result.final_answer(), "4");
        assert_eq!(solver.queries.lock().unwrap()[0].expression, "2+2");
    }

    #[tokio::test]
    async fn test_failures_become_fallback() {
        let solver = ScriptedSolver::new(vec![
            Err(BackendError::Offline),
            Err(BackendError::Schema("missing finalAnswer".to_string())),
            Err(BackendError::Api { status: 500, message: "boom".to_string() }),
        ]);
        let dispatcher = Dispatcher::new(solver);

        for _ in 0..4 {
            let result = dispatcher.dispatch("1/0", "").await;
            assert_eq!(result.kind(), ResultKind::Chat);
            assert_eq!(result.final_answer(), "Error");
            assert!(result.graph_data().is_none());
        }
    }

    #[tokio::test]
    async fn test_context_forwarded_verbatim() {
        let solver = ScriptedSolver::new(vec![Ok(answer("6"))]);
        let dispatcher = Dispatcher::new(solver.clone());

        dispatcher.dispatch("3+3", "Q: 1+1 A: 2; Q: 2+2 A: 4").await;

        let queries = solver.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].context, "Q: 1+1 A: 2; Q: 2+2 A: 4");
    }

    #[tokio::test]
    async fn test_spawn_posts_outcome_with_ticket() {
        let solver = ScriptedSolver::new(vec![Ok(answer("42"))]);
        let dispatcher = Dispatcher::new(solver);
        let (tx, mut rx) = mpsc::unbounded_channel();

        dispatcher.spawn(
            &Handle::current(),
            DispatchRequest {
                ticket: 7,
                expression: "6*7".to_string(),
                context: String::new(),
            },
            tx,
        );

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.ticket, 7);
        assert_eq!(outcome.result.final_answer(), "42");
    }

    #[tokio::test]
    async fn test_spawn_posts_fallback_when_solver_panics() {
        let dispatcher = Dispatcher::new(Arc::new(PanickingSolver));
        let (tx, mut rx) = mpsc::unbounded_channel();

        dispatcher.spawn(
            &Handle::current(),
            DispatchRequest {
                ticket: 3,
                expression: "2+2".to_string(),
                context: String::new(),
            },
            tx,
        );

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.ticket, 3);
        assert_eq!(outcome.result.kind(), ResultKind::Chat);
        assert_eq!(outcome.result.final_answer(), "Error");
    }
}
