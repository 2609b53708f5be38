// Result types shared by the backend, the dispatcher and the presenter

use serde::{Deserialize, Serialize};

const FALLBACK_SOLUTION: &str = "Oops! My calculator circuits got a bit tangled.";
const FALLBACK_ANSWER: &str = "Error";
const FALLBACK_REMARK: &str = "Let's try that again, maybe rephrase the problem?";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: f64,
    pub y: f64,
}

impl GraphPoint {
    #[cfg(test)]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Where a result came from: the solver's structured answer, or a
/// conversational reply (currently only the failure fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Math,
    Chat,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Math => "math",
            ResultKind::Chat => "chat",
        }
    }
}

/// JSON shape the remote model is asked to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvePayload {
    pub solution_markdown: String,
    pub final_answer: String,
    pub is_graphable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_data: Option<Vec<GraphPoint>>,
    pub benny_comment: String,
}

/// One solved query. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    solution_markdown: String,
    final_answer: String,
    is_graphable: bool,
    graph_data: Option<Vec<GraphPoint>>,
    benny_comment: String,
    kind: ResultKind,
}

impl SolveResult {
    /// Wrap a payload returned by the solver. Samples with a NaN or
    /// infinite coordinate are dropped.
    pub fn math(payload: SolvePayload) -> Self {
        let graph_data = payload
            .graph_data
            .map(|points| points.into_iter().filter(GraphPoint::is_finite).collect());

        Self {
            solution_markdown: payload.solution_markdown,
            final_answer: payload.final_answer,
            is_graphable: payload.is_graphable,
            graph_data,
            benny_comment: payload.benny_comment,
            kind: ResultKind::Math,
        }
    }

    /// Result shown whenever a dispatch fails for any reason.
    pub fn fallback() -> Self {
        Self {
            solution_markdown: FALLBACK_SOLUTION.to_string(),
            final_answer: FALLBACK_ANSWER.to_string(),
            is_graphable: false,
            graph_data: None,
            benny_comment: FALLBACK_REMARK.to_string(),
            kind: ResultKind::Chat,
        }
    }

    pub fn solution_markdown(&self) -> &str {
        &self.solution_markdown
    }

    pub fn final_answer(&self) -> &str {
        &self.final_answer
    }

    pub fn is_graphable(&self) -> bool {
        self.is_graphable
    }

    pub fn graph_data(&self) -> Option<&[GraphPoint]> {
        self.graph_data.as_deref()
    }

    pub fn benny_comment(&self) -> &str {
        &self.benny_comment
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Points to chart, present only when the result is graphable and the
    /// solver actually sent samples.
    pub fn plot_points(&self) -> Option<&[GraphPoint]> {
        if !self.is_graphable {
            return None;
        }
        self.graph_data().filter(|points| !points.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(graphable: bool, points: Option<Vec<GraphPoint>>) -> SolvePayload {
        SolvePayload {
            solution_markdown: "x".to_string(),
            final_answer: "1".to_string(),
            is_graphable: graphable,
            graph_data: points,
            benny_comment: "hi".to_string(),
        }
    }

    #[test]
    fn test_payload_deserializes_camel_case() {
        let json = r#"{
            "solutionMarkdown": "**2 + 2** = 4",
            "finalAnswer": "4",
            "isGraphable": false,
            "bennyComment": "Easy peasy!"
        }"#;

        let payload: SolvePayload = serde_json::from_str(json).unwrap();
        let result = SolveResult::math(payload);

        assert_eq!(result.final_answer(), "4");
        assert_eq!(result.kind(), ResultKind::Math);
        assert!(result.graph_data().is_none());
    }

    #[test]
    fn test_payload_missing_required_field_fails() {
        let json = r#"{ "solutionMarkdown": "x", "isGraphable": false, "bennyComment": "" }"#;
        assert!(serde_json::from_str::<SolvePayload>(json).is_err());
    }

    #[test]
    fn test_fallback_shape() {
        let result = SolveResult::fallback();
        assert_eq!(result.kind(), ResultKind::Chat);
        assert_eq!(result.final_answer(), "Error");
        assert!(!result.is_graphable());
        assert!(result.graph_data().is_none());
        assert!(result.plot_points().is_none());
    }

    #[test]
    fn test_plot_points_requires_flag_and_data() {
        let points = vec![GraphPoint::new(0.0, 0.0), GraphPoint::new(1.0, 1.0)];

        assert!(SolveResult::math(payload(false, Some(points.clone()))).plot_points().is_none());
        assert!(SolveResult::math(payload(true, None)).plot_points().is_none());
        assert!(SolveResult::math(payload(true, Some(vec![]))).plot_points().is_none());
        assert_eq!(
            SolveResult::math(payload(true, Some(points))).plot_points().map(|p| p.len()),
            Some(2)
        );
    }

    #[test]
    fn test_non_finite_samples_are_not_plottable() {
        let broken = vec![GraphPoint::new(f64::NAN, 1.0), GraphPoint::new(2.0, f64::INFINITY)];
        assert!(SolveResult::math(payload(true, Some(broken))).plot_points().is_none());

        let mixed = vec![
            GraphPoint::new(0.0, 0.0),
            GraphPoint::new(1.0, f64::NAN),
            GraphPoint::new(2.0, 4.0),
        ];
        let result = SolveResult::math(payload(true, Some(mixed)));
        assert_eq!(result.plot_points().map(|p| p.len()), Some(2));
    }
}
