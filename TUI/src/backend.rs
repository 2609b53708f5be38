// Backend communication with the Gemini generateContent REST API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::SolverConfig;
use crate::solve::{SolvePayload, SolveResult};

const SYSTEM_INSTRUCTION: &str = "You are Benny Toon, a world-class, friendly, and super smart mathematics calculator engine.
You help users solve problems in Algebra, Calculus, Trigonometry, Statistics, Geometry, Matrices, and more.

Style Guide:
- Be precise mathematically.
- Be friendly and encouraging (you are a cartoon mascot).
- If the user asks for a graph, generate the data points.
- For matrices, format them clearly in the markdown.
- For calculus, explain the steps (derivatives, integrals).
- If the input is just a simple arithmetic expression (e.g., '2+2'), solve it quickly.";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("running offline")]
    Offline,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("solver returned no text")]
    EmptyResponse,
    #[error("response does not match the schema: {0}")]
    Schema(String),
}

/// What the dispatcher hands to a solver for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveQuery {
    pub expression: String,
    pub context: String,
}

/// Anything that can turn an expression into a structured result.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn solve(&self, query: &SolveQuery) -> Result<SolveResult, BackendError>;
}

/// Solver used with `--offline`: every request fails.
pub struct OfflineSolver;

#[async_trait]
impl Solver for OfflineSolver {
    async fn solve(&self, _query: &SolveQuery) -> Result<SolveResult, BackendError> {
        Err(BackendError::Offline)
    }
}

pub struct GeminiSolver {
    client: Client,
    config: SolverConfig,
}

impl GeminiSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, query: &SolveQuery) -> GenerateContentRequest {
        let instruction = format!(
            "{}\n\nContext from previous turns: {}\n",
            SYSTEM_INSTRUCTION, query.context
        );

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: query.expression.clone(),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: instruction }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl Solver for GeminiSolver {
    async fn solve(&self, query: &SolveQuery) -> Result<SolveResult, BackendError> {
        let request = self.build_request(query);
        tracing::debug!(model = %self.config.model, "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = extract_text(parsed)?;
        parse_solution(&text)
    }
}

/// Schema the model must follow, in the REST API's OpenAPI subset.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "solutionMarkdown": {
                "type": "STRING",
                "description": "Step-by-step solution in Markdown format. Use standard text for math, or LaTeX wrapped in $ signs if absolutely necessary, but prefer readable text."
            },
            "finalAnswer": {
                "type": "STRING",
                "description": "The concise final result."
            },
            "isGraphable": {
                "type": "BOOLEAN",
                "description": "True if the result can be visualized on a 2D X/Y Cartesian plane (e.g., a function, a set of points)."
            },
            "graphData": {
                "type": "ARRAY",
                "description": "If isGraphable is true, provide 20-50 sampled (x, y) points to plot the function nicely. Range typically -10 to 10 unless context suggests otherwise.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "x": { "type": "NUMBER" },
                        "y": { "type": "NUMBER" }
                    },
                    "required": ["x", "y"]
                }
            },
            "bennyComment": {
                "type": "STRING",
                "description": "A short, encouraging, friendly remark from 'Benny Toon', the math mascot. Keep it fun and under 20 words."
            }
        },
        "required": ["solutionMarkdown", "finalAnswer", "isGraphable", "bennyComment"]
    })
}

fn extract_text(response: GenerateContentResponse) -> Result<String, BackendError> {
    response
        .candidates
        .into_iter()
        .flatten()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or(BackendError::EmptyResponse)
}

/// Parse the model's JSON text. Tolerates prose or a code fence around the
/// object by retrying on the outermost `{...}`.
fn parse_solution(text: &str) -> Result<SolveResult, BackendError> {
    let payload: SolvePayload = match serde_json::from_str(text) {
        Ok(p) => p,
        Err(e) => {
            let inner = match (text.find('{'), text.rfind('}')) {
                (Some(start), Some(end)) if start < end => &text[start..=end],
                _ => return Err(BackendError::Schema(e.to_string())),
            };
            serde_json::from_str(inner).map_err(|e| BackendError::Schema(e.to_string()))?
        }
    };

    if payload.final_answer.trim().is_empty() {
        return Err(BackendError::Schema("finalAnswer is empty".to_string()));
    }

    Ok(SolveResult::math(payload))
}

fn map_http_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let msg = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(s) if !s.is_empty() => format!("{}: {}", s, msg),
                _ => msg,
            })
        })
        .unwrap_or_else(|| body.to_string());

    BackendError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}
