//! Remote quiz client
//!
//! Thin request/response wrapper around the five backend operations:
//! chat, question fetch, answer submission, score posting, and the
//! leaderboard. The backend origin is fixed once at construction.
//!
//! Two failure kinds are kept strictly apart: a [`TransportError`] means
//! the call itself failed and nothing can be assumed about server state,
//! while a domain error (an `{error}` payload in an otherwise well-formed
//! response) is a normal branch the caller handles like any other reply.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leaderboard::LeaderboardEntry;

/// Network-level failure of a remote call
///
/// When this is returned, the caller must not assume the request was
/// processed by the server at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-success status and no structured body
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    /// The request could not be sent or the response could not be read
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Structured error payload from an otherwise successful exchange
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainError {
    /// Human-readable description, rendered verbatim to the transcript
    pub error: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Free text typed by the user
    pub message: String,
}

/// Reply to `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    /// Natural-language reply; a quiz start is signalled by its content
    pub reply: String,
}

/// A question as served by `GET /quiz/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionPayload {
    /// Opaque question id (numeric suffix determines succession)
    pub id: String,
    /// Question text
    pub question: String,
    /// Answer options in display order
    pub options: Vec<String>,
}

/// Outcome of `GET /quiz/{id}`
///
/// An out-of-range or invalid id fails softly with a [`DomainError`];
/// that is a normal outcome, not a transport fault.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionReply {
    /// The question exists and is ready to present
    Question(QuestionPayload),
    /// The id was invalid or out of range
    Error(DomainError),
}

/// Body of `POST /submit_answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRequest {
    /// Id of the question being answered
    pub question_id: String,
    /// Literal answer text (an option's text or the user's raw input)
    pub user_answer: String,
}

/// Server verdict on a submitted answer
///
/// The server is authoritative for correctness; the client never grades
/// answers locally.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerVerdict {
    /// Whether the submitted answer was correct
    pub correct: bool,
    /// Feedback text to show the user
    pub feedback: String,
}

/// Outcome of `POST /submit_answer`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnswerReply {
    /// The answer was graded
    Verdict(AnswerVerdict),
    /// The submission was rejected (missing data, unknown question)
    Error(DomainError),
}

/// Body of `POST /score`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRequest {
    /// Opaque user id from the identity provider
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Display name shown on the leaderboard
    pub username: String,
    /// Questions answered correctly
    pub score: u32,
    /// Quiz length the score was achieved against
    pub total: u32,
}

/// Acknowledgement of `POST /score`
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreAck {
    /// Confirmation text to show the user
    pub message: String,
}

/// The five remote operations of the quiz backend
///
/// The session flow is generic over this trait so the state machine can be
/// exercised against a scripted backend in tests.
pub trait QuizBackend {
    /// Posts free chat text and returns the assistant's reply
    async fn send_chat(&self, message: &str) -> Result<ChatReply, TransportError>;

    /// Fetches a question by id; invalid ids fail softly in the payload
    async fn fetch_question(&self, id: &str) -> Result<QuestionReply, TransportError>;

    /// Submits an answer for grading
    async fn submit_answer(
        &self,
        question_id: &str,
        user_answer: &str,
    ) -> Result<AnswerReply, TransportError>;

    /// Posts a final score to the shared leaderboard
    async fn post_score(&self, request: &ScoreRequest) -> Result<ScoreAck, TransportError>;

    /// Fetches the leaderboard in server ranking order
    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, TransportError>;
}

/// HTTP implementation of [`QuizBackend`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpQuizClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuizClient {
    /// Creates a client against the given backend origin
    ///
    /// The origin is fixed for the lifetime of the client; a trailing
    /// slash is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl QuizBackend for HttpQuizClient {
    async fn send_chat(&self, message: &str) -> Result<ChatReply, TransportError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn fetch_question(&self, id: &str) -> Result<QuestionReply, TransportError> {
        let response = self.client.get(self.url(&format!("/quiz/{id}"))).send().await?;

        // Soft failures ride non-success statuses with an {error} body,
        // so the body is decoded regardless of status.
        Ok(response.json().await?)
    }

    async fn submit_answer(
        &self,
        question_id: &str,
        user_answer: &str,
    ) -> Result<AnswerReply, TransportError> {
        let response = self
            .client
            .post(self.url("/submit_answer"))
            .json(&AnswerRequest {
                question_id: question_id.to_string(),
                user_answer: user_answer.to_string(),
            })
            .send()
            .await?;

        Ok(response.json().await?)
    }

    async fn post_score(&self, request: &ScoreRequest) -> Result<ScoreAck, TransportError> {
        let response = self
            .client
            .post(self.url("/score"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("score post rejected with status {}", response.status());
            return Err(TransportError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, TransportError> {
        let response = self.client.get(self.url("/leaderboard")).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}
