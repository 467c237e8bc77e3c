//! Shared types for convo-core.
//!
//! Wire types for the Conversation API plus the session record the
//! lifecycle controller keeps in memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Conversation API Types
// ─────────────────────────────────────────────────────────────────────────────

/// A hosted conversation as returned by `GET /conversations`.
///
/// Items carry `conversation_id`, `id`, or both; use
/// [`Conversation::resolved_id`] rather than either field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub conversation_name: Option<String>,
    #[serde(default)]
    pub conversation_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub replica_id: Option<String>,
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Conversation {
    /// The conversation's id, preferring `conversation_id` over `id`.
    pub fn resolved_id(&self) -> Option<&str> {
        resolve_id(self.conversation_id.as_deref(), self.id.as_deref())
    }

    /// Creation timestamp, when the API sent one in RFC 3339 form.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn resolve_id<'a>(conversation_id: Option<&'a str>, id: Option<&'a str>) -> Option<&'a str> {
    let present = |s: &&str| !s.is_empty();
    conversation_id.filter(present).or(id.filter(present))
}

/// Body of `GET /conversations`.
///
/// Older deployments return a bare array, newer ones wrap it in `data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConversationList {
    Bare(Vec<Conversation>),
    Wrapped {
        data: Vec<Conversation>,
        #[serde(default)]
        total_count: Option<u64>,
    },
}

impl ConversationList {
    pub fn into_vec(self) -> Vec<Conversation> {
        match self {
            ConversationList::Bare(items) => items,
            ConversationList::Wrapped { data, .. } => data,
        }
    }
}

/// Body of `POST /conversations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateConversationRequest {
    pub replica_id: String,
    pub conversational_context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,
}

/// Response of `POST /conversations`.
///
/// Every field is optional: the API may answer with an error document, or
/// with a usable conversation under a non-2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    /// Anything else the API sent (error messages, ids, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CreateConversationResponse {
    /// The new conversation's id, preferring `conversation_id` over `id`.
    pub fn resolved_id(&self) -> Option<&str> {
        resolve_id(self.conversation_id.as_deref(), self.id.as_deref())
    }

    /// The join URL, if the response carries a non-empty one.
    pub fn join_url(&self) -> Option<&str> {
        self.conversation_url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Outcome of a create call: the HTTP status alongside the parsed body.
///
/// Callers decide success from the body, not from the status.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub http_status: u16,
    pub body: CreateConversationResponse,
}

impl CreateOutcome {
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Record
// ─────────────────────────────────────────────────────────────────────────────

/// Status of the controller's session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    None,
    Creating,
    Created,
    Ended,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::None => "none",
            SessionStatus::Creating => "creating",
            SessionStatus::Created => "created",
            SessionStatus::Ended => "ended",
        };
        write!(f, "{}", s)
    }
}

/// The session held by a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Option<String>,
    pub join_url: Option<String>,
    pub status: SessionStatus,
}

impl Session {
    /// The record left behind once a joined call has been ended.
    pub fn ended() -> Self {
        Self {
            status: SessionStatus::Ended,
            ..Self::default()
        }
    }
}
