//! Conversation API client.
//!
//! [`ConversationApi`] is the seam the lifecycle controller talks to;
//! [`ConversationClient`] implements it over HTTPS with `reqwest`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use convo_core::client::{ConversationApi, ConversationClient};
//! use convo_core::Config;
//!
//! #[tokio::main]
//! async fn main() -> convo_core::Result<()> {
//!     let config = Config::load()?;
//!     let client = ConversationClient::new(&config)?;
//!     let conversations = client.list_conversations().await?;
//!     println!("{} active", conversations.len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::{Conversation, CreateConversationRequest, CreateOutcome};

#[cfg(feature = "client")]
mod http;

#[cfg(feature = "client")]
pub use http::{ConversationClient, API_KEY_HEADER};

/// Operations the controller needs from the remote Conversation API.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// List conversations owned by the API key.
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// End a conversation.
    async fn end_conversation(&self, conversation_id: &str) -> Result<()>;

    /// Create a conversation.
    ///
    /// A non-2xx status is not an error here: the outcome carries the status
    /// and whatever body came back. Only transport and decode failures are
    /// errors.
    async fn create_conversation(&self, req: &CreateConversationRequest) -> Result<CreateOutcome>;
}

/// Result of a cleanup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Conversations listed
    pub found: usize,
    /// Conversations successfully ended
    pub ended: usize,
    /// Conversations whose end call failed
    pub failed: usize,
}

/// End every conversation owned by the key.
///
/// Best-effort: a failed listing yields an empty report and individual end
/// failures are counted and logged, never propagated.
pub async fn end_all_conversations(api: &dyn ConversationApi) -> CleanupReport {
    end_all_conversations_except(api, None).await
}

/// End every conversation owned by the key except `keep`.
///
/// `keep` is neither ended nor counted. Listed items without an id are
/// counted as failed.
pub async fn end_all_conversations_except(
    api: &dyn ConversationApi,
    keep: Option<&str>,
) -> CleanupReport {
    let conversations = match api.list_conversations().await {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not list conversations: {}", e);
            return CleanupReport::default();
        }
    };

    let mut report = CleanupReport::default();

    for conversation in &conversations {
        let id = conversation.resolved_id();
        if id.is_some() && id == keep {
            continue;
        }
        report.found += 1;

        let Some(id) = id else {
            warn!("Skipping listed conversation without an id");
            report.failed += 1;
            continue;
        };

        match api.end_conversation(id).await {
            Ok(()) => {
                debug!("Ended conversation {}", id);
                report.ended += 1;
            }
            Err(e) => {
                warn!("Could not end conversation {}: {}", id, e);
                report.failed += 1;
            }
        }
    }

    if report.found > 0 {
        info!(
            "Cleanup ended {}/{} conversations",
            report.ended, report.found
        );
    }

    report
}
