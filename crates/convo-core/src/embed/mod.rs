//! Call embed boundary.
//!
//! The embed renders and manages the live call for a join URL. The
//! controller only sees these traits:
//!
//! ```text
//! CallEmbed::create_frame(options, events) ──► Box<dyn CallFrame>
//!                                                 │
//!        join(url) / leave() / destroy()  ◄───────┤
//!                                                 │
//!        FrameEvent::{JoinedMeeting, LeftMeeting} ┘ (via events channel)
//! ```

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::FrameConfig;
use crate::error::Result;

#[cfg(feature = "browser")]
mod browser;

#[cfg(feature = "browser")]
pub use browser::BrowserEmbed;

/// Lifecycle events emitted by a call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    JoinedMeeting,
    LeftMeeting,
}

impl FrameEvent {
    /// Event name as the embed SDK spells it.
    pub fn name(&self) -> &'static str {
        match self {
            FrameEvent::JoinedMeeting => "joined-meeting",
            FrameEvent::LeftMeeting => "left-meeting",
        }
    }
}

impl std::fmt::Display for FrameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sending half handed to a frame at creation.
pub type FrameEventSender = mpsc::UnboundedSender<FrameEvent>;
/// Receiving half kept by the frame's owner.
pub type FrameEventReceiver = mpsc::UnboundedReceiver<FrameEvent>;

/// Create a fresh event channel for one frame.
pub fn event_channel() -> (FrameEventSender, FrameEventReceiver) {
    mpsc::unbounded_channel()
}

/// Presentation of the frame inside its display region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameStyle {
    pub width: String,
    pub height: String,
    pub border: String,
    pub border_radius: String,
}

/// Options passed to `CallEmbed::create_frame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameOptions {
    pub show_leave_button: bool,
    pub style: FrameStyle,
}

impl From<&FrameConfig> for FrameOptions {
    fn from(config: &FrameConfig) -> Self {
        Self {
            show_leave_button: config.show_leave_button,
            style: FrameStyle {
                width: config.width.clone(),
                height: config.height.clone(),
                border: config.border.clone(),
                border_radius: config.border_radius.clone(),
            },
        }
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self::from(&FrameConfig::default())
    }
}

/// Factory for call frames mounted in one display region.
pub trait CallEmbed: Send + Sync {
    /// Mount a new frame. Events for it go to `events`.
    fn create_frame(
        &self,
        options: &FrameOptions,
        events: FrameEventSender,
    ) -> Result<Box<dyn CallFrame>>;

    /// Remove frames still mounted in the region that nobody owns any more.
    /// Returns how many were removed.
    fn remove_stray_frames(&self) -> usize;
}

/// A live call frame.
#[async_trait]
pub trait CallFrame: Send {
    /// Identifier for logging.
    fn id(&self) -> &str;

    /// Join the call at `url`. Emits `JoinedMeeting` once connected.
    async fn join(&mut self, url: &str) -> Result<()>;

    /// Leave the call. Emits `LeftMeeting`.
    async fn leave(&mut self) -> Result<()>;

    /// Release the frame. Idempotent.
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;
}
