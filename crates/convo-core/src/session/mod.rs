//! Conversation session lifecycle.
//!
//! ```text
//!            start() / create_session()
//!   Idle ───────────────────────────────► Creating
//!    ▲                                      │
//!    │                          URL present │ no URL / transport error
//!    │                                      ▼            ▼
//!    │                                    Ready        Failed ──► reset() ──► Idle
//!    │                                      │ ▲
//!    │                      joined-meeting  │ │ left-meeting
//!    │                                      ▼ │
//!    └──────────── end_session() ──────── Joined
//! ```
//!
//! The state is never stored: it is projected from the session record, the
//! live call frame and the last error (see [`SessionController::state`]).

mod lifecycle;

pub use lifecycle::{ControllerOptions, SessionController, SessionState, UiState};
