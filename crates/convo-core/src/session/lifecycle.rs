//! Session lifecycle controller.
//!
//! Owns the single session record, the single live call frame and the
//! creation guard. All mutation goes through `&mut self`, so the controller
//! needs no locks; the only work that runs beside it is the detached cleanup
//! sweep started by [`SessionController::create_session`].

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::{end_all_conversations, ConversationApi};
use crate::config::Config;
use crate::embed::{event_channel, CallEmbed, CallFrame, FrameEvent, FrameEventReceiver, FrameOptions};
use crate::types::{CreateConversationRequest, Session, SessionStatus};

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Creating,
    Ready,
    Joined,
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Creating => "creating",
            SessionState::Ready => "ready",
            SessionState::Joined => "joined",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// What a rendering layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UiState {
    pub state: SessionState,
    pub joined: bool,
    pub join_url: Option<String>,
    pub status_message: String,
    pub error_message: String,
}

impl UiState {
    /// Join is offered once a URL is held and the call is not live.
    pub fn can_join(&self) -> bool {
        self.join_url.is_some() && !self.joined
    }

    /// End is only offered while joined.
    pub fn can_end(&self) -> bool {
        self.joined
    }
}

/// Settings the controller needs, injected at construction.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub request: CreateConversationRequest,
    pub frame: FrameOptions,
    pub cleanup_existing: bool,
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            request: config.conversation.to_request(),
            frame: FrameOptions::from(&config.frame),
            cleanup_existing: config.conversation.cleanup_existing,
        }
    }
}

struct LiveCall {
    frame: Box<dyn CallFrame>,
    events: FrameEventReceiver,
}

/// Drives create → join → end → reset against a Conversation API and a
/// call embed.
pub struct SessionController {
    api: Arc<dyn ConversationApi>,
    embed: Arc<dyn CallEmbed>,
    options: ControllerOptions,
    session: Session,
    call: Option<LiveCall>,
    joined: bool,
    creation_guard: bool,
    status: String,
    error: String,
    ui_tx: watch::Sender<UiState>,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn ConversationApi>,
        embed: Arc<dyn CallEmbed>,
        options: ControllerOptions,
    ) -> Self {
        let (ui_tx, _) = watch::channel(UiState::default());
        Self {
            api,
            embed,
            options,
            session: Session::default(),
            call: None,
            joined: false,
            creation_guard: false,
            status: String::new(),
            error: String::new(),
            ui_tx,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// Current state, projected from session, frame and error.
    pub fn state(&self) -> SessionState {
        if self.joined {
            SessionState::Joined
        } else if self.session.status == SessionStatus::Creating {
            SessionState::Creating
        } else if !self.error.is_empty() {
            SessionState::Failed
        } else if self.session.join_url.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        }
    }

    pub fn ui(&self) -> UiState {
        UiState {
            state: self.state(),
            joined: self.joined,
            join_url: self.session.join_url.clone(),
            status_message: self.status.clone(),
            error_message: self.error.clone(),
        }
    }

    /// Receive a fresh `UiState` after every change.
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.ui_tx.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn has_live_call(&self) -> bool {
        self.call.is_some()
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn creation_guard_held(&self) -> bool {
        self.creation_guard
    }

    fn publish(&self) {
        self.ui_tx.send_replace(self.ui());
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.publish();
    }

    fn set_error(&mut self, error: String) {
        debug!("{}", error);
        self.error = error;
        self.publish();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Controller start: create the session once.
    pub async fn start(&mut self) -> Option<String> {
        self.create_session().await
    }

    /// Create the session and return its join URL.
    ///
    /// No-op returning `None` while the creation guard is held or a URL is
    /// already held. Success is decided by the presence of a join URL in the
    /// response, whatever the HTTP status. Failures are recorded in the UI
    /// state; the guard stays held until [`reset`](Self::reset).
    pub async fn create_session(&mut self) -> Option<String> {
        if self.creation_guard || self.session.join_url.is_some() {
            debug!("Conversation already created; skipping");
            return None;
        }

        self.creation_guard = true;
        self.session = Session {
            status: SessionStatus::Creating,
            ..Session::default()
        };
        self.error.clear();
        self.set_status("Creating conversation...");

        if self.options.cleanup_existing {
            self.spawn_cleanup();
        }

        let outcome = match self.api.create_conversation(&self.options.request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail_creation(e.to_string());
                return None;
            }
        };

        let Some(url) = outcome.body.join_url().map(str::to_string) else {
            let body = serde_json::to_string(&outcome.body).unwrap_or_default();
            self.fail_creation(format!(
                "Failed to create conversation: {} - {}",
                outcome.http_status, body
            ));
            return None;
        };

        if !outcome.is_http_success() {
            warn!(
                "Create answered {} but returned a join URL; treating as created",
                outcome.http_status
            );
        }

        let id = outcome.body.resolved_id().map(str::to_string);
        info!(
            "Conversation {} created",
            id.as_deref().unwrap_or("<unknown>")
        );
        self.session = Session {
            id,
            join_url: Some(url.clone()),
            status: SessionStatus::Created,
        };
        self.error.clear();
        self.set_status("Conversation created successfully");
        Some(url)
    }

    fn fail_creation(&mut self, message: String) {
        self.session = Session::default();
        self.status.clear();
        self.set_error(format!("Error creating conversation: {}", message));
    }

    /// Start the best-effort sweep of existing conversations. The task is
    /// detached: creation never waits for it and its failures are only logged.
    fn spawn_cleanup(&self) {
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let report = end_all_conversations(api.as_ref()).await;
            debug!(
                "Cleanup finished: {} found, {} ended, {} failed",
                report.found, report.ended, report.failed
            );
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Call
    // ─────────────────────────────────────────────────────────────────────────

    /// Join the held session's URL.
    pub async fn join(&mut self) {
        let url = self.session.join_url.clone().unwrap_or_default();
        self.join_session(&url).await;
    }

    /// Join the call at `url` in a fresh frame.
    ///
    /// Any previous frame is destroyed and stray frames are removed first, so
    /// at most one frame is live afterwards. A `url` other than the held
    /// session's is refused without touching the live frame.
    pub async fn join_session(&mut self, url: &str) {
        if url.is_empty() {
            self.set_error("No conversation URL available".to_string());
            return;
        }
        if let Some(held) = self.session.join_url.as_deref() {
            if held != url {
                let message = format!(
                    "Error joining meeting: {} is not the current conversation ({})",
                    url, held
                );
                self.set_error(message);
                return;
            }
        }

        self.set_status("Initializing video chat...");

        if let Some(mut previous) = self.call.take() {
            debug!("Destroying previous frame {}", previous.frame.id());
            previous.frame.destroy();
        }
        self.joined = false;

        let removed = self.embed.remove_stray_frames();
        if removed > 0 {
            debug!("Removed {} stray frames", removed);
        }

        if self.session.join_url.is_none() {
            debug!("Adopting {} as the session's join URL", url);
            self.session = Session {
                id: None,
                join_url: Some(url.to_string()),
                status: SessionStatus::Created,
            };
        }

        let (tx, rx) = event_channel();
        let frame = match self.embed.create_frame(&self.options.frame, tx) {
            Ok(frame) => frame,
            Err(e) => {
                self.set_error(format!("Error joining meeting: {}", e));
                return;
            }
        };

        self.set_status("Joining video chat...");
        let call = self.call.insert(LiveCall { frame, events: rx });
        let result = call.frame.join(url).await;

        if let Err(e) = result {
            self.set_error(format!("Error joining meeting: {}", e));
        }
        self.process_events();
    }

    /// Apply every event the live frame has emitted so far.
    pub fn process_events(&mut self) {
        loop {
            let event = match self.call.as_mut() {
                Some(call) => match call.events.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
                None => break,
            };
            self.handle_frame_event(event);
        }
    }

    fn handle_frame_event(&mut self, event: FrameEvent) {
        debug!("Frame event: {}", event);
        match event {
            FrameEvent::JoinedMeeting => {
                self.joined = true;
                self.error.clear();
                info!("Joined call");
                self.set_status("Connected to video chat");
            }
            FrameEvent::LeftMeeting => {
                self.joined = false;
                info!("Left call");
                self.set_status("Left video chat");
            }
        }
    }

    /// Leave the call, destroy the frame and return to Idle.
    ///
    /// The session record keeps only its `Ended` status. Only meaningful
    /// while a frame is live; otherwise a logged no-op.
    pub async fn end_session(&mut self) {
        if self.call.is_none() {
            warn!("No live call to end");
            return;
        }

        self.set_status("Ending conversation...");

        let left = match self.call.as_mut() {
            Some(call) => call.frame.leave().await,
            None => Ok(()),
        };
        if let Err(e) = left {
            self.process_events();
            self.set_error(format!("Error ending conversation: {}", e));
            return;
        }

        let ended_id = self.session.id.take();
        self.destroy_call();
        self.clear();
        self.session = Session::ended();
        info!(
            "Conversation {} ended",
            ended_id.as_deref().unwrap_or("<unknown>")
        );
        self.set_status("Conversation ended");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reset / teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Release the creation guard and clear session and UI state so the next
    /// [`start`](Self::start) creates a new session.
    pub fn reset(&mut self) {
        self.destroy_call();
        self.clear();
        self.publish();
    }

    /// Destroy any live frame. Also runs on drop.
    pub fn dispose(&mut self) {
        self.destroy_call();
        self.publish();
    }

    fn destroy_call(&mut self) {
        if let Some(mut call) = self.call.take() {
            debug!("Destroying frame {}", call.frame.id());
            call.frame.destroy();
        }
        self.joined = false;
    }

    fn clear(&mut self) {
        self.creation_guard = false;
        self.session = Session::default();
        self.joined = false;
        self.error.clear();
        self.status.clear();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.destroy_call();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{FrameEventSender, FrameOptions};
    use crate::error::{Error, Result};
    use crate::types::{Conversation, CreateConversationResponse, CreateOutcome};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ─────────────────────────────────────────────────────────────────────
    // Fakes
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeApi {
        responses: Mutex<Vec<Result<CreateOutcome>>>,
        create_calls: AtomicUsize,
        existing: Vec<&'static str>,
        hang_list: bool,
        list_calls: AtomicUsize,
        ended: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn answering(responses: Vec<Result<CreateOutcome>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                ..Default::default()
            }
        }

        fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConversationApi for FakeApi {
        async fn list_conversations(&self) -> Result<Vec<Conversation>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_list {
                std::future::pending::<()>().await;
            }
            Ok(self
                .existing
                .iter()
                .map(|id| serde_json::from_value(serde_json::json!({ "id": id })).unwrap())
                .collect())
        }

        async fn end_conversation(&self, conversation_id: &str) -> Result<()> {
            self.ended.lock().unwrap().push(conversation_id.to_string());
            Ok(())
        }

        async fn create_conversation(&self, _req: &CreateConversationRequest) -> Result<CreateOutcome> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(Error::Http("no scripted response".to_string()));
            }
            responses.remove(0)
        }
    }

    fn outcome(status: u16, body: serde_json::Value) -> Result<CreateOutcome> {
        let body: CreateConversationResponse = serde_json::from_value(body).unwrap();
        Ok(CreateOutcome {
            http_status: status,
            body,
        })
    }

    fn created(url: &str) -> Result<CreateOutcome> {
        outcome(
            200,
            serde_json::json!({ "conversation_id": "c1", "conversation_url": url }),
        )
    }

    #[derive(Default)]
    struct FakeEmbed {
        live: Arc<AtomicUsize>,
        created: AtomicUsize,
        stray: AtomicUsize,
        stray_removed: AtomicUsize,
        silent_join: bool,
        fail_join: AtomicBool,
        fail_leave: AtomicBool,
        last_sender: Mutex<Option<FrameEventSender>>,
    }

    impl FakeEmbed {
        fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }

        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        /// Emit an event as if it came from inside the embed.
        fn emit(&self, event: FrameEvent) {
            if let Some(tx) = self.last_sender.lock().unwrap().as_ref() {
                tx.send(event).unwrap();
            }
        }
    }

    impl CallEmbed for FakeEmbed {
        fn create_frame(
            &self,
            _options: &FrameOptions,
            events: FrameEventSender,
        ) -> Result<Box<dyn CallFrame>> {
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_add(1, Ordering::SeqCst);
            *self.last_sender.lock().unwrap() = Some(events.clone());
            Ok(Box::new(FakeFrame {
                id: format!("frame-{}", n),
                live: Arc::clone(&self.live),
                events,
                destroyed: false,
                emit_on_join: !self.silent_join,
                fail_join: self.fail_join.load(Ordering::SeqCst),
                fail_leave: self.fail_leave.load(Ordering::SeqCst),
            }))
        }

        fn remove_stray_frames(&self) -> usize {
            let n = self.stray.swap(0, Ordering::SeqCst);
            self.stray_removed.fetch_add(n, Ordering::SeqCst);
            n
        }
    }

    struct FakeFrame {
        id: String,
        live: Arc<AtomicUsize>,
        events: FrameEventSender,
        destroyed: bool,
        emit_on_join: bool,
        fail_join: bool,
        fail_leave: bool,
    }

    #[async_trait]
    impl CallFrame for FakeFrame {
        fn id(&self) -> &str {
            &self.id
        }

        async fn join(&mut self, _url: &str) -> Result<()> {
            if self.fail_join {
                return Err(Error::Embed("room is full".to_string()));
            }
            if self.emit_on_join {
                let _ = self.events.send(FrameEvent::JoinedMeeting);
            }
            Ok(())
        }

        async fn leave(&mut self) -> Result<()> {
            if self.fail_leave {
                return Err(Error::Embed("not connected".to_string()));
            }
            let _ = self.events.send(FrameEvent::LeftMeeting);
            Ok(())
        }

        fn destroy(&mut self) {
            if !self.destroyed {
                self.destroyed = true;
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }

        fn is_destroyed(&self) -> bool {
            self.destroyed
        }
    }

    fn options(cleanup_existing: bool) -> ControllerOptions {
        ControllerOptions {
            request: Config::default().conversation.to_request(),
            frame: FrameOptions::default(),
            cleanup_existing,
        }
    }

    fn controller(api: &Arc<FakeApi>, embed: &Arc<FakeEmbed>) -> SessionController {
        SessionController::new(api.clone(), embed.clone(), options(false))
    }

    fn assert_invariants(c: &SessionController) {
        if c.has_live_call() {
            assert!(c.session().join_url.as_deref().is_some_and(|u| !u.is_empty()));
        }
        if c.is_joined() {
            assert!(c.has_live_call());
        }
    }

    async fn joined_controller(api: &Arc<FakeApi>, embed: &Arc<FakeEmbed>) -> SessionController {
        let mut c = controller(api, embed);
        c.start().await;
        c.join().await;
        assert_eq!(c.state(), SessionState::Joined);
        c
    }

    // ─────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_reaches_ready_once() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y"), created("https://x/z")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);
        assert_eq!(c.state(), SessionState::Idle);

        assert_eq!(c.start().await.as_deref(), Some("https://x/y"));
        assert_eq!(c.state(), SessionState::Ready);
        assert!(c.creation_guard_held());
        assert_eq!(c.session().id.as_deref(), Some("c1"));
        assert_eq!(c.session().status, SessionStatus::Created);
        assert_eq!(c.ui().status_message, "Conversation created successfully");

        assert_eq!(c.create_session().await, None);
        assert_eq!(c.start().await, None);
        assert_eq!(api.create_calls(), 1);
        assert_eq!(c.session().join_url.as_deref(), Some("https://x/y"));
    }

    #[tokio::test]
    async fn test_url_with_error_status_is_success() {
        let api = Arc::new(FakeApi::answering(vec![outcome(
            400,
            serde_json::json!({ "conversation_url": "https://x/y", "status": 400 }),
        )]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        assert_eq!(c.start().await.as_deref(), Some("https://x/y"));
        assert_eq!(c.state(), SessionState::Ready);
        assert_eq!(c.ui().error_message, "");
    }

    #[tokio::test]
    async fn test_missing_url_fails() {
        let api = Arc::new(FakeApi::answering(vec![outcome(500, serde_json::json!({}))]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        assert_eq!(c.start().await, None);
        assert_eq!(c.state(), SessionState::Failed);
        let ui = c.ui();
        assert!(ui.error_message.contains("Failed to create conversation"));
        assert!(ui.error_message.contains("500"));
        assert!(!ui.can_join());
        assert_eq!(c.session(), &Session::default());
    }

    #[tokio::test]
    async fn test_success_status_without_url_fails() {
        let api = Arc::new(FakeApi::answering(vec![outcome(
            200,
            serde_json::json!({ "message": "queued" }),
        )]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        assert_eq!(c.start().await, None);
        assert_eq!(c.state(), SessionState::Failed);
        assert!(c.ui().error_message.contains("queued"));
    }

    #[tokio::test]
    async fn test_transport_error_fails() {
        let api = Arc::new(FakeApi::answering(vec![Err(Error::Http("dns failure".to_string()))]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        assert_eq!(c.start().await, None);
        assert_eq!(c.state(), SessionState::Failed);
        assert_eq!(
            c.ui().error_message,
            "Error creating conversation: HTTP request failed: dns failure"
        );
    }

    #[tokio::test]
    async fn test_failure_holds_guard_until_reset() {
        let api = Arc::new(FakeApi::answering(vec![
            outcome(500, serde_json::json!({})),
            created("https://x/y"),
        ]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        assert_eq!(c.start().await, None);
        assert!(c.creation_guard_held());
        assert_eq!(c.create_session().await, None);
        assert_eq!(api.create_calls(), 1);

        c.reset();
        assert_eq!(c.state(), SessionState::Idle);
        assert_eq!(c.ui(), UiState::default());

        assert_eq!(c.start().await.as_deref(), Some("https://x/y"));
        assert_eq!(c.state(), SessionState::Ready);
        assert_eq!(api.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_is_not_awaited() {
        let api = Arc::new(FakeApi {
            hang_list: true,
            ..FakeApi::answering(vec![created("https://x/y")])
        });
        let embed = Arc::new(FakeEmbed::default());
        let mut c = SessionController::new(api.clone(), embed.clone(), options(true));

        assert_eq!(c.start().await.as_deref(), Some("https://x/y"));
        assert_eq!(c.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_cleanup_ends_existing_conversations() {
        let api = Arc::new(FakeApi {
            existing: vec!["old-1", "old-2"],
            ..FakeApi::answering(vec![created("https://x/y")])
        });
        let embed = Arc::new(FakeEmbed::default());
        let mut c = SessionController::new(api.clone(), embed.clone(), options(true));
        c.start().await;

        for _ in 0..100 {
            if api.ended.lock().unwrap().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(*api.ended.lock().unwrap(), vec!["old-1", "old-2"]);
    }

    #[tokio::test]
    async fn test_cleanup_disabled() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);
        c.start().await;
        tokio::task::yield_now().await;

        assert_eq!(api.list_calls.load(Ordering::SeqCst), 0);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Join / end
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_join_reaches_joined() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let c = joined_controller(&api, &embed).await;

        let ui = c.ui();
        assert!(ui.joined);
        assert!(ui.can_end());
        assert!(!ui.can_join());
        assert_eq!(ui.status_message, "Connected to video chat");
        assert_eq!(embed.live(), 1);
        assert_invariants(&c);
    }

    #[tokio::test]
    async fn test_join_without_url() {
        let api = Arc::new(FakeApi::default());
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        c.join().await;
        assert_eq!(c.ui().error_message, "No conversation URL available");
        assert_eq!(embed.created(), 0);
        assert!(!c.has_live_call());
    }

    #[tokio::test]
    async fn test_join_twice_keeps_one_frame() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);
        c.start().await;

        c.join().await;
        c.join().await;

        assert_eq!(embed.created(), 2);
        assert_eq!(embed.live(), 1);
        assert_eq!(c.state(), SessionState::Joined);
        assert_invariants(&c);
    }

    #[tokio::test]
    async fn test_join_removes_stray_frames() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        embed.stray.store(2, Ordering::SeqCst);
        let mut c = controller(&api, &embed);
        c.start().await;
        c.join().await;

        assert_eq!(embed.stray_removed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_join_explicit_url_adopts_session() {
        let api = Arc::new(FakeApi::default());
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);

        c.join_session("https://x/elsewhere").await;
        assert_eq!(c.state(), SessionState::Joined);
        assert_eq!(c.session().join_url.as_deref(), Some("https://x/elsewhere"));
        assert_invariants(&c);

        // A held URL blocks creation
        assert_eq!(c.create_session().await, None);
        assert_eq!(api.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_join_other_url_refused_while_session_held() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;

        c.join_session("https://x/elsewhere").await;

        assert_eq!(
            c.ui().error_message,
            "Error joining meeting: https://x/elsewhere is not the current conversation (https://x/y)"
        );
        assert_eq!(c.session().join_url.as_deref(), Some("https://x/y"));
        assert!(c.is_joined());
        assert_eq!(embed.live(), 1);
        assert_eq!(embed.created(), 1);
        assert_invariants(&c);
    }

    #[tokio::test]
    async fn test_join_held_url_explicitly() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);
        c.start().await;

        c.join_session("https://x/y").await;
        assert_eq!(c.state(), SessionState::Joined);
        assert_eq!(c.session().id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_join_failure_is_recoverable() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        embed.fail_join.store(true, Ordering::SeqCst);
        let mut c = controller(&api, &embed);
        c.start().await;

        c.join().await;
        assert_eq!(c.state(), SessionState::Failed);
        assert_eq!(c.ui().error_message, "Error joining meeting: Embed error: room is full");
        assert!(!c.is_joined());
        assert!(c.ui().can_join());
        assert_invariants(&c);

        embed.fail_join.store(false, Ordering::SeqCst);
        c.join().await;
        assert_eq!(c.state(), SessionState::Joined);
        assert_eq!(c.ui().error_message, "");
        assert_eq!(embed.live(), 1);
    }

    #[tokio::test]
    async fn test_joined_waits_for_event() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed {
            silent_join: true,
            ..Default::default()
        });
        let mut c = controller(&api, &embed);
        c.start().await;
        c.join().await;

        assert_eq!(c.state(), SessionState::Ready);
        assert_eq!(c.ui().status_message, "Joining video chat...");

        embed.emit(FrameEvent::JoinedMeeting);
        c.process_events();
        assert_eq!(c.state(), SessionState::Joined);
    }

    #[tokio::test]
    async fn test_left_meeting_returns_to_ready() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;

        embed.emit(FrameEvent::LeftMeeting);
        c.process_events();

        assert_eq!(c.state(), SessionState::Ready);
        assert_eq!(c.ui().status_message, "Left video chat");
        assert!(c.has_live_call());
        assert_invariants(&c);
    }

    #[tokio::test]
    async fn test_end_returns_to_idle() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;

        c.end_session().await;

        assert_eq!(c.state(), SessionState::Idle);
        assert_eq!(c.session(), &Session::ended());
        assert_eq!(c.session().status, SessionStatus::Ended);
        assert!(!c.has_live_call());
        assert!(!c.creation_guard_held());
        assert_eq!(embed.live(), 0);
        let ui = c.ui();
        assert_eq!(ui.status_message, "Conversation ended");
        assert_eq!(ui.error_message, "");
        assert!(!ui.joined);
    }

    #[tokio::test]
    async fn test_end_without_call_is_noop() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);
        c.start().await;
        let before = c.ui();

        c.end_session().await;
        assert_eq!(c.ui(), before);
        assert_eq!(c.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_end_failure_keeps_call() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        embed.fail_leave.store(true, Ordering::SeqCst);
        let mut c = joined_controller(&api, &embed).await;

        c.end_session().await;

        assert_eq!(
            c.ui().error_message,
            "Error ending conversation: Embed error: not connected"
        );
        assert!(c.is_joined());
        assert_eq!(embed.live(), 1);
        assert_invariants(&c);
    }

    #[tokio::test]
    async fn test_new_session_after_end() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y"), created("https://x/z")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;
        c.end_session().await;

        assert_eq!(c.start().await.as_deref(), Some("https://x/z"));
        assert_eq!(api.create_calls(), 2);
        assert_eq!(c.session().status, SessionStatus::Created);
    }

    #[tokio::test]
    async fn test_reset_after_end_clears_ended_status() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;
        c.end_session().await;

        c.reset();
        assert_eq!(c.session(), &Session::default());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Teardown / observation
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_dispose_destroys_frame() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;

        c.dispose();
        assert_eq!(embed.live(), 0);
        assert!(!c.is_joined());
        assert_invariants(&c);
    }

    #[tokio::test]
    async fn test_drop_destroys_frame() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let c = joined_controller(&api, &embed).await;

        drop(c);
        assert_eq!(embed.live(), 0);
    }

    #[tokio::test]
    async fn test_reset_destroys_frame() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = joined_controller(&api, &embed).await;

        c.reset();
        assert_eq!(embed.live(), 0);
        assert_eq!(c.state(), SessionState::Idle);
        assert!(!c.creation_guard_held());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let api = Arc::new(FakeApi::answering(vec![created("https://x/y")]));
        let embed = Arc::new(FakeEmbed::default());
        let mut c = controller(&api, &embed);
        let mut rx = c.subscribe();
        assert_eq!(rx.borrow_and_update().state, SessionState::Idle);

        c.start().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, SessionState::Ready);

        c.join().await;
        let ui = rx.borrow_and_update().clone();
        assert_eq!(ui.state, SessionState::Joined);
        assert_eq!(ui.join_url.as_deref(), Some("https://x/y"));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.conversation.cleanup_existing = false;
        config.frame.show_leave_button = true;

        let options = ControllerOptions::from(&config);
        assert!(!options.cleanup_existing);
        assert!(options.frame.show_leave_button);
        assert_eq!(options.request.replica_id, config.conversation.replica_id);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Joined.to_string(), "joined");
        assert_eq!(SessionState::Failed.to_string(), "failed");
    }
}
