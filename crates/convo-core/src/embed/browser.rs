//! Call embed that hands the join URL to the system browser.
//!
//! Terminals cannot host the call themselves, so "mounting" a frame means
//! tracking it in a registry and "joining" means opening the room URL with
//! the platform opener (`xdg-open` / `open` / `cmd /C start`).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{CallEmbed, CallFrame, FrameEvent, FrameEventSender, FrameOptions};
use crate::error::{Error, Result};

type Registry = Arc<Mutex<Vec<(String, Arc<AtomicBool>)>>>;

/// Embed backed by the system browser.
#[derive(Clone, Default)]
pub struct BrowserEmbed {
    opener: Option<PathBuf>,
    mounted: Registry,
}

impl BrowserEmbed {
    /// Locate the platform opener on PATH.
    pub fn detect() -> Self {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["open"]
        } else if cfg!(target_os = "windows") {
            // explorer.exe exits 1 even when the URL opened
            &["cmd"]
        } else {
            &["xdg-open", "gio", "sensible-browser"]
        };

        let opener = candidates.iter().find_map(|c| which::which(c).ok());
        match &opener {
            Some(path) => debug!("Browser opener: {:?}", path),
            None => warn!("No browser opener found; join URLs will only be printed"),
        }

        Self::with_opener(opener)
    }

    /// Use an explicit opener. `None` means join URLs are only logged.
    pub fn with_opener(opener: Option<PathBuf>) -> Self {
        Self {
            opener,
            mounted: Arc::default(),
        }
    }

    pub fn opener(&self) -> Option<&PathBuf> {
        self.opener.as_ref()
    }

    /// Number of frames currently mounted.
    pub fn mounted_count(&self) -> usize {
        self.mounted.lock().map(|m| m.len()).unwrap_or(0)
    }
}

impl CallEmbed for BrowserEmbed {
    fn create_frame(
        &self,
        options: &FrameOptions,
        events: FrameEventSender,
    ) -> Result<Box<dyn CallFrame>> {
        let id = uuid::Uuid::new_v4().to_string();
        let destroyed = Arc::new(AtomicBool::new(false));

        self.mounted
            .lock()
            .map_err(|_| Error::Embed("frame registry poisoned".into()))?
            .push((id.clone(), destroyed.clone()));

        debug!("Mounted frame {} ({:?})", id, options.style);

        Ok(Box::new(BrowserFrame {
            id,
            opener: self.opener.clone(),
            events,
            destroyed,
            joined: false,
            registry: self.mounted.clone(),
        }))
    }

    fn remove_stray_frames(&self) -> usize {
        let Ok(mut mounted) = self.mounted.lock() else {
            return 0;
        };
        let count = mounted.len();
        for (id, destroyed) in mounted.drain(..) {
            debug!("Removing stray frame {}", id);
            destroyed.store(true, Ordering::SeqCst);
        }
        count
    }
}

/// Arguments that make `opener` open `url`.
///
/// `cmd` needs `/C start "" <url>`, with its metacharacters escaped so a
/// query string is not split into separate commands.
fn opener_args(opener: &Path, url: &str) -> Vec<String> {
    let is_cmd = opener
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("cmd"));
    if !is_cmd {
        return vec![url.to_string()];
    }

    let mut escaped = String::with_capacity(url.len());
    for ch in url.chars() {
        if matches!(ch, '^' | '&' | '|' | '<' | '>') {
            escaped.push('^');
        }
        escaped.push(ch);
    }
    vec!["/C".to_string(), "start".to_string(), String::new(), escaped]
}

/// Frame handle produced by [`BrowserEmbed`].
pub struct BrowserFrame {
    id: String,
    opener: Option<PathBuf>,
    events: FrameEventSender,
    destroyed: Arc<AtomicBool>,
    joined: bool,
    registry: Registry,
}

impl BrowserFrame {
    fn ensure_live(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::FrameDestroyed(self.id.clone()));
        }
        Ok(())
    }

    fn emit(&self, event: FrameEvent) {
        // The owner may already have dropped its receiver.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl CallFrame for BrowserFrame {
    fn id(&self) -> &str {
        &self.id
    }

    async fn join(&mut self, url: &str) -> Result<()> {
        self.ensure_live()?;

        match &self.opener {
            Some(opener) => {
                let status = tokio::process::Command::new(opener)
                    .args(opener_args(opener, url))
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await?;
                if !status.success() {
                    return Err(Error::Embed(format!(
                        "{} exited with {}",
                        opener.display(),
                        status
                    )));
                }
                info!("Opened {} in the browser", url);
            }
            None => info!("Open {} in a browser to join the call", url),
        }

        self.joined = true;
        self.emit(FrameEvent::JoinedMeeting);
        Ok(())
    }

    async fn leave(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.joined {
            self.joined = false;
            self.emit(FrameEvent::LeftMeeting);
        }
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut mounted) = self.registry.lock() {
            mounted.retain(|(id, _)| id != &self.id);
        }
        debug!("Destroyed frame {}", self.id);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}
