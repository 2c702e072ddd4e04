//! Lazily acquired browser session, owned by one resolution batch.
//!
//! The session is only launched when a record actually needs the interactive
//! fallback, and is reused for every later record in the batch. The batch
//! calls [`SessionSlot::release`] when it finishes, which leaves the slot
//! `Terminated` whether or not a session was ever opened.

use std::sync::Arc;

use chemxref_sources::{BrowseSession, BrowserLauncher};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing launched yet.
    Idle,
    Open,
    /// Launch failed. Not retried for the rest of the batch.
    Failed,
    Terminated,
}

enum Slot {
    Idle,
    Open(Box<dyn BrowseSession>),
    Failed,
    Terminated,
}

pub struct SessionSlot {
    launcher: Arc<dyn BrowserLauncher>,
    slot: Slot,
    launched: bool,
}

impl SessionSlot {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self { launcher, slot: Slot::Idle, launched: false }
    }

    pub fn state(&self) -> SessionState {
        match self.slot {
            Slot::Idle => SessionState::Idle,
            Slot::Open(_) => SessionState::Open,
            Slot::Failed => SessionState::Failed,
            Slot::Terminated => SessionState::Terminated,
        }
    }

    /// Whether a session was successfully launched at some point.
    pub fn was_used(&self) -> bool {
        self.launched
    }

    /// The open session, launching it on first call. `None` if the launch
    /// failed now or earlier, or the slot was already released.
    pub async fn acquire(&mut self) -> Option<&mut (dyn BrowseSession + 'static)> {
        if matches!(self.slot, Slot::Idle) {
            match self.launcher.launch().await {
                Ok(session) => {
                    self.launched = true;
                    self.slot = Slot::Open(session);
                }
                Err(e) => {
                    warn!(error = %e, "Could not start browser session, interactive fallback disabled");
                    self.slot = Slot::Failed;
                }
            }
        }

        match &mut self.slot {
            Slot::Open(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    /// Quit the session if one is open and mark the slot terminated.
    pub async fn release(&mut self) {
        if let Slot::Open(mut session) = std::mem::replace(&mut self.slot, Slot::Terminated) {
            if let Err(e) = session.quit().await {
                warn!(error = %e, "Browser session did not shut down cleanly");
            } else {
                info!("Browser session released");
            }
        }
    }
}
