//! Nullable popup window, opener, and form sink.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use agegate_session::{FormSink, IdpFormPost, PopupOpener, PopupWindow};

#[derive(Default)]
struct PopupState {
    user_closed: AtomicBool,
    close_calls: AtomicU32,
}

/// A scriptable popup window handle.
///
/// Clones share state, mirroring how a browser hands out the same window
/// handle to everyone who holds it.
#[derive(Clone, Default)]
pub struct NullPopup {
    state: Arc<PopupState>,
}

impl NullPopup {
    /// A freshly opened, still-live popup.
    pub fn open() -> Self {
        Self::default()
    }

    /// Simulate the user closing the popup.
    pub fn set_closed(&self) {
        self.state.user_closed.store(true, Ordering::SeqCst);
    }

    /// Whether code under test called `close()` (cleanup released it).
    pub fn was_closed(&self) -> bool {
        self.close_calls() > 0
    }

    /// How many times `close()` was called.
    pub fn close_calls(&self) -> u32 {
        self.state.close_calls.load(Ordering::SeqCst)
    }
}

impl PopupWindow for NullPopup {
    fn is_closed(&self) -> bool {
        self.state.user_closed.load(Ordering::SeqCst) || self.was_closed()
    }

    fn close(&self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

enum OpenBehavior {
    Open(NullPopup),
    Block,
}

/// A popup opener that either hands out a scripted popup or simulates the
/// browser's popup blocker.
pub struct NullOpener {
    behavior: OpenBehavior,
    opens: Mutex<Vec<(String, String)>>,
}

impl NullOpener {
    /// Every `open` call returns a handle to `popup`.
    pub fn opening(popup: NullPopup) -> Self {
        Self {
            behavior: OpenBehavior::Open(popup),
            opens: Mutex::new(Vec::new()),
        }
    }

    /// Every `open` call is blocked (returns `None`).
    pub fn blocking() -> Self {
        Self {
            behavior: OpenBehavior::Block,
            opens: Mutex::new(Vec::new()),
        }
    }

    /// `(name, features)` pairs of every open attempt.
    pub fn opens(&self) -> Vec<(String, String)> {
        self.opens.lock().unwrap().clone()
    }
}

impl PopupOpener for NullOpener {
    fn open(&self, name: &str, features: &str) -> Option<Box<dyn PopupWindow>> {
        self.opens
            .lock()
            .unwrap()
            .push((name.to_string(), features.to_string()));
        match &self.behavior {
            OpenBehavior::Open(popup) => Some(Box::new(popup.clone())),
            OpenBehavior::Block => None,
        }
    }
}

/// A form sink that records submissions instead of POSTing them.
pub struct RecordingFormSink {
    accept: bool,
    submitted: Mutex<Vec<IdpFormPost>>,
}

impl RecordingFormSink {
    pub fn new() -> Self {
        Self {
            accept: true,
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// A sink whose every submission fails.
    pub fn rejecting() -> Self {
        Self {
            accept: false,
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// All recorded form posts (for assertions).
    pub fn submitted(&self) -> Vec<IdpFormPost> {
        self.submitted.lock().unwrap().clone()
    }
}

impl Default for RecordingFormSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSink for RecordingFormSink {
    fn submit(&self, form: &IdpFormPost) -> bool {
        self.submitted.lock().unwrap().push(form.clone());
        self.accept
    }
}
