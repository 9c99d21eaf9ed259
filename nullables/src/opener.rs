//! Nullable opener-window bridge for the return relay.

use std::sync::Mutex;

use agegate_relay::OpenerWindow;
use agegate_types::Origin;

/// Records `postMessage` calls from the relay instead of delivering them.
pub struct RecordingOpener {
    attached: bool,
    posts: Mutex<Vec<(String, Origin)>>,
}

impl RecordingOpener {
    /// An opener that accepts posts.
    pub fn attached() -> Self {
        Self {
            attached: true,
            posts: Mutex::new(Vec::new()),
        }
    }

    /// A detached opener: the popup was opened without one, every post is
    /// dropped.
    pub fn detached() -> Self {
        Self {
            attached: false,
            posts: Mutex::new(Vec::new()),
        }
    }

    /// `(payload_json, target_origin)` of every delivered post.
    pub fn posts(&self) -> Vec<(String, Origin)> {
        self.posts.lock().unwrap().clone()
    }
}

impl OpenerWindow for RecordingOpener {
    fn post_message(&self, payload_json: &str, target_origin: &Origin) -> bool {
        if !self.attached {
            return false;
        }
        self.posts
            .lock()
            .unwrap()
            .push((payload_json.to_string(), target_origin.clone()));
        true
    }
}
