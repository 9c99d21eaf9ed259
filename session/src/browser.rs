//! Browser window surfaces, abstracted behind traits.

/// A non-owning handle to a browser-managed popup window.
///
/// Cannot be serialized or persisted; lifetime is one verification session.
/// Only the orchestrator closes it — the liveness monitor merely polls.
pub trait PopupWindow: Send {
    /// Whether the window reports itself closed.
    fn is_closed(&self) -> bool;
    /// Close the window. Closing an already-closed window is a no-op.
    fn close(&self);
}

/// Opens named popup windows. Returns `None` when the browser blocks the
/// popup.
pub trait PopupOpener {
    fn open(&self, name: &str, features: &str) -> Option<Box<dyn PopupWindow>>;
}

/// Carrier of the hidden-form POST into the popup. Returns false when the
/// form could not be submitted (document torn down, popup vanished).
pub trait FormSink {
    fn submit(&self, form: &IdpFormPost) -> bool;
}

/// The hidden form POSTed to the identity provider, targeted at the popup
/// by window name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdpFormPost {
    pub action: String,
    pub target: String,
    pub fields: Vec<(String, String)>,
}

impl IdpFormPost {
    /// Build the provider's certification form from the payload triple.
    pub fn certification(
        action: impl Into<String>,
        target: impl Into<String>,
        token_version_id: &str,
        enc_data: &str,
        integrity_value: &str,
    ) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
            fields: vec![
                ("m".into(), "service".into()),
                ("token_version_id".into(), token_version_id.into()),
                ("enc_data".into(), enc_data.into()),
                ("integrity_value".into(), integrity_value.into()),
            ],
        }
    }
}

/// Fixed pixel size and window name for the verification popup.
#[derive(Clone, Debug)]
pub struct PopupSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl Default for PopupSpec {
    fn default() -> Self {
        Self {
            name: "agegate_verification".into(),
            width: 500,
            height: 550,
        }
    }
}

impl PopupSpec {
    /// Chrome-stripped feature string, centered on the given screen.
    pub fn features(&self, screen_width: u32, screen_height: u32) -> String {
        let left = screen_width.saturating_sub(self.width) / 2;
        let top = screen_height.saturating_sub(self.height) / 2;
        format!(
            "toolbar=no,menubar=no,scrollbars=no,status=no,width={},height={},left={left},top={top}",
            self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certification_form_carries_the_triple() {
        let form = IdpFormPost::certification("https://idp/checkplus", "popup", "tv", "ENC", "TAG");
        assert_eq!(form.target, "popup");
        assert_eq!(
            form.fields,
            vec![
                ("m".to_string(), "service".to_string()),
                ("token_version_id".to_string(), "tv".to_string()),
                ("enc_data".to_string(), "ENC".to_string()),
                ("integrity_value".to_string(), "TAG".to_string()),
            ]
        );
    }

    #[test]
    fn features_center_the_popup() {
        let spec = PopupSpec::default();
        let features = spec.features(1920, 1080);
        assert!(features.contains("toolbar=no"));
        assert!(features.contains("width=500,height=550"));
        assert!(features.contains("left=710"));
        assert!(features.contains("top=265"));
    }
}
