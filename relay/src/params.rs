//! Redirect parameters the identity provider appends on the way back.

use agegate_types::VerificationKind;
use serde::Deserialize;

/// Query/form parameters of the return redirect.
#[derive(Clone, Debug, Deserialize)]
pub struct ReturnParams {
    /// Flow-type discriminator carried through the round trip. Providers
    /// that drop unknown form fields leave it at the signup default.
    #[serde(default)]
    pub kind: VerificationKind,
    pub token_version_id: String,
    pub enc_data: String,
    pub integrity_value: String,
}
