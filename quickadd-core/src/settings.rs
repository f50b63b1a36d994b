//! Synced user settings: where to redirect and whether to redirect at all.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_HANDLER_ORIGIN, DEFAULT_REDIRECT_URL};
use crate::error::{QuickAddError, QuickAddResult};

/// Settings as stored in the synced store.
///
/// Both keys may be absent; absence means "use the default". Field names on the
/// wire are `redirectOrigin` and `enabled`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_origin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl Settings {
    pub fn new(redirect_origin: impl Into<String>, enabled: bool) -> Self {
        Settings {
            redirect_origin: Some(redirect_origin.into()),
            enabled: Some(enabled),
        }
    }

    /// Only an explicit `false` disables interception.
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// Stored redirect origin, ignoring empty values.
    pub fn stored_origin(&self) -> Option<&str> {
        self.redirect_origin.as_deref().filter(|s| !s.is_empty())
    }

    /// Target the interceptor rewrites quick-add links onto.
    pub fn redirect_url(&self) -> &str {
        self.stored_origin().unwrap_or(DEFAULT_REDIRECT_URL)
    }

    /// Base the chooser builds its bounce and handler URLs from.
    pub fn handler_origin(&self) -> &str {
        self.stored_origin().unwrap_or(DEFAULT_HANDLER_ORIGIN)
    }
}

/// Validate a redirect origin entered by the user.
///
/// The input is trimmed; it must be non-empty and parse as an absolute
/// `http` or `https` URL.
pub fn validate_redirect_origin(input: &str) -> QuickAddResult<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuickAddError::EmptyRedirectOrigin);
    }

    let url = Url::parse(trimmed)
        .map_err(|e| QuickAddError::InvalidRedirectOrigin(trimmed.to_string(), e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(QuickAddError::InvalidRedirectOrigin(
            trimmed.to_string(),
            format!("unsupported scheme `{other}`"),
        )),
    }
}
