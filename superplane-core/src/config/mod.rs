//! Persisted connection profiles ("contexts") and their normalization rules.
//!
//! A context is identified by its selector, `url + "/" + organization`, after
//! both parts have been normalized. The [`ConfigStore`] keeps the ordered list
//! of contexts plus the selector of the current one.

mod current;
mod store;

pub use current::CurrentContext;
pub use store::{ConfigDocument, ConfigStore, EnvOverrides};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default API URL used when no context is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Prefix for environment variables that override config keys.
pub const ENV_PREFIX: &str = "SUPERPLANE";

/// File name of the per-user config file inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".superplane.yaml";

pub const CONFIG_KEY_OUTPUT: &str = "output";
pub const CONFIG_KEY_CONTEXTS: &str = "contexts";
pub const CONFIG_KEY_CURRENT_CONTEXT: &str = "currentContext";

/// One persisted connection profile.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigContext {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<String>,
}

// The token must never reach logs, so Debug is written by hand.
impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("url", &self.url)
            .field("organization", &self.organization)
            .field("api_token", &"<redacted>")
            .field("canvas", &self.canvas)
            .finish()
    }
}

impl ConfigContext {
    pub fn new(
        url: impl Into<String>,
        organization: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            organization: organization.into(),
            api_token: api_token.into(),
            canvas: None,
        }
    }

    /// Returns a copy with every field trimmed and the URL stripped of trailing slashes.
    pub fn normalized(&self) -> Self {
        Self {
            url: normalize_base_url(&self.url),
            organization: self.organization.trim().to_string(),
            api_token: self.api_token.trim().to_string(),
            canvas: self.canvas.clone(),
        }
    }

    /// A context is only persisted when both `url` and `apiToken` are present.
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty() && !self.api_token.is_empty()
    }

    /// The `url/organization` identity of this context.
    pub fn selector(&self) -> String {
        context_selector(self)
    }

    /// Active canvas for this context, empty when none is set.
    pub fn active_canvas(&self) -> &str {
        self.canvas.as_deref().unwrap_or("")
    }
}

/// Trims whitespace and strips trailing slashes.
///
/// Trailing runs of slashes and whitespace are removed together so that the
/// result is a fixpoint: `normalize_base_url(normalize_base_url(s))` equals
/// `normalize_base_url(s)`.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

/// Selector of a context: `url + "/" + organization`, both normalized.
pub fn context_selector(context: &ConfigContext) -> String {
    let context = context.normalized();
    format!("{}/{}", context.url, context.organization)
}

/// Normalizes a user- or file-supplied selector.
///
/// The string is trimmed and stripped of trailing slashes. When the last `/`
/// splits it into a non-empty prefix and a trailing segment, the prefix is
/// normalized as a base URL and the segment as an organization name, and the
/// two are rejoined. Anything else is returned trimmed but otherwise as is.
pub fn normalize_context_selector(raw: &str) -> String {
    let selector = normalize_base_url(raw);

    let split_index = match selector.rfind('/') {
        Some(index) if index > 0 && index < selector.len() - 1 => index,
        _ => return selector,
    };

    let base_url = normalize_base_url(&selector[..split_index]);
    let organization = selector[split_index + 1..].trim();
    format!("{}/{}", base_url, organization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("  http://x/ "), "http://x");
        assert_eq!(normalize_base_url("http://x///"), "http://x");
        assert_eq!(normalize_base_url(""), "");
        assert_eq!(normalize_base_url("/"), "");
    }

    #[test]
    fn test_context_normalization() {
        let context = ConfigContext::new(" http://x/ ", " Acme ", " token ").normalized();
        assert_eq!(context.url, "http://x");
        assert_eq!(context.organization, "Acme");
        assert_eq!(context.api_token, "token");
        assert!(context.is_valid());
    }

    #[test]
    fn test_selector_uses_normalized_fields() {
        let context = ConfigContext::new("http://x/", "Acme", "t");
        assert_eq!(context_selector(&context), "http://x/Acme");
    }

    #[test]
    fn test_normalize_context_selector_splits_on_last_slash() {
        assert_eq!(normalize_context_selector(" http://x/Acme/ "), "http://x/Acme");
        assert_eq!(normalize_context_selector("http://x// Acme "), "http://x/Acme");
        assert_eq!(
            normalize_context_selector("http://host/base/Org"),
            "http://host/base/Org"
        );
    }

    #[test]
    fn test_normalize_context_selector_leaves_malformed_input() {
        assert_eq!(normalize_context_selector("any"), "any");
        assert_eq!(normalize_context_selector("/Acme"), "/Acme");
        assert_eq!(normalize_context_selector("   "), "");
        assert_eq!(normalize_context_selector("///"), "");
    }

    #[test]
    fn test_normalize_context_selector_is_idempotent() {
        let inputs = [
            "",
            " ",
            "any",
            "/",
            "//",
            "/Acme",
            "a/ /",
            "a /b",
            "http://x",
            "http://x/",
            "http://x/ /",
            "http://x/Acme",
            " http://x// Acme // ",
            "http://host/base/Org",
            "http:/x",
            "\thttp://x/\tAcme\n",
            "a//b",
            "//b",
        ];

        for input in inputs {
            let once = normalize_context_selector(input);
            let twice = normalize_context_selector(&once);
            assert_eq!(once, twice, "normalization not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_selector_round_trips_through_normalization() {
        let contexts = [
            ConfigContext::new("http://x/", "Acme", "t"),
            ConfigContext::new(" https://api.example.com ", " Org One ", "t"),
            ConfigContext::new("http://localhost:8000", "dev", "t"),
            ConfigContext::new("http://host/base", "Org", "t"),
        ];

        for context in contexts {
            let selector = context_selector(&context);
            assert_eq!(normalize_context_selector(&selector), selector);
        }
    }

    #[test]
    fn test_debug_redacts_api_token() {
        let context = ConfigContext::new("http://x", "Acme", "super-secret");
        let debug = format!("{:?}", context);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
