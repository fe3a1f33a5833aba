// ── Per-instance client configuration ──
//
// Immutable settings for one push client instance. The config crate (or a
// host page) builds a `ClientConfig` and hands it in; core never reads
// files.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default first path segment of the worker script URL.
pub const DEFAULT_SCRIPT_BASE: &str = "ui_web_push";

/// Default file name of the worker script.
pub const DEFAULT_SCRIPT_NAME: &str = "nodered_push_service.js";

/// Bytes escaped in an instance path segment: all but `[A-Za-z0-9-~]`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'~');

/// Identifier of one client instance.
///
/// Instance ids come from the hosting dashboard and may contain characters
/// that are not safe in a URL path segment (dots, slashes). They are carried
/// in the worker script URL through a reversible percent encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode for use as a single URL path segment.
    ///
    /// Every byte outside `[A-Za-z0-9-~]` becomes `%XX`, so `.` and `_`
    /// are escaped too and [`from_path_segment`](Self::from_path_segment)
    /// restores the id exactly.
    pub fn to_path_segment(&self) -> String {
        utf8_percent_encode(&self.0, PATH_SEGMENT).to_string()
    }

    /// Inverse of [`to_path_segment`](Self::to_path_segment).
    ///
    /// Stricter than plain percent decoding: a `%` must start a two-digit
    /// hex escape and a raw `/` is rejected.
    pub fn from_path_segment(segment: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidInstanceId {
            segment: segment.to_owned(),
            reason: reason.to_owned(),
        };

        if segment.contains('/') {
            return Err(invalid("unescaped '/'"));
        }
        let well_formed = segment.match_indices('%').all(|(idx, _)| {
            segment
                .get(idx + 1..idx + 3)
                .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
        });
        if !well_formed {
            return Err(invalid("truncated or non-hex escape"));
        }

        percent_decode_str(segment)
            .decode_utf8()
            .map(|id| Self(id.into_owned()))
            .map_err(|_| invalid("escapes do not form UTF-8"))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Configuration of a single push client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub id: InstanceId,
    /// VAPID public key, base64url encoded.
    pub public_key: String,
    pub subscribe_label: String,
    pub unsubscribe_label: String,
    /// Report an already existing subscription once at startup.
    pub send_existing_subscription_on_init: bool,
    /// Render the button disabled (not just inert) when push is unsupported.
    pub disable_button_when_unsupported: bool,
    pub show_tooltip: bool,
    /// Path prefix in front of the instance segment of the script URL.
    pub script_base: String,
    pub script_name: String,
}

impl ClientConfig {
    /// Configuration with default labels, flags and script location.
    pub fn new(id: impl Into<InstanceId>, public_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_key: public_key.into(),
            subscribe_label: "Subscribe".into(),
            unsubscribe_label: "Unsubscribe".into(),
            send_existing_subscription_on_init: false,
            disable_button_when_unsupported: true,
            show_tooltip: false,
            script_base: DEFAULT_SCRIPT_BASE.into(),
            script_name: DEFAULT_SCRIPT_NAME.into(),
        }
    }

    /// URL of this instance's worker script: `{base}/{id}/{name}`.
    ///
    /// Each instance gets its own script URL so that each one owns a
    /// separate registration and therefore a separate subscription.
    pub fn script_url(&self) -> String {
        let raw = format!(
            "{}/{}/{}",
            self.script_base,
            self.id.to_path_segment(),
            self.script_name
        );
        collapse_slashes(&raw)
    }
}

/// Replace runs of `/` with a single one, leaving a `scheme://` intact.
fn collapse_slashes(url: &str) -> String {
    let (scheme, path) = match url.find("://") {
        Some(idx) => url.split_at(idx + 3),
        None => ("", url),
    };

    let mut out = String::with_capacity(url.len());
    out.push_str(scheme);
    let mut previous_slash = scheme.ends_with('/');
    for c in path.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        out.push(c);
    }
    out
}
