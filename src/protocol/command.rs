//! Popup → background command definitions.
//!
//! Commands are adjacently tagged: `name` selects the command, `data` carries
//! its payload.
//!
//! | Name | Data | Result |
//! |------|------|--------|
//! | `getURL` | none | URL string |
//! | `setURL` | optional URL | `bool` |
//! | `reloadPage` | optional URL | `bool` |
//! | `openURL` | URL | `bool` |
//! | `forwardAndBack` | `{ "action": "forward" \| "back" }` | `null` |
//! | `getLinks` | categories | category → [`LinkEntry`] list |
//! | `getRequestURL` | scene key | [`CaptureEvent`](crate::capture::CaptureEvent) list |
//! | `getLoginAccessURL` | scene key | [`CaptureEvent`](crate::capture::CaptureEvent) list |

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Command
// ============================================================================

/// A command addressed to the background hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum Command {
    /// Read the tab's current URL.
    #[serde(rename = "getURL")]
    GetUrl,

    /// Navigate the tab to a URL, or reload it when none is given.
    #[serde(rename = "setURL")]
    SetUrl(Option<String>),

    /// Same as [`Command::SetUrl`]; the name used by the reload button.
    #[serde(rename = "reloadPage")]
    ReloadPage(Option<String>),

    /// Open a URL in a new tab.
    #[serde(rename = "openURL")]
    OpenUrl(String),

    /// Step through the tab's session history.
    #[serde(rename = "forwardAndBack")]
    ForwardAndBack {
        /// Direction.
        action: HistoryAction,
    },

    /// Collect link URLs from the page.
    #[serde(rename = "getLinks")]
    GetLinks(Vec<LinkCategory>),

    /// Read the capture buffer.
    #[serde(rename = "getRequestURL")]
    GetRequestUrl(String),

    /// Read the capture buffer under the login-access name.
    #[serde(rename = "getLoginAccessURL", alias = "getLoginAcessURL")]
    GetLoginAccessUrl(String),
}

impl Command {
    /// Every accepted wire name, aliases included.
    pub const NAMES: &'static [&'static str] = &[
        "getURL",
        "setURL",
        "reloadPage",
        "openURL",
        "forwardAndBack",
        "getLinks",
        "getRequestURL",
        "getLoginAccessURL",
        "getLoginAcessURL",
    ];

    /// Returns the wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetUrl => "getURL",
            Self::SetUrl(_) => "setURL",
            Self::ReloadPage(_) => "reloadPage",
            Self::OpenUrl(_) => "openURL",
            Self::ForwardAndBack { .. } => "forwardAndBack",
            Self::GetLinks(_) => "getLinks",
            Self::GetRequestUrl(_) => "getRequestURL",
            Self::GetLoginAccessUrl(_) => "getLoginAccessURL",
        }
    }

    /// Returns `true` if the command acts on a specific tab.
    #[must_use]
    pub fn needs_tab(&self) -> bool {
        !matches!(self, Self::GetRequestUrl(_) | Self::GetLoginAccessUrl(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// HistoryAction
// ============================================================================

/// Session history direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    /// One entry forward.
    Forward,
    /// One entry back.
    Back,
}

// ============================================================================
// Links
// ============================================================================

/// Element kind whose URLs `getLinks` collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    /// `<iframe src>`.
    Iframe,
    /// `<a href>`.
    A,
    /// `<img src>`.
    Img,
}

/// One collected link, keyed by its position in the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Link URL.
    pub url: String,
    /// Zero-based position after empty URLs were dropped.
    pub key: usize,
}

/// `getLinks` result.
pub type LinkMap = BTreeMap<LinkCategory, Vec<LinkEntry>>;

/// Turns raw URLs into keyed entries, dropping empty ones.
#[must_use]
pub fn link_entries<I, S>(urls: I) -> Vec<LinkEntry>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    urls.into_iter()
        .map(Into::into)
        .filter(|url: &String| !url.is_empty())
        .enumerate()
        .map(|(key, url)| LinkEntry { url, key })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
