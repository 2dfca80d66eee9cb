//! Widgets: small stand-ins rendered in place of hidden syntax.
//!
//! Widgets are plain values. Two widgets compare equal exactly when the host may reuse one
//! rendering for the other, so diffing across rebuilds is a value comparison.

use crate::config::ClassNames;

/// The host's "open external URL" capability.
pub trait ExternalOpener {
    /// Open `url` outside the editor (browser, system handler, ...).
    fn open_external(&self, url: &str);
}

/// A renderable stand-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Widget {
    /// A single bullet glyph replacing a list marker.
    Bullet,
    /// A small "open externally" icon placed after link text.
    LinkIcon {
        /// Resolved link destination.
        url: String,
    },
    /// A full-width thin line replacing a thematic break.
    HorizontalRule,
}

impl Widget {
    /// Link-icon widget for `url`.
    pub fn link_icon(url: impl Into<String>) -> Self {
        Self::LinkIcon { url: url.into() }
    }

    /// Text a text-based host renders for this widget.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Bullet => "•",
            Self::LinkIcon { .. } => "↗",
            Self::HorizontalRule => "",
        }
    }

    /// Class applied to the widget's element.
    pub fn class<'c>(&self, classes: &'c ClassNames) -> &'c str {
        match self {
            Self::Bullet => &classes.bullet,
            Self::LinkIcon { .. } => &classes.link_icon,
            Self::HorizontalRule => &classes.horizontal_rule,
        }
    }

    /// Whether the widget occupies its own block rather than flowing inline.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::HorizontalRule)
    }

    /// The URL this widget opens, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::LinkIcon { url } => Some(url),
            Self::Bullet | Self::HorizontalRule => None,
        }
    }

    /// Handle a click/activation. Returns whether the widget did anything.
    pub fn activate(&self, opener: &dyn ExternalOpener) -> bool {
        match self.url() {
            Some(url) => {
                tracing::debug!(url, "opening link from widget");
                opener.open_external(url);
                true
            }
            None => false,
        }
    }
}
