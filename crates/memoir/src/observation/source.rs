//! Provenance classes for observations.
//!
//! The class is decided once, when the record is built, and every consumer
//! (renderer, thought lookup, inspection CLI) matches on the enum instead of
//! inspecting tag strings. The string form (`action:taken:click`,
//! `thought`, `connector:web`, ...) exists only at the snapshot boundary, and
//! `Display` followed by parsing always yields the same source again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an observation came from.
///
/// Detail-carrying classes store the detail as written: `None` for a bare
/// tag (`connector`), `Some("")` for a tag with an empty detail
/// (`connector:`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ObservationSource {
    /// An action the agent decided to take (`action:taken:<action>`).
    ActionTaken { action: Option<String> },
    /// The outcome reported for an action (`action:result:<action>`).
    ActionResult { action: Option<String> },
    /// Model reasoning recorded between actions.
    Thought,
    /// A snapshot produced by an environment connector (`connector:<name>`).
    Connector { name: Option<String> },
    /// The task statement handed to the agent.
    Task,
    /// Any tag this crate does not recognize, preserved verbatim.
    Other(UnknownSource),
}

/// A source tag no known class claims. Only obtainable by parsing, so it
/// can never hold a tag that would parse back as a known class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnknownSource(String);

impl UnknownSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnknownSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ObservationSource {
    pub fn action_taken(action: impl Into<String>) -> Self {
        Self::ActionTaken {
            action: Some(action.into()),
        }
    }

    pub fn action_result(action: impl Into<String>) -> Self {
        Self::ActionResult {
            action: Some(action.into()),
        }
    }

    pub fn connector(name: impl Into<String>) -> Self {
        Self::Connector {
            name: Some(name.into()),
        }
    }

    /// Whether records of this class were authored by the agent itself.
    ///
    /// Authored records (actions taken, thoughts) are rendered with a
    /// time-of-day prefix so the model can place its own history in time.
    pub fn is_authored(&self) -> bool {
        match self {
            Self::ActionTaken { .. } | Self::Thought => true,
            Self::ActionResult { .. } | Self::Connector { .. } | Self::Task | Self::Other(_) => {
                false
            }
        }
    }

    pub fn is_thought(&self) -> bool {
        matches!(self, Self::Thought)
    }
}

fn with_detail(f: &mut fmt::Formatter<'_>, tag: &str, detail: Option<&str>) -> fmt::Result {
    match detail {
        None => f.write_str(tag),
        Some(detail) => write!(f, "{tag}:{detail}"),
    }
}

impl fmt::Display for ObservationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionTaken { action } => with_detail(f, "action:taken", action.as_deref()),
            Self::ActionResult { action } => with_detail(f, "action:result", action.as_deref()),
            Self::Thought => f.write_str("thought"),
            Self::Connector { name } => with_detail(f, "connector", name.as_deref()),
            Self::Task => f.write_str("task"),
            Self::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// Match `tag` or `tag:detail`. The outer `None` means no match; the inner
/// option is the detail as written.
fn detail_of<'a>(s: &'a str, tag: &str) -> Option<Option<&'a str>> {
    let rest = s.strip_prefix(tag)?;
    if rest.is_empty() {
        Some(None)
    } else {
        rest.strip_prefix(':').map(Some)
    }
}

impl From<&str> for ObservationSource {
    fn from(s: &str) -> Self {
        let owned = |detail: Option<&str>| detail.map(str::to_string);
        if s == "thought" {
            Self::Thought
        } else if s == "task" {
            Self::Task
        } else if let Some(action) = detail_of(s, "action:taken") {
            Self::ActionTaken {
                action: owned(action),
            }
        } else if let Some(action) = detail_of(s, "action:result") {
            Self::ActionResult {
                action: owned(action),
            }
        } else if let Some(name) = detail_of(s, "connector") {
            Self::Connector { name: owned(name) }
        } else {
            Self::Other(UnknownSource(s.to_string()))
        }
    }
}

impl From<String> for ObservationSource {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ObservationSource> for String {
    fn from(source: ObservationSource) -> Self {
        source.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        assert_eq!(
            ObservationSource::from("action:taken:click"),
            ObservationSource::action_taken("click")
        );
        assert_eq!(
            ObservationSource::from("action:result:type"),
            ObservationSource::action_result("type")
        );
        assert_eq!(ObservationSource::from("thought"), ObservationSource::Thought);
        assert_eq!(
            ObservationSource::from("connector:web"),
            ObservationSource::connector("web")
        );
        assert_eq!(ObservationSource::from("task"), ObservationSource::Task);
    }

    #[test]
    fn unknown_tags_are_preserved() {
        let source = ObservationSource::from("thoughtful");
        match &source {
            ObservationSource::Other(tag) => assert_eq!(tag.as_str(), "thoughtful"),
            other => panic!("expected unknown source, got {other:?}"),
        }
        assert_eq!(source.to_string(), "thoughtful");

        // A tag that merely shares a prefix is not a connector.
        assert!(matches!(
            ObservationSource::from("connectors"),
            ObservationSource::Other(_)
        ));
    }

    #[test]
    fn display_matches_parse() {
        for tag in [
            "action:taken:click",
            "action:taken",
            "action:taken:",
            "action:result:scroll",
            "action:result:",
            "thought",
            "connector:web",
            "connector",
            "connector:",
            "task",
            "custom:thing",
            "",
        ] {
            let source = ObservationSource::from(tag);
            assert_eq!(source.to_string(), tag);
            assert_eq!(ObservationSource::from(source.to_string()), source);
        }
    }

    #[test]
    fn empty_detail_differs_from_bare_tag() {
        let bare = ObservationSource::from("connector");
        let empty = ObservationSource::from("connector:");
        assert_eq!(bare, ObservationSource::Connector { name: None });
        assert_eq!(
            empty,
            ObservationSource::Connector {
                name: Some(String::new())
            }
        );
        assert_ne!(bare, empty);
        assert_eq!(ObservationSource::action_taken("").to_string(), "action:taken:");
    }

    #[test]
    fn known_tags_never_become_unknown() {
        for tag in ["thought", "task", "connector:web", "action:taken:click"] {
            assert!(!matches!(
                ObservationSource::from(tag),
                ObservationSource::Other(_)
            ));
        }
    }

    #[test]
    fn authored_classes() {
        assert!(ObservationSource::action_taken("click").is_authored());
        assert!(ObservationSource::Thought.is_authored());
        assert!(!ObservationSource::action_result("click").is_authored());
        assert!(!ObservationSource::connector("web").is_authored());
        assert!(!ObservationSource::Task.is_authored());
        assert!(!ObservationSource::from("x").is_authored());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ObservationSource::action_taken("click")).unwrap();
        assert_eq!(json, "\"action:taken:click\"");
        let back: ObservationSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ObservationSource::action_taken("click"));

        let json = serde_json::to_string(&ObservationSource::from("connector:")).unwrap();
        assert_eq!(json, "\"connector:\"");
    }
}
