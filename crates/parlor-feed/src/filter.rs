//! Hidden-sender policy.
//!
//! Messages from backend-internal roles (system, summarizer digests) satisfy
//! transport acknowledgment but are never shown; they are filtered on every
//! insertion path before an entry can reach the visible feed.

use std::collections::HashSet;

use crate::entry::Sender;

/// The set of senders whose messages stay out of the visible feed.
///
/// Matching is case-insensitive: `exact` compares whole names, `fragments`
/// match anywhere in the name (deployments localize the summarizer label, so
/// the vocabulary is configuration rather than code).
#[derive(Debug, Clone)]
pub struct HiddenSenders {
    exact: HashSet<String>,
    fragments: Vec<String>,
}

impl Default for HiddenSenders {
    fn default() -> Self {
        Self::new(["system"], ["summarizer"])
    }
}

impl HiddenSenders {
    pub fn new<E, F>(exact: E, fragments: F) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            exact: exact
                .into_iter()
                .map(|s| s.into().trim().to_lowercase())
                .collect(),
            fragments: fragments
                .into_iter()
                .map(|s| s.into().trim().to_lowercase())
                .collect(),
        }
    }

    /// An empty set hides nothing.
    pub fn none() -> Self {
        Self {
            exact: HashSet::new(),
            fragments: Vec::new(),
        }
    }

    pub fn is_hidden(&self, sender: &Sender) -> bool {
        let name = sender.as_str().trim();
        if name.is_empty() {
            return false;
        }
        let lower = name.to_lowercase();
        self.exact.contains(&lower) || self.fragments.iter().any(|f| lower.contains(f.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hides_system() {
        let hidden = HiddenSenders::default();
        assert!(hidden.is_hidden(&Sender::System));
        assert!(hidden.is_hidden(&Sender::Named("System".into())));
    }

    #[test]
    fn test_default_hides_summarizer_fragment() {
        let hidden = HiddenSenders::default();
        assert!(hidden.is_hidden(&Sender::Named("Summarizer".into())));
        assert!(hidden.is_hidden(&Sender::Named("Weekly Summarizer Digest".into())));
    }

    #[test]
    fn test_default_shows_user_and_agents() {
        let hidden = HiddenSenders::default();
        assert!(!hidden.is_hidden(&Sender::User));
        assert!(!hidden.is_hidden(&Sender::Agent));
        assert!(!hidden.is_hidden(&Sender::Named("Dr. Quill".into())));
    }

    #[test]
    fn test_custom_set() {
        let hidden = HiddenSenders::new(["moderator"], Vec::<String>::new());
        assert!(hidden.is_hidden(&Sender::Named("Moderator".into())));
        assert!(!hidden.is_hidden(&Sender::System));
    }

    #[test]
    fn test_none_hides_nothing() {
        assert!(!HiddenSenders::none().is_hidden(&Sender::System));
    }
}
