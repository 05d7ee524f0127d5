// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event name patterns and subscriptions

/// Pattern over `:`-separated event names
///
///   - Exact: "part:placed"
///   - Single segment wildcard: "part:*" matches "part:placed", "part:picked"
///   - Remainder wildcard: "machine:**" matches every machine event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPattern {
    raw: String,
    segments: Vec<String>,
}

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            segments: if pattern.is_empty() {
                Vec::new()
            } else {
                pattern.split(':').map(str::to_string).collect()
            },
        }
    }

    /// Pattern matching every event
    pub fn all() -> Self {
        Self::new("**")
    }

    pub fn matches(&self, event_name: &str) -> bool {
        // Empty pattern matches nothing
        if self.segments.is_empty() {
            return false;
        }
        let event: Vec<&str> = event_name.split(':').collect();
        Self::match_segments(&self.segments, &event)
    }

    fn match_segments(pattern: &[String], event: &[&str]) -> bool {
        match (pattern.first().map(String::as_str), event.first()) {
            (None, None) => true,
            (Some("**"), _) => true,
            (Some("*"), Some(_)) => Self::match_segments(&pattern[1..], &event[1..]),
            (Some(p), Some(e)) if p == *e => Self::match_segments(&pattern[1..], &event[1..]),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Subscriber handle for unsubscribing
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named interest in a set of event patterns
#[derive(Clone, Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub patterns: Vec<EventPattern>,
    pub description: String,
}

impl Subscription {
    pub fn new(
        id: impl Into<String>,
        patterns: Vec<EventPattern>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: SubscriberId(id.into()),
            patterns,
            description: description.into(),
        }
    }

    /// Subscription to every event
    pub fn all(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(id, vec![EventPattern::all()], description)
    }

    pub fn matches(&self, event_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(event_name))
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
