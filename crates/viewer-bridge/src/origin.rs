//! Change-origin tracking for two-way bound properties
//!
//! When the viewer reports "zoom is now 150" and the host writes that same
//! value straight back, the bridge must not send it to the viewer again.
//! Each property has one slot holding the origin of its latest change and
//! the turn it happened in; the mark is only visible during that turn.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundProperty {
    Page,
    Zoom,
    Rotation,
    Cursor,
    Scroll,
    Spread,
    PageMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeOrigin {
    /// Reported by the viewer (the user interacted with it)
    User,
    /// Set by the host
    Programmatic,
}

/// A two-way property changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub property: BoundProperty,
    pub value: Value,
    pub origin: ChangeOrigin,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ChangeOriginTracker {
    marks: HashMap<BoundProperty, (ChangeOrigin, u64)>,
    turn: u64,
}

impl ChangeOriginTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_user_initiated(&mut self, property: BoundProperty) {
        self.marks.insert(property, (ChangeOrigin::User, self.turn));
    }

    pub fn mark_programmatic(&mut self, property: BoundProperty) {
        self.marks.insert(property, (ChangeOrigin::Programmatic, self.turn));
    }

    pub fn origin_of(&self, property: BoundProperty) -> Option<ChangeOrigin> {
        self.marks
            .get(&property)
            .filter(|(_, turn)| *turn == self.turn)
            .map(|(origin, _)| *origin)
    }

    pub fn is_user_initiated(&self, property: BoundProperty) -> bool {
        self.origin_of(property) == Some(ChangeOrigin::User)
    }

    pub fn is_programmatic(&self, property: BoundProperty) -> bool {
        self.origin_of(property) == Some(ChangeOrigin::Programmatic)
    }

    /// Start a new turn; every mark from the previous turn expires
    pub fn tick(&mut self) {
        self.turn = self.turn.wrapping_add(1);
        self.marks.clear();
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_visible_until_tick() {
        let mut tracker = ChangeOriginTracker::new();
        tracker.mark_user_initiated(BoundProperty::Zoom);
        assert!(tracker.is_user_initiated(BoundProperty::Zoom));
        assert!(!tracker.is_programmatic(BoundProperty::Zoom));

        tracker.tick();
        assert!(!tracker.is_user_initiated(BoundProperty::Zoom));
        assert_eq!(tracker.origin_of(BoundProperty::Zoom), None);
    }

    #[test]
    fn test_latest_mark_wins() {
        let mut tracker = ChangeOriginTracker::new();
        tracker.mark_user_initiated(BoundProperty::Page);
        tracker.mark_programmatic(BoundProperty::Page);
        assert!(tracker.is_programmatic(BoundProperty::Page));
        assert!(!tracker.is_user_initiated(BoundProperty::Page));
    }

    #[test]
    fn test_properties_are_independent() {
        let mut tracker = ChangeOriginTracker::new();
        tracker.mark_user_initiated(BoundProperty::Rotation);
        assert!(!tracker.is_user_initiated(BoundProperty::Zoom));
        assert!(tracker.is_user_initiated(BoundProperty::Rotation));
    }
}
