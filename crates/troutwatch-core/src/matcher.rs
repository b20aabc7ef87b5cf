//! Sensor name matching.
//!
//! The data producer labels readings with free-text names ("Temp eau
//! truites", "Température air", ...). The alert tiles need to pick one
//! specific reading out of that list, so each alert carries a
//! [`SensorMatcher`]: an ordered list of predicates over the lower-cased
//! reading name, all of which must hold. Swapping vocabularies means
//! building a different matcher, not touching the controller.

use std::fmt;
use std::sync::Arc;

use crate::reading::Reading;

/// Predicate over a lower-cased reading name.
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Ordered conjunction of name predicates.
///
/// A matcher with no predicates matches nothing.
#[derive(Clone, Default)]
pub struct SensorMatcher {
    predicates: Vec<NamePredicate>,
}

impl SensorMatcher {
    /// Create an empty matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary predicate. It receives the lower-cased name.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(predicate));
        self
    }

    /// Append a predicate that holds when the name contains any of
    /// `tokens` (case-insensitive substring match).
    #[must_use]
    pub fn requiring_any<S: AsRef<str>>(self, tokens: &[S]) -> Self {
        let tokens: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self.with_predicate(move |name| tokens.iter().any(|t| name.contains(t.as_str())))
    }

    /// Build a matcher from token groups: every group must contribute at
    /// least one token found in the name.
    pub fn from_token_groups<S: AsRef<str>>(groups: &[Vec<S>]) -> Self {
        groups
            .iter()
            .fold(Self::new(), |matcher, group| matcher.requiring_any(group.as_slice()))
    }

    /// The water-temperature sensor of the trout tank.
    pub fn water_trout() -> Self {
        Self::new()
            .requiring_any(&["eau", "water"])
            .requiring_any(&["truit", "trout"])
    }

    /// The air-temperature sensor.
    pub fn air_temperature() -> Self {
        Self::new()
            .requiring_any(&["air"])
            .requiring_any(&["temp"])
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether the matcher has no predicates (and so matches nothing).
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether `name` satisfies every predicate.
    pub fn matches(&self, name: &str) -> bool {
        if self.predicates.is_empty() {
            return false;
        }
        let lowered = name.to_lowercase();
        self.predicates.iter().all(|p| p(&lowered))
    }

    /// First reading whose name matches, in iteration order.
    pub fn find<'a, I>(&self, readings: I) -> Option<&'a Reading>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        readings.into_iter().find(|r| self.matches(&r.name))
    }
}

impl fmt::Debug for SensorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorMatcher")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::parse_readings;

    #[test]
    fn water_matcher_needs_both_tokens() {
        let m = SensorMatcher::water_trout();
        assert!(m.matches("Temp eau truites"));
        assert!(m.matches("TEMPÉRATURE EAU TRUITE"));
        assert!(m.matches("Trout water"));
        assert!(!m.matches("Temp eau"));
        assert!(!m.matches("Truites"));
    }

    #[test]
    fn air_matcher() {
        let m = SensorMatcher::air_temperature();
        assert!(m.matches("Temp air"));
        assert!(m.matches("Température Air"));
        assert!(m.matches("air temperature"));
        assert!(!m.matches("Air pressure"));
    }

    #[test]
    fn first_match_wins() {
        let readings = parse_readings("Temp air = 9 C\nTemp air (backup) = 12 C\n");
        let found = SensorMatcher::air_temperature().find(&readings);
        assert_eq!(found.map(|r| r.raw.as_str()), Some("9 C"));
    }

    #[test]
    fn no_match_returns_none() {
        let readings = parse_readings("Pression = 1013 hPa\n");
        assert!(SensorMatcher::water_trout().find(&readings).is_none());
    }

    #[test]
    fn empty_matcher_matches_nothing() {
        let m = SensorMatcher::new();
        assert!(m.is_empty());
        assert!(!m.matches("anything"));
    }

    #[test]
    fn custom_predicate_and_groups() {
        let m = SensorMatcher::from_token_groups(&[vec!["Pool"], vec!["ph", "acidity"]])
            .with_predicate(|name| !name.contains("backup"));
        assert_eq!(m.len(), 3);
        assert!(m.matches("Pool pH"));
        assert!(!m.matches("Pool pH backup"));
        assert!(!m.matches("Pool temperature"));
    }
}
