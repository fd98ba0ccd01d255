//! Location data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hierarchy levels from most to least specific.
///
/// Clients may send any level name; these are the ones used when picking a
/// label to display.
pub const LEVELS: [&str; 9] = [
    "address",
    "street",
    "neighborhood",
    "city",
    "county",
    "state",
    "country",
    "continent",
    "planet",
];

/// The plaintext location a sender seals for one recipient.
///
/// The server never sees this type; it only stores the sealed blob.
///
/// # Wire Format
///
/// ```text
/// {"hierarchy": {"city": "Seattle", "country": "USA"},
///  "namedLocation": "Home",
///  "timestamp": "2026-01-01T12:00:00Z"}
/// ```
///
/// `namedLocation` is omitted when absent.
///
/// # Example
///
/// ```
/// use whereish_core::location::LocationData;
///
/// let location = LocationData::new()
///     .with_level("city", "Seattle")
///     .with_level("country", "USA")
///     .with_named_location("Home");
///
/// assert_eq!(location.most_specific(), Some(("city", "Seattle")));
/// assert_eq!(location.display_label(), "Home (Seattle)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    /// Level name to place name, e.g. `"city" -> "Seattle"`.
    pub hierarchy: BTreeMap<String, String>,

    /// User-defined place name such as "Home" or "Office".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_location: Option<String>,

    /// When the location was recorded (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Default for LocationData {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationData {
    /// Creates an empty location stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hierarchy: BTreeMap::new(),
            named_location: None,
            timestamp: Utc::now(),
        }
    }

    /// Sets one hierarchy level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>, value: impl Into<String>) -> Self {
        self.hierarchy.insert(level.into(), value.into());
        self
    }

    /// Sets the named location. Blank names are treated as absent.
    #[must_use]
    pub fn with_named_location(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.named_location = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// Overrides the timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builds a location from `level=value` pairs, ignoring malformed ones.
    ///
    /// ```
    /// use whereish_core::location::LocationData;
    ///
    /// let location = LocationData::from_pairs(["country=USA", "city=Seattle", "junk"]);
    /// assert_eq!(location.hierarchy.len(), 2);
    /// ```
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Self {
        pairs
            .into_iter()
            .filter_map(|pair| pair.split_once('='))
            .filter(|(level, _)| !level.trim().is_empty())
            .fold(Self::new(), |location, (level, value)| {
                location.with_level(level.trim(), value.trim())
            })
    }

    /// Returns the most specific known level that has a value.
    #[must_use]
    pub fn most_specific(&self) -> Option<(&'static str, &str)> {
        LEVELS.iter().find_map(|level| {
            self.hierarchy
                .get(*level)
                .filter(|value| !value.is_empty())
                .map(|value| (*level, value.as_str()))
        })
    }

    /// Human-readable label: `"<named> (<most specific>)"`, either part
    /// alone, or `"Unknown"`.
    #[must_use]
    pub fn display_label(&self) -> String {
        let place = self.most_specific().map(|(_, value)| value);
        match (self.named_location.as_deref(), place) {
            (Some(named), Some(place)) => format!("{named} ({place})"),
            (Some(named), None) => named.to_string(),
            (None, Some(place)) => place.to_string(),
            (None, None) => "Unknown".to_string(),
        }
    }

    /// Serializes to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or missing required fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
