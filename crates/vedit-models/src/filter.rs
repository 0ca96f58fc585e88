//! Filter and region definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available backend filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Convert to black and white
    Grayscale,
    /// Gaussian blur
    Blur,
    /// Vintage sepia tone
    Sepia,
}

impl FilterKind {
    /// All available filters.
    pub const ALL: &'static [FilterKind] = &[FilterKind::Grayscale, FilterKind::Blur, FilterKind::Sepia];

    /// Wire name, as used in request payloads and preview ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Blur => "blur",
            FilterKind::Sepia => "sepia",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterKind::Grayscale => "Grayscale",
            FilterKind::Blur => "Blur",
            FilterKind::Sepia => "Sepia",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grayscale" => Ok(FilterKind::Grayscale),
            "blur" => Ok(FilterKind::Blur),
            "sepia" => Ok(FilterKind::Sepia),
            _ => Err(FilterParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown filter: {0}")]
pub struct FilterParseError(String);

/// Where the backend applies the selected filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplyRegion {
    /// Filter everything except detected persons
    #[default]
    Background,
    /// Filter detected persons only
    Person,
}

impl ApplyRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyRegion::Background => "background",
            ApplyRegion::Person => "person",
        }
    }
}

impl fmt::Display for ApplyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplyRegion {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "background" => Ok(ApplyRegion::Background),
            "person" => Ok(ApplyRegion::Person),
            _ => Err(RegionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown apply region: {0}")]
pub struct RegionParseError(String);

/// What the backend does with frames where no person is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoPersonPolicy {
    /// Leave the frame untouched
    #[default]
    KeepOriginal,
    /// Apply the filter to the whole frame
    FilterAll,
}

impl NoPersonPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoPersonPolicy::KeepOriginal => "keep_original",
            NoPersonPolicy::FilterAll => "filter_all",
        }
    }
}

impl fmt::Display for NoPersonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
