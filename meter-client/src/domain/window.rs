use std::{fmt, str::FromStr};

use time::Duration;

/// Look-back windows offered for filtering and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowKind {
    Day,
    Week,
    Month,
    Year,
}

impl WindowKind {
    pub const ALL: [WindowKind; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    pub fn hours(self) -> i64 {
        match self {
            Self::Day => 24,
            Self::Week => 168,
            Self::Month => 730,
            Self::Year => 8760,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::hours(self.hours())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown window '{0}', expected day, week, month or year")]
pub struct UnknownWindow(pub String);

impl FromStr for WindowKind {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownWindow(s.to_string()))
    }
}
