//! Plan horizon: the time window a generated plan should span.

use std::fmt;
use std::str::FromStr;

/// Time window for a generated plan.
///
/// Only two buckets exist. The permissive mapping ([`Horizon::from_selector`])
/// treats every selector other than `"today"` as [`Horizon::Week`]; the strict
/// parse ([`FromStr`]) accepts exactly `"today"` and `"week"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Today,
    Week,
}

impl Horizon {
    /// Map a caller-supplied selector onto a bucket without rejecting anything.
    pub fn from_selector(selector: &str) -> Self {
        if selector == "today" {
            Self::Today
        } else {
            Self::Week
        }
    }

    /// Phrase used in the user instruction ("spread until <text>").
    pub fn deadline_text(self) -> &'static str {
        match self {
            Self::Today => "end of today",
            Self::Week => "end of this week",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Today => "today",
            Self::Week => "week",
        };
        f.write_str(s)
    }
}

impl FromStr for Horizon {
    type Err = HorizonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            other => Err(HorizonParseError(other.to_owned())),
        }
    }
}

/// Error returned when strictly parsing an invalid [`Horizon`] string.
#[derive(Debug, Clone)]
pub struct HorizonParseError(pub String);

impl fmt::Display for HorizonParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid horizon: {:?} (expected \"today\" or \"week\")", self.0)
    }
}

impl std::error::Error for HorizonParseError {}
