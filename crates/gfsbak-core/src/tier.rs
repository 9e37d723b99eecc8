use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GfsbakError;

/// One GFS retention tier, ordered from most-volatile to least-volatile.
///
/// The derived `Ord` is load-bearing: `Daily < Weekly < Monthly < Annually`,
/// and the scheduler cascades from coarser tiers down to the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
    Annually,
}

impl Tier {
    /// All tiers, most-volatile first.
    pub const ALL: [Tier; 4] = [Tier::Daily, Tier::Weekly, Tier::Monthly, Tier::Annually];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
            Tier::Annually => "annually",
        }
    }

    /// The tier an instance of this tier chains from when no sibling exists.
    pub fn parent_tier(self) -> Option<Tier> {
        match self {
            Tier::Daily => Some(Tier::Weekly),
            Tier::Weekly => Some(Tier::Monthly),
            Tier::Monthly | Tier::Annually => None,
        }
    }

    /// Timestamp label for an instance produced at `now`.
    ///
    /// All labels are fixed-width calendar fields, so lexicographic ordering
    /// of labels is chronological ordering. Retention and chain resolution
    /// both rely on this.
    pub fn label(self, now: DateTime<Utc>) -> String {
        match self {
            Tier::Daily => format!("{:04}-{:02}-{:02}", now.year(), now.month(), now.day()),
            Tier::Weekly => {
                let week = now.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Tier::Monthly => format!("{:04}-{:02}", now.year(), now.month()),
            Tier::Annually => format!("{:04}", now.year()),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = GfsbakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Tier::Daily),
            "weekly" => Ok(Tier::Weekly),
            "monthly" => Ok(Tier::Monthly),
            "annually" | "yearly" => Ok(Tier::Annually),
            other => Err(GfsbakError::Config(format!(
                "unrecognized tier '{other}' (expected daily, weekly, monthly or annually)"
            ))),
        }
    }
}
