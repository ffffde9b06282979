use std::{fmt::Display, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How the budget summary is kept in step with the ledger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStrategy {
    /// Fold the ledger on every read. Reads are O(n) but can never be stale.
    #[default]
    Recompute,
    /// Adjust a stored summary on every write, in the same SQL transaction as
    /// the ledger change. Reads are O(1).
    Incremental,
}

impl Display for SummaryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryStrategy::Recompute => write!(f, "recompute"),
            SummaryStrategy::Incremental => write!(f, "incremental"),
        }
    }
}

impl FromStr for SummaryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recompute" => Ok(SummaryStrategy::Recompute),
            "incremental" => Ok(SummaryStrategy::Incremental),
            other => Err(format!(
                "unknown summary strategy \"{other}\", expected \"recompute\" or \"incremental\""
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SummaryStrategy;

    #[test]
    fn defaults_to_recompute() {
        assert_eq!(SummaryStrategy::default(), SummaryStrategy::Recompute);
    }

    #[test]
    fn display_and_parse_agree() {
        for strategy in [SummaryStrategy::Recompute, SummaryStrategy::Incremental] {
            assert_eq!(strategy.to_string().parse(), Ok(strategy));
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("eventual".parse::<SummaryStrategy>().is_err());
    }
}
