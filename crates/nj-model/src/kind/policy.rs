use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// What the dispatcher does when a remote command exits unsuccessfully.
///
/// "Unsuccessfully" means a non-zero exit code, death by signal, or an exit status
/// that could not be collected at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Stop the whole run: no further jobs are assigned and no summary is produced.
    #[default]
    Abort,
    /// Log the failure, count it, and keep dispatching.
    Ignore,
}

impl FailurePolicy {
    /// Returns `true` if a failed job ends the run.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailurePolicy::Abort)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Ignore => "ignore",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "abort" | "fail" => Ok(FailurePolicy::Abort),
            "ignore" | "continue" => Ok(FailurePolicy::Ignore),
            _ => Err(ModelError::InvalidPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_abort() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
        assert!(FailurePolicy::default().is_fatal());
        assert!(!FailurePolicy::Ignore.is_fatal());
    }

    #[test]
    fn parse_accepts_aliases_and_case() {
        assert_eq!(" Abort ".parse::<FailurePolicy>(), Ok(FailurePolicy::Abort));
        assert_eq!("continue".parse::<FailurePolicy>(), Ok(FailurePolicy::Ignore));
        assert_eq!(
            "retry".parse::<FailurePolicy>(),
            Err(ModelError::InvalidPolicy("retry".into()))
        );
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&FailurePolicy::Ignore).unwrap();
        assert_eq!(json, r#""ignore""#);
    }
}
