//! Ambient inputs consumed by the resolver.
//!
//! The process environment is read exactly once, at the edge, through
//! [`EnvironmentInputs::from_env`]. Resolution itself only ever sees the
//! explicit [`EnvironmentInputs`] value it is handed.
//!
//! Precedence when several sources are combined:
//!
//! 1. explicit input (for example a CLI flag), via [`EnvironmentInputs::overlay`]
//! 2. ambient environment variables
//! 3. provider default (account/region left unspecified, API key placeholder)

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable holding the target account id.
pub const ACCOUNT_ENV_VAR: &str = "CDK_DEFAULT_ACCOUNT";

/// Environment variable holding the target region.
pub const REGION_ENV_VAR: &str = "CDK_DEFAULT_REGION";

/// Environment variable holding the tracing API key.
pub const API_KEY_ENV_VAR: &str = "DD_API_KEY";

/// Optional account, region and API key supplied to the resolver.
///
/// Blank strings are normalized to `None` so that `FOO=` in a shell behaves
/// the same as an unset variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInputs {
    pub account: Option<String>,
    pub region: Option<String>,
    pub api_key: Option<String>,
}

impl EnvironmentInputs {
    pub fn new(
        account: Option<String>,
        region: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            account: non_blank(account),
            region: non_blank(region),
            api_key: non_blank(api_key),
        }
    }

    /// Read inputs from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read inputs through an arbitrary lookup function.
    ///
    /// Useful for tests and for callers that source configuration from
    /// somewhere other than the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup(ACCOUNT_ENV_VAR),
            lookup(REGION_ENV_VAR),
            lookup(API_KEY_ENV_VAR),
        )
    }

    /// Layer `explicit` on top of `self`; any value present in `explicit` wins.
    pub fn overlay(self, explicit: EnvironmentInputs) -> Self {
        let explicit = Self::new(explicit.account, explicit.region, explicit.api_key);
        Self {
            account: explicit.account.or(self.account),
            region: explicit.region.or(self.region),
            api_key: explicit.api_key.or(self.api_key),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Account and region the stack deploys into.
///
/// `None` means "unspecified": the provisioning engine fills it in from its
/// own ambient context. Values are never validated locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTarget {
    pub account: Option<String>,
    pub region: Option<String>,
}

/// An input that was absent and fell back to its documented default.
///
/// This is informational only; defaulting never fails resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultedSetting {
    Account,
    Region,
    ApiKey,
}

impl fmt::Display for DefaultedSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DefaultedSetting::Account => "account (provider default)",
            DefaultedSetting::Region => "region (provider default)",
            DefaultedSetting::ApiKey => "api key (placeholder)",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_all_three_variables() {
        let inputs = EnvironmentInputs::from_lookup(lookup_from(&[
            (ACCOUNT_ENV_VAR, "111122223333"),
            (REGION_ENV_VAR, "us-west-2"),
            (API_KEY_ENV_VAR, "abcd"),
        ]));
        assert_eq!(inputs.account.as_deref(), Some("111122223333"));
        assert_eq!(inputs.region.as_deref(), Some("us-west-2"));
        assert_eq!(inputs.api_key.as_deref(), Some("abcd"));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let inputs = EnvironmentInputs::from_lookup(lookup_from(&[
            (ACCOUNT_ENV_VAR, ""),
            (API_KEY_ENV_VAR, "   "),
        ]));
        assert_eq!(inputs, EnvironmentInputs::default());
    }

    #[test]
    fn explicit_values_win_over_ambient() {
        let ambient = EnvironmentInputs::new(
            Some("111122223333".into()),
            Some("us-east-1".into()),
            Some("ambient-key".into()),
        );
        let explicit = EnvironmentInputs::new(None, Some("eu-west-1".into()), Some("".into()));

        let merged = ambient.overlay(explicit);
        assert_eq!(merged.account.as_deref(), Some("111122223333"));
        assert_eq!(merged.region.as_deref(), Some("eu-west-1"));
        assert_eq!(merged.api_key.as_deref(), Some("ambient-key"));
    }

    #[test]
    fn malformed_values_pass_through() {
        let inputs = EnvironmentInputs::new(Some("not-an-account".into()), Some("???".into()), None);
        assert_eq!(inputs.account.as_deref(), Some("not-an-account"));
        assert_eq!(inputs.region.as_deref(), Some("???"));
    }
}
