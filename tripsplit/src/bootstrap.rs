use std::{borrow::Cow, env};
use tracing_subscriber::EnvFilter;
use tripsplit_application::LedgerSettings;
use tripsplit_domain::{InvalidRecordPolicy, RoundingMode};

const INVALID_RECORDS_VAR: &str = "TRIPSPLIT_INVALID_RECORDS";
const INCLUDE_IDLE_MEMBERS_VAR: &str = "TRIPSPLIT_INCLUDE_IDLE_MEMBERS";
const ROUNDING_VAR: &str = "TRIPSPLIT_ROUNDING";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings read from the environment (and `.env`, when present).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub ledger: LedgerSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Cow<'static, str>> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Cow<'static, str>> {
        let mut ledger = LedgerSettings::default();

        if let Some(raw) = lookup(INVALID_RECORDS_VAR) {
            ledger.invalid_records = raw
                .parse::<InvalidRecordPolicy>()
                .map_err(|err| format!("{INVALID_RECORDS_VAR}: {err}"))?;
        }
        if let Some(raw) = lookup(INCLUDE_IDLE_MEMBERS_VAR) {
            ledger.include_idle_members = parse_flag(&raw).ok_or_else(|| {
                format!("{INCLUDE_IDLE_MEMBERS_VAR}: expected true or false, got '{raw}'")
            })?;
        }
        if let Some(raw) = lookup(ROUNDING_VAR) {
            ledger.rounding_mode = raw
                .parse::<RoundingMode>()
                .map_err(|err| format!("{ROUNDING_VAR}: {err}"))?;
        }

        Ok(Self { ledger })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Initialize logging to stderr, filtered by `RUST_LOG`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, Cow<'static, str>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(config(&[]), Ok(AppConfig::default()));
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            (INVALID_RECORDS_VAR, "skip"),
            (INCLUDE_IDLE_MEMBERS_VAR, "yes"),
            (ROUNDING_VAR, "half-up"),
        ])
        .expect("valid config");

        assert_eq!(config.ledger.invalid_records, InvalidRecordPolicy::Skip);
        assert!(config.ledger.include_idle_members);
        assert_eq!(config.ledger.rounding_mode, RoundingMode::HalfUp);
    }

    #[rstest]
    #[case(INVALID_RECORDS_VAR, "ignore")]
    #[case(INCLUDE_IDLE_MEMBERS_VAR, "maybe")]
    #[case(ROUNDING_VAR, "down")]
    fn rejects_unknown_values(#[case] key: &str, #[case] value: &str) {
        let err = config(&[(key, value)]).expect_err("invalid value");
        assert!(err.starts_with(key));
    }
}
