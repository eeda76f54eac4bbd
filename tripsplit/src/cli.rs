use std::borrow::Cow;
use tripsplit_domain::TripId;

pub const USAGE: &str = "Usage: tripsplit <ledger.json> [trip_id] [--json]";

#[derive(Debug, PartialEq, Eq)]
pub struct CliArgs {
    pub path: String,
    /// Report every trip in the document when absent.
    pub trip_id: Option<TripId>,
    pub json: bool,
}

impl CliArgs {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, Cow<'static, str>> {
        let mut positional = Vec::new();
        let mut json = false;

        for arg in args {
            match arg.as_str() {
                "--json" => json = true,
                "-h" | "--help" => return Err(USAGE.into()),
                flag if flag.starts_with("--") => {
                    return Err(format!("Unknown option '{flag}'\n{USAGE}").into());
                }
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let Some(path) = positional.next() else {
            return Err(USAGE.into());
        };
        let trip_id = positional.next().map(TripId::new);
        if let Some(extra) = positional.next() {
            return Err(format!("Unexpected argument '{extra}'\n{USAGE}").into());
        }

        Ok(Self {
            path,
            trip_id,
            json,
        })
    }
}
