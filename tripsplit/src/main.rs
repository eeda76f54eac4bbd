#![warn(clippy::uninlined_format_args)]

mod bootstrap;
mod cli;

use bootstrap::{AppConfig, init_logging};
use cli::CliArgs;
use std::{borrow::Cow, env, process};
use tripsplit_application::{LedgerService, TripLedgerReport};
use tripsplit_infrastructure::{GreedySettlementOptimizer, LedgerDocument};
use tripsplit_presentation::{LedgerPresenter, format_service_error};

type CliResult<T> = Result<T, Cow<'static, str>>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    init_logging();
    let args = CliArgs::parse(env::args().skip(1))?;
    let config = AppConfig::from_env()?;

    let document = LedgerDocument::from_path(&args.path)
        .map_err(|err| format!("Failed to load '{}': {err}", args.path))?;
    let trip_ids = match args.trip_id {
        Some(trip_id) => vec![trip_id],
        None => document.trip_ids(),
    };
    if trip_ids.is_empty() {
        return Err(format!("'{}' contains no trips", args.path).into());
    }
    let store = document
        .into_store()
        .map_err(|err| format!("Failed to load '{}': {err}", args.path))?;

    let optimizer = GreedySettlementOptimizer;
    let service = LedgerService::new(&store, &optimizer, config.ledger);
    let reports = trip_ids
        .iter()
        .map(|trip_id| {
            service.build_report(trip_id).map_err(|err| {
                tracing::error!(trip_id = %trip_id, error = ?err, "Failed to compute trip ledger");
                Cow::Owned(format_service_error(&err))
            })
        })
        .collect::<CliResult<Vec<_>>>()?;

    if args.json {
        print_json(&reports)
    } else {
        let presenter = LedgerPresenter::new(service.settings().settlement_context());
        print_text(&presenter, &reports);
        Ok(())
    }
}

fn print_json(reports: &[TripLedgerReport]) -> CliResult<()> {
    let output = serde_json::to_string_pretty(reports)
        .map_err(|err| format!("Failed to serialize report: {err}"))?;
    println!("{output}");
    Ok(())
}

fn print_text(presenter: &LedgerPresenter, reports: &[TripLedgerReport]) {
    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print!("{}", presenter.render(report).to_text());
    }
}
