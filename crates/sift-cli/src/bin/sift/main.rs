//! Command-line entry point for the sift stream filter.

mod args;
mod workflow;

use std::process::ExitCode;

use anyhow::Result;
use args::parse_cli;

fn main() -> Result<ExitCode> {
	let cli = parse_cli();
	let options = cli.search_options();
	let ranges = cli.field_ranges()?;

	let outcome = workflow::run_filter(&cli.filter, options, ranges)?;

	// Mirror the usual filter convention: succeed only when something matched.
	Ok(if outcome.matched > 0 {
		ExitCode::SUCCESS
	} else {
		ExitCode::from(1)
	})
}
