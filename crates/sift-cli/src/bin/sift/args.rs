//! Command-line arguments accepted by the `sift` binary.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sift_core::{CaseMode, FieldRange, SearchOptions};

#[derive(Parser, Debug)]
#[command(
	name = "sift",
	version,
	about = "Streaming fuzzy filter for candidate lines on stdin"
)]
pub(crate) struct CliArgs {
	#[arg(
		short = 'f',
		long = "filter",
		value_name = "QUERY",
		help = "Query to match against candidate lines"
	)]
	pub(crate) filter: String,
	#[arg(
		long = "no-sort",
		help = "Print matches in insertion order instead of by relevance"
	)]
	pub(crate) no_sort: bool,
	#[arg(
		long = "no-extended",
		help = "Treat the whole query as a single fuzzy term"
	)]
	pub(crate) no_extended: bool,
	#[arg(
		long = "case",
		value_enum,
		default_value_t = CaseArg::Smart,
		help = "Case sensitivity mode"
	)]
	pub(crate) case: CaseArg,
	#[arg(
		long = "with-nth",
		value_delimiter = ',',
		value_name = "RANGE",
		allow_hyphen_values = true,
		help = "Match and display only these whitespace-delimited fields (e.g. 2,-1,3..)"
	)]
	pub(crate) with_nth: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum CaseArg {
	Smart,
	Sensitive,
	Insensitive,
}

impl From<CaseArg> for CaseMode {
	fn from(case: CaseArg) -> Self {
		match case {
			CaseArg::Smart => CaseMode::Smart,
			CaseArg::Sensitive => CaseMode::Sensitive,
			CaseArg::Insensitive => CaseMode::Insensitive,
		}
	}
}

impl CliArgs {
	/// Engine options implied by the flags.
	pub(crate) fn search_options(&self) -> SearchOptions {
		SearchOptions {
			sort: !self.no_sort,
			extended: !self.no_extended,
			case_mode: self.case.into(),
			limit: 0,
		}
	}

	/// Parsed `--with-nth` field ranges.
	pub(crate) fn field_ranges(&self) -> Result<Vec<FieldRange>> {
		self.with_nth
			.iter()
			.map(|raw| {
				raw.parse::<FieldRange>()
					.with_context(|| format!("--with-nth {raw}"))
			})
			.collect()
	}
}

/// Parse the process arguments.
pub(crate) fn parse_cli() -> CliArgs {
	CliArgs::parse()
}
