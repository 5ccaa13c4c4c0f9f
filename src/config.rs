//! Allocation options and command-line arguments.

use crate::error::{Result, WaterfallError};
use std::path::PathBuf;

/// What to do with a repayment that carries no batch reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingReferencePolicy {
    /// Drop it. It shows up in neither the applied nor the unapplied totals.
    #[default]
    Drop,

    /// Route it to the unapplied repayments list.
    RouteToUnapplied,
}

/// Knobs for a single allocation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationOptions {
    pub missing_reference: MissingReferencePolicy,
}

impl AllocationOptions {
    /// Options that route reference-less repayments to the unapplied list.
    pub fn route_unreferenced() -> Self {
        AllocationOptions {
            missing_reference: MissingReferencePolicy::RouteToUnapplied,
        }
    }
}

/// Where the two sheets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// One spreadsheet holding both sheets.
    Workbook(PathBuf),

    /// One CSV file per sheet.
    Sheets {
        repayments: PathBuf,
        batches: PathBuf,
    },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub input: InputSource,
    pub options: AllocationOptions,
}

impl CliArgs {
    /// Flag selecting `MissingReferencePolicy::RouteToUnapplied`.
    pub const ROUTE_UNREFERENCED_FLAG: &'static str = "--route-unreferenced";

    /// Parses arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = AllocationOptions::default();
        let mut paths = Vec::new();

        for arg in args {
            if arg == Self::ROUTE_UNREFERENCED_FLAG {
                options.missing_reference = MissingReferencePolicy::RouteToUnapplied;
            } else if arg.starts_with("--") {
                return Err(WaterfallError::UnknownFlag(arg));
            } else {
                paths.push(PathBuf::from(arg));
            }
        }

        let mut paths = paths.into_iter();
        let input = match (paths.next(), paths.next(), paths.next()) {
            (None, _, _) => return Err(WaterfallError::MissingArgument),
            (Some(workbook), None, _) => InputSource::Workbook(workbook),
            (Some(repayments), Some(batches), None) => InputSource::Sheets {
                repayments,
                batches,
            },
            (_, _, Some(extra)) => {
                return Err(WaterfallError::UnexpectedArgument(
                    extra.display().to_string(),
                ))
            }
        };

        Ok(CliArgs { input, options })
    }
}
