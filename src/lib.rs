//! # Repayment Waterfall
//!
//! Allocates loan repayments against loan batches and cascades any excess
//! down the batch list.
//!
//! ## Design Principles
//!
//! - **Exact arithmetic**: amounts are fixed 4 decimal place `rust_decimal` values
//! - **Two passes**: direct reference matching, then an iterative waterfall
//! - **First match wins**: batch list order decides where money lands
//! - **Infallible engine**: unmatched money is routed, never rejected
//!
//! ## Example
//!
//! ```
//! use repayment_waterfall::{Batch, Money, Repayment, WaterfallEngine};
//!
//! let batches = vec![Batch::new("A", Money::from(50)), Batch::new("B", Money::from(80))];
//! let repayments = vec![Repayment::new("A", Money::from(70))];
//!
//! let result = WaterfallEngine::default().allocate(&repayments, batches);
//! assert_eq!(result.batches[0].balance(), Some(Money::ZERO));
//! assert_eq!(result.batches[1].balance(), Some(Money::from(60)));
//! ```

pub mod allocation;
pub mod batch;
pub mod columns;
pub mod config;
pub mod error;
pub mod ingest;
pub mod money;
pub mod report;
pub mod repayment;

pub use allocation::{AllocationResult, DirectAllocation, WaterfallEngine};
pub use batch::{Application, Batch, BatchState};
pub use config::{AllocationOptions, CliArgs, InputSource, MissingReferencePolicy};
pub use error::{Result, WaterfallError};
pub use money::{Money, MoneyError};
pub use repayment::Repayment;
