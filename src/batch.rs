//! Loan batch model and the clip-or-consume application step.
//!
//! Once a batch is opened, `total_repayment_amount == total_amount_due - balance`
//! holds after every application of a non-negative amount.

use crate::columns;
use crate::money::Money;
use crate::repayment::Repayment;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Balance state of a batch.
///
/// A batch carries no balance until the first repayment reaches it. From then
/// on the balance is always derived from the previous balance minus the amount
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No repayment has been applied yet; the full `total_amount_due` is owed.
    Unopened,

    /// At least one repayment has been applied.
    Opened { balance: Money },
}

/// One loan advance with an amortizing balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Identifier matched against `Repayment::batch_reference`.
    pub reference: String,

    /// Original amount owed. Never changes after ingestion.
    pub total_amount_due: Money,

    pub state: BatchState,

    /// Records credited to this batch, each carrying its clipped amount.
    pub applied_repayments: Vec<Repayment>,

    /// Sum of `applied_repayments` amounts.
    pub total_repayment_amount: Money,

    /// Unrecognised columns in sheet order.
    pub passthrough: Vec<(String, String)>,
}

/// Outcome of applying one repayment record to a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Amount actually credited. May be zero or negative for odd input.
    pub applied: Money,

    /// Residual that the batch could not absorb.
    pub over_repayment: Option<Repayment>,
}

impl Batch {
    /// Creates an unopened batch with nothing applied.
    pub fn new(reference: impl Into<String>, total_amount_due: Money) -> Self {
        Batch {
            reference: reference.into(),
            total_amount_due,
            state: BatchState::Unopened,
            applied_repayments: Vec::new(),
            total_repayment_amount: Money::ZERO,
            passthrough: Vec::new(),
        }
    }

    /// What is still owed: the balance once opened, else the total amount due.
    pub fn current_due(&self) -> Money {
        match self.state {
            BatchState::Unopened => self.total_amount_due,
            BatchState::Opened { balance } => balance,
        }
    }

    /// The balance, or `None` if no repayment has reached this batch yet.
    pub fn balance(&self) -> Option<Money> {
        match self.state {
            BatchState::Unopened => None,
            BatchState::Opened { balance } => Some(balance),
        }
    }

    /// Returns `true` if the batch can still absorb money.
    pub fn is_outstanding(&self) -> bool {
        self.current_due().is_positive()
    }

    pub fn matches(&self, batch_reference: &str) -> bool {
        self.reference == batch_reference
    }

    /// Applies a repayment record, clipping it to what is currently owed.
    ///
    /// If the amount exceeds the current due the batch is settled to zero and
    /// the excess is returned as a derived over-repayment record. Only a
    /// strictly positive applied amount is recorded in `applied_repayments`.
    pub fn apply(&mut self, repayment: &Repayment) -> Application {
        let due = self.current_due();
        let remainder = due - repayment.amount;

        let (applied, over_repayment) = if remainder.is_negative() {
            self.state = BatchState::Opened {
                balance: Money::ZERO,
            };
            (due, Some(repayment.with_amount(remainder.abs())))
        } else {
            self.state = BatchState::Opened { balance: remainder };
            (repayment.amount, None)
        };

        if applied.is_positive() {
            self.applied_repayments.push(repayment.with_amount(applied));
            self.total_repayment_amount += applied;
        }

        Application {
            applied,
            over_repayment,
        }
    }
}

impl Serialize for Batch {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(columns::BATCH_REFERENCE, &self.reference)?;
        map.serialize_entry(columns::TOTAL_AMOUNT_DUE, &self.total_amount_due)?;
        for (key, value) in &self.passthrough {
            map.serialize_entry(key, value)?;
        }
        if let Some(balance) = self.balance() {
            map.serialize_entry(columns::BALANCE, &balance)?;
        }
        if !self.applied_repayments.is_empty() {
            map.serialize_entry(columns::REPAYMENTS, &self.applied_repayments)?;
            map.serialize_entry(columns::TOTAL_REPAYMENT_AMOUNT, &self.total_repayment_amount)?;
        }
        map.end()
    }
}
