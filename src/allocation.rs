//! Repayment waterfall allocation engine.
//!
//! Allocation runs in two passes over a single, exclusively owned batch list:
//!
//! 1. **Direct pass**: each repayment is applied to the first batch whose
//!    reference matches its own. Excess over what the batch owed becomes an
//!    over-repayment record.
//! 2. **Cascade pass**: over-repayments are applied, round by round, to the
//!    first batch that still owes anything, regardless of reference. Excess
//!    from one round feeds the next. Once every batch is settled the rest is
//!    parked as unapplied over-repayments.
//!
//! Both passes use first-match scanning in list order, so the outcome is
//! deterministic but order dependent. The engine is synchronous and never
//! fails.

use crate::batch::Batch;
use crate::columns;
use crate::config::{AllocationOptions, MissingReferencePolicy};
use crate::money::Money;
use crate::repayment::Repayment;
use log::{debug, info};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Output of the direct pass. Batches are mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectAllocation {
    /// Excess amounts, in the order they were produced.
    pub over_repayments: Vec<Repayment>,

    /// Repayments whose reference matched no batch.
    pub unapplied_repayments: Vec<Repayment>,
}

/// Final state of an allocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationResult {
    /// Repayments whose batch reference matched nothing.
    pub unapplied_repayments: Vec<Repayment>,

    /// Excess that no batch could absorb.
    pub unapplied_over_repayments: Vec<Repayment>,

    pub batches: Vec<Batch>,
    pub batch_count: usize,
    pub total_repayment_amount: Money,
    pub total_unapplied_repayment_amount: Money,
    pub total_unapplied_over_repayment_amount: Money,

    /// Cascade rounds run. At most one batch per pending record is settled
    /// in each round, so this never exceeds batches × initial over-repayments.
    /// Not part of the serialized document.
    pub cascade_rounds: usize,
}

impl AllocationResult {
    /// Assembles the result and computes the scalar aggregates.
    pub fn summarize(
        unapplied_repayments: Vec<Repayment>,
        unapplied_over_repayments: Vec<Repayment>,
        batches: Vec<Batch>,
    ) -> Self {
        let total_repayment_amount: Money =
            batches.iter().map(|b| b.total_repayment_amount).sum();
        let total_unapplied_repayment_amount: Money =
            unapplied_repayments.iter().map(|r| r.amount).sum();
        let total_unapplied_over_repayment_amount: Money =
            unapplied_over_repayments.iter().map(|r| r.amount).sum();

        AllocationResult {
            batch_count: batches.len(),
            unapplied_repayments,
            unapplied_over_repayments,
            batches,
            total_repayment_amount,
            total_unapplied_repayment_amount,
            total_unapplied_over_repayment_amount,
            cascade_rounds: 0,
        }
    }
}

impl Serialize for AllocationResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry(columns::UNAPPLIED_REPAYMENTS, &self.unapplied_repayments)?;
        map.serialize_entry(
            columns::UNAPPLIED_OVER_REPAYMENTS,
            &self.unapplied_over_repayments,
        )?;
        map.serialize_entry(columns::BATCHES, &self.batches)?;
        map.serialize_entry(columns::BATCH_COUNT, &self.batch_count)?;
        map.serialize_entry(columns::TOTAL_REPAYMENT_AMOUNT, &self.total_repayment_amount)?;
        map.serialize_entry(
            columns::TOTAL_UNAPPLIED_REPAYMENT_AMOUNT,
            &self.total_unapplied_repayment_amount,
        )?;
        map.serialize_entry(
            columns::TOTAL_UNAPPLIED_OVER_REPAYMENT_AMOUNT,
            &self.total_unapplied_over_repayment_amount,
        )?;
        map.end()
    }
}

/// The allocation engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterfallEngine {
    options: AllocationOptions,
}

impl WaterfallEngine {
    pub fn new(options: AllocationOptions) -> Self {
        WaterfallEngine { options }
    }

    /// Runs both passes and aggregates the result.
    pub fn allocate(
        &self,
        repayments: &[Repayment],
        mut batches: Vec<Batch>,
    ) -> AllocationResult {
        let direct = self.allocate_direct(repayments, &mut batches);
        self.cascade(
            direct.over_repayments,
            direct.unapplied_repayments,
            Vec::new(),
            batches,
        )
    }

    /// Applies each repayment to the first batch with a matching reference.
    ///
    /// Repayments without a reference are handled per
    /// [`MissingReferencePolicy`]. Repayments whose reference matches nothing
    /// are returned unmodified in `unapplied_repayments`.
    pub fn allocate_direct(
        &self,
        repayments: &[Repayment],
        batches: &mut [Batch],
    ) -> DirectAllocation {
        let mut out = DirectAllocation::default();

        for (idx, repayment) in repayments.iter().enumerate() {
            let reference = match repayment.batch_reference.as_deref() {
                Some(r) if !r.is_empty() => r,
                _ => {
                    match self.options.missing_reference {
                        MissingReferencePolicy::Drop => {
                            debug!("Repayment {}: no batch reference, dropped", idx);
                        }
                        MissingReferencePolicy::RouteToUnapplied => {
                            debug!("Repayment {}: no batch reference, unapplied", idx);
                            out.unapplied_repayments.push(repayment.clone());
                        }
                    }
                    continue;
                }
            };

            match batches.iter_mut().find(|b| b.matches(reference)) {
                Some(batch) => {
                    let outcome = batch.apply(repayment);
                    debug!(
                        "Repayment {}: applied {} of {} to batch {}",
                        idx, outcome.applied, repayment.amount, batch.reference
                    );
                    if let Some(over) = outcome.over_repayment {
                        debug!(
                            "Repayment {}: over-repayment of {} from batch {}",
                            idx, over.amount, batch.reference
                        );
                        out.over_repayments.push(over);
                    }
                }
                None => {
                    debug!(
                        "Repayment {}: no batch matches reference {}, unapplied",
                        idx, reference
                    );
                    out.unapplied_repayments.push(repayment.clone());
                }
            }
        }

        info!(
            "Direct pass: {} over-repayments, {} unapplied repayments",
            out.over_repayments.len(),
            out.unapplied_repayments.len()
        );
        out
    }

    /// Cascades over-repayments down the batch list until none remain.
    ///
    /// Each round applies every pending record to the first batch that still
    /// owes something; the excess it produces is deferred to the next round.
    /// Records that find no outstanding batch are appended to
    /// `unapplied_over_repayments` and never retried. With no pending records
    /// the batches are returned untouched.
    pub fn cascade(
        &self,
        over_repayments: Vec<Repayment>,
        unapplied_repayments: Vec<Repayment>,
        mut unapplied_over_repayments: Vec<Repayment>,
        mut batches: Vec<Batch>,
    ) -> AllocationResult {
        let mut pending = over_repayments;
        let mut rounds = 0usize;

        while !pending.is_empty() {
            rounds += 1;
            pending = cascade_round(&pending, &mut batches, &mut unapplied_over_repayments);
        }

        let mut result =
            AllocationResult::summarize(unapplied_repayments, unapplied_over_repayments, batches);
        result.cascade_rounds = rounds;
        info!(
            "Cascade finished after {} rounds: applied {}, unapplied {}, unapplied over {}",
            rounds,
            result.total_repayment_amount,
            result.total_unapplied_repayment_amount,
            result.total_unapplied_over_repayment_amount
        );
        result
    }
}

/// One cascade round. Returns the excess to carry into the next round.
fn cascade_round(
    pending: &[Repayment],
    batches: &mut [Batch],
    unapplied_over_repayments: &mut Vec<Repayment>,
) -> Vec<Repayment> {
    let mut next = Vec::new();

    for over in pending {
        match batches.iter_mut().find(|b| b.is_outstanding()) {
            Some(batch) => {
                let outcome = batch.apply(over);
                debug!(
                    "Cascaded {} of {} into batch {}",
                    outcome.applied, over.amount, batch.reference
                );
                next.extend(outcome.over_repayment);
            }
            None => {
                debug!("No outstanding batch for over-repayment of {}", over.amount);
                unapplied_over_repayments.push(over.clone());
            }
        }
    }

    next
}
