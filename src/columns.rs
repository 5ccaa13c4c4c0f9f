//! Header names shared by ingestion and reporting.

/// Batch identifier. Present on both sheets.
pub const BATCH_REFERENCE: &str = "Jia Advance #";
pub const REPAYMENT_DATE: &str = "Repayment Date";
pub const PAYMENT_REFERENCE: &str = "Ref No.";
pub const REPAYMENT_AMOUNT: &str = "Repayment Amount";
pub const TOTAL_AMOUNT_DUE: &str = "Total Amount Due";

// Keys added by the engine.
pub const BALANCE: &str = "Balance";
pub const REPAYMENTS: &str = "Repayments";
pub const TOTAL_REPAYMENT_AMOUNT: &str = "Total Repayment Amount";
pub const UNAPPLIED_REPAYMENTS: &str = "Unapplied Repayments";
pub const UNAPPLIED_OVER_REPAYMENTS: &str = "Unapplied Over Repayments";
pub const BATCHES: &str = "batches";
pub const BATCH_COUNT: &str = "Batch Count";
pub const TOTAL_UNAPPLIED_REPAYMENT_AMOUNT: &str = "Total Unapplied Repayment Amount";
pub const TOTAL_UNAPPLIED_OVER_REPAYMENT_AMOUNT: &str = "Total Unapplied Over Repayment Amount";
