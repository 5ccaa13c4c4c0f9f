//! Inbound repayment records.

use crate::columns;
use crate::money::Money;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One inbound payment.
///
/// `date`, `payment_reference` and any passthrough columns are opaque to the
/// allocation engine. They are copied verbatim onto every record derived from
/// this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repayment {
    /// `Repayment Date` as it appeared in the sheet.
    pub date: Option<String>,

    /// `Ref No.`
    pub payment_reference: Option<String>,

    /// The batch this payment was intended for. `None` when the cell was empty.
    pub batch_reference: Option<String>,

    /// Amount as submitted, or the residual amount on a derived record.
    pub amount: Money,

    /// Unrecognised columns in sheet order.
    pub passthrough: Vec<(String, String)>,
}

impl Repayment {
    /// Creates a repayment with only a batch reference and amount.
    pub fn new(batch_reference: impl Into<String>, amount: Money) -> Self {
        let batch_reference = batch_reference.into();
        Repayment {
            date: None,
            payment_reference: None,
            batch_reference: if batch_reference.is_empty() {
                None
            } else {
                Some(batch_reference)
            },
            amount,
            passthrough: Vec::new(),
        }
    }

    /// Returns `true` if the record names a batch.
    pub fn has_batch_reference(&self) -> bool {
        self.batch_reference
            .as_deref()
            .map(|r| !r.is_empty())
            .unwrap_or(false)
    }

    /// Derives a new record carrying the same passthrough fields and a new amount.
    ///
    /// Used both for the clipped amount credited to a batch and for the
    /// over-repayment remainder. The original record is left untouched.
    pub fn with_amount(&self, amount: Money) -> Self {
        Repayment {
            amount,
            ..self.clone()
        }
    }
}

impl Serialize for Repayment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(date) = &self.date {
            map.serialize_entry(columns::REPAYMENT_DATE, date)?;
        }
        if let Some(reference) = &self.payment_reference {
            map.serialize_entry(columns::PAYMENT_REFERENCE, reference)?;
        }
        if let Some(batch) = &self.batch_reference {
            map.serialize_entry(columns::BATCH_REFERENCE, batch)?;
        }
        map.serialize_entry(columns::REPAYMENT_AMOUNT, &self.amount)?;
        for (key, value) in &self.passthrough {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample() -> Repayment {
        Repayment {
            date: Some("2021-03-01".to_string()),
            payment_reference: Some("PAY-7".to_string()),
            batch_reference: Some("B-1".to_string()),
            amount: Money::from(150),
            passthrough: vec![("Channel".to_string(), "bank".to_string())],
        }
    }

    #[test]
    fn test_with_amount_copies_passthrough_fields() {
        let original = sample();
        let derived = original.with_amount(Money::from(50));

        assert_eq!(derived.amount, Money::from(50));
        assert_eq!(derived.date, original.date);
        assert_eq!(derived.payment_reference, original.payment_reference);
        assert_eq!(derived.batch_reference, original.batch_reference);
        assert_eq!(derived.passthrough, original.passthrough);
        assert_eq!(original.amount, Money::from(150));
    }

    #[test]
    fn test_empty_reference_is_absent() {
        let r = Repayment::new("", Money::from(10));
        assert!(!r.has_batch_reference());

        let r = Repayment::new("B-1", Money::from(10));
        assert!(r.has_batch_reference());

        let mut r = Repayment::new("B-1", Money::from(10));
        r.batch_reference = Some(String::new());
        assert!(!r.has_batch_reference());
    }

    #[test]
    fn test_serializes_with_sheet_column_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["Repayment Date"], "2021-03-01");
        assert_eq!(json["Ref No."], "PAY-7");
        assert_eq!(json["Jia Advance #"], "B-1");
        assert_eq!(json["Repayment Amount"], "150.0000");
        assert_eq!(json["Channel"], "bank");
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let r = Repayment::new("", Money::from_str("1.5").unwrap());
        let json = serde_json::to_value(r).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("Repayment Amount"));
    }
}
