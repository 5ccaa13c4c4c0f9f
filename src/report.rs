//! Writes the allocation result as a JSON document.

use crate::allocation::AllocationResult;
use crate::error::Result;
use std::io::Write;

/// Pretty-prints the result followed by a trailing newline.
pub fn write_json<W: Write>(result: &AllocationResult, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::WaterfallEngine;
    use crate::batch::Batch;
    use crate::money::Money;
    use crate::repayment::Repayment;
    use serde_json::Value;

    #[test]
    fn test_document_keys() {
        let result = WaterfallEngine::default().allocate(
            &[
                Repayment::new("A", Money::from(150)),
                Repayment::new("X-999", Money::from(5)),
            ],
            vec![Batch::new("A", Money::from(100))],
        );

        let mut out = Vec::new();
        write_json(&result, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("}\n"));

        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["Batch Count"], 1);
        assert_eq!(doc["Total Repayment Amount"], "100.0000");
        assert_eq!(doc["Total Unapplied Repayment Amount"], "5.0000");
        assert_eq!(doc["Total Unapplied Over Repayment Amount"], "50.0000");
        assert_eq!(doc["Unapplied Repayments"][0]["Jia Advance #"], "X-999");
        assert_eq!(doc["Unapplied Over Repayments"][0]["Repayment Amount"], "50.0000");
        assert_eq!(doc["batches"][0]["Balance"], "0.0000");
        assert_eq!(doc["batches"][0]["Total Repayment Amount"], "100.0000");
    }
}
