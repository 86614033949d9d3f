//! Export cost items to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::CostEstimate;
use crate::error::AppError;

/// Write one row per cost item plus a trailing total row.
pub fn write_cost_csv(path: &Path, job_id: &str, estimate: &CostEstimate) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "job_id,type,unit,count,total_quantity,cost,currency")
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for item in &estimate.items {
        writeln!(
            file,
            "{},{},{},{},{:.2},{:.2},{}",
            job_id,
            csv_field(&item.kind),
            csv_field(&item.unit),
            item.count,
            item.total_quantity,
            item.cost,
            estimate.currency,
        )
        .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    writeln!(file, "{},TOTAL,,,,{:.2},{}", job_id, estimate.total_cost, estimate.currency)
        .map_err(|e| AppError::io(format!("Failed to write export CSV total: {e}")))?;

    Ok(())
}

/// Quote a field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CostItem;

    #[test]
    fn writes_items_and_total() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cost.csv");
        let estimate = CostEstimate {
            currency: "USD".to_string(),
            total_cost: 40.0,
            items: vec![
                CostItem {
                    kind: "crack".to_string(),
                    unit: "meter".to_string(),
                    count: 2,
                    total_quantity: 1.5,
                    cost: 30.0,
                },
                CostItem {
                    kind: "moss, green".to_string(),
                    unit: "m2".to_string(),
                    count: 1,
                    total_quantity: 1.0,
                    cost: 10.0,
                },
            ],
        };
        write_cost_csv(&path, "job-1", &estimate).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "job_id,type,unit,count,total_quantity,cost,currency");
        assert_eq!(lines[1], "job-1,crack,meter,2,1.50,30.00,USD");
        assert_eq!(lines[2], "job-1,\"moss, green\",m2,1,1.00,10.00,USD");
        assert_eq!(lines[3], "job-1,TOTAL,,,,40.00,USD");
    }
}
