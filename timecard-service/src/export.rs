//! Delimited export of category-grouped records.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use error::ExportError;

use crate::aggregate::{employee_label, group_by_category};
use crate::models::ComputedRecord;

/// Column headers of the export
pub const HEADERS: [&str; 6] = [
    "Employee",
    "Date",
    "Job Title",
    "Job Reference",
    "Category",
    "Hours",
];

/// Write one row per record, ordered by category, employee label, then date.
///
/// Records without a clock-in are left out, as in the aggregate views.
pub fn write_csv<W: Write>(
    writer: W,
    records: &[ComputedRecord],
    employee_labels: &HashMap<String, String>,
) -> Result<usize, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADERS).map_err(csv_error)?;

    let mut rows = 0;
    for group in group_by_category(records).into_values() {
        let mut labelled: Vec<(String, usize)> = group
            .records
            .iter()
            .map(|idx| (employee_label(employee_labels, records[*idx].employee()), *idx))
            .collect();
        // Stable: ties keep the canonical order from grouping
        labelled.sort_by(|(la, ia), (lb, ib)| {
            la.cmp(lb)
                .then_with(|| records[*ia].work_date().cmp(&records[*ib].work_date()))
        });

        for (label, idx) in labelled {
            let record = &records[idx];
            let date = record
                .work_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let hours = format!("{:.2}", record.hours);
            wtr.write_record([
                label.as_str(),
                date.as_str(),
                record.job_title.as_deref().unwrap_or(""),
                record.job_reference.as_deref().unwrap_or(""),
                group.category.as_str(),
                hours.as_str(),
            ])
            .map_err(csv_error)?;
            rows += 1;
        }
    }

    wtr.flush()?;
    Ok(rows)
}

/// Write the export to a file, replacing it if present.
pub fn write_csv_file(
    path: &Path,
    records: &[ComputedRecord],
    employee_labels: &HashMap<String, String>,
) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(file, records, employee_labels)
}

fn csv_error(err: csv::Error) -> ExportError {
    ExportError::Csv(err.to_string())
}
