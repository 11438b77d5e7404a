use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::info;

use super::aggregator::SystemColumn;
use super::domain::ReportRow;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode report rows: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the consolidated rows as a CSV artifact.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    output_dir: PathBuf,
}

impl ReportAssembler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn artifact_path(&self, generated_at: DateTime<Local>) -> PathBuf {
        self.output_dir.join(format!(
            "employee-exit-report-{}.csv",
            generated_at.format("%Y%m%d-%H%M%S")
        ))
    }

    pub fn write(
        &self,
        columns: &[SystemColumn],
        rows: &[ReportRow],
        generated_at: DateTime<Local>,
    ) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.artifact_path(generated_at);
        let file = File::create(&path)?;
        write_rows(file, columns, rows)?;
        info!(path = %path.display(), rows = rows.len(), "report artifact written");
        Ok(path)
    }
}

/// Header `ID, Name, Email, <labels...>` followed by one line per row.
pub fn write_rows<W: Write>(
    writer: W,
    columns: &[SystemColumn],
    rows: &[ReportRow],
) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["ID", "Name", "Email"];
    header.extend(columns.iter().map(|column| column.label.as_str()));
    csv_writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.employee_id.as_str(),
            row.full_name.as_str(),
            row.email.as_str(),
        ];
        record.extend(row.status_by_system.iter().map(|cell| cell.status.label()));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
