use crate::model::{format_timestamp, WasteRecord};
use std::fs::OpenOptions;
use std::io::Write;

/// Appends newly observed detections to a whitespace-delimited log file,
/// one row per record, so a dashboard session leaves an audit trail.
pub struct DetectionLogger {
    file: Option<std::fs::File>,
    use_stdout: bool,
    last_logged_id: Option<u64>,
}

impl DetectionLogger {
    pub fn new(path: Option<String>) -> anyhow::Result<Self> {
        let (file, use_stdout) = if let Some(path) = path {
            if path == "-" {
                (None, true) // stdout logging
            } else {
                let f = OpenOptions::new().create(true).append(true).open(path)?;
                (Some(f), false)
            }
        } else {
            (None, false)
        };

        let mut logger = Self {
            file,
            use_stdout,
            last_logged_id: None,
        };

        // Write header if file is new or empty
        if let Some(ref mut f) = logger.file {
            let metadata = f.metadata()?;
            if metadata.len() == 0 {
                logger.write_header()?;
            }
        } else if logger.use_stdout {
            logger.write_header()?;
        }

        Ok(logger)
    }

    fn write_header(&mut self) -> anyhow::Result<()> {
        let header = "Timestamp Id Type Confidence Image\n";

        match (&mut self.file, self.use_stdout) {
            (Some(f), _) => f.write_all(header.as_bytes())?,
            (None, true) => print!("{header}"),
            _ => {} // No output
        }

        Ok(())
    }

    /// Logs every record newer than the last one seen. The feed arrives
    /// newest-first, so rows are written oldest-first per batch.
    pub fn log_detections(&mut self, records: &[WasteRecord]) -> anyhow::Result<()> {
        let threshold = self.last_logged_id;
        let mut fresh: Vec<&WasteRecord> = records
            .iter()
            .filter(|record| threshold.map_or(true, |last| record.id > last))
            .collect();
        fresh.sort_by_key(|record| record.id);

        for record in fresh {
            let line = format!(
                "{} {} {} {} {}\n",
                format_timestamp(&record.timestamp).replace(' ', "T"),
                record.id,
                record.type_label,
                record.confidence,
                if record.image.is_empty() {
                    "-"
                } else {
                    record.image.as_str()
                },
            );

            match (&mut self.file, self.use_stdout) {
                (Some(f), _) => {
                    f.write_all(line.as_bytes())?;
                    f.flush()?;
                }
                (None, true) => print!("{line}"),
                _ => {}
            }

            self.last_logged_id = Some(
                self.last_logged_id
                    .map_or(record.id, |last| last.max(record.id)),
            );
        }

        Ok(())
    }
}
