use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use anyhow::Result;
use log::warn;
use serde::Serialize;
use std::{fs::File, path::Path};

#[derive(Serialize)]
struct Row<'a> {
    step: i64,
    key: &'a str,
    value: f32,
}

/// Writes scalars of records to a CSV file.
///
/// Each scalar is a row `step,key,value`. Values other than scalars are discarded.
pub struct CsvRecorder {
    writer: csv::Writer<File>,
    storage: RecordStorage,
    step_key: String,
}

impl CsvRecorder {
    /// Constructs a [`CsvRecorder`] writing to `path`.
    ///
    /// The file is truncated if it exists.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
            storage: RecordStorage::new(),
            step_key: "global_step".to_string(),
        })
    }

    fn write_rows(&mut self, step: i64, record: &Record) -> Result<()> {
        let mut keys = record.keys().collect::<Vec<_>>();
        keys.sort();
        for k in keys {
            if *k == self.step_key {
                continue;
            }
            if let Some(RecordValue::Scalar(value)) = record.get(k) {
                self.writer.serialize(Row {
                    step,
                    key: k,
                    value: *value,
                })?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl Recorder for CsvRecorder {
    /// Writes scalars of a record.
    ///
    /// The step is taken from the `"global_step"` entry of the record, 0 if missing.
    fn write(&mut self, record: Record) {
        let step = record.get_scalar(&self.step_key).unwrap_or(0.0) as i64;
        if let Err(e) = self.write_rows(step, &record) {
            warn!("Failed to write a record: {}", e);
        }
    }
}

impl AggregateRecorder for CsvRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if let Err(e) = self.write_rows(step, &record) {
            warn!("Failed to write a record: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_csv_recorder() -> Result<()> {
        let dir = TempDir::new("csv_recorder")?;
        let path = dir.path().join("metrics.csv");
        let mut recorder = CsvRecorder::new(&path)?;

        recorder.store(Record::from_scalar("losses/value_loss", 0.5));
        recorder.store(Record::from_slice(&[(
            "eval/episodic_returns",
            RecordValue::Array1(vec![1.0, 2.0]),
        )]));
        recorder.flush(2048);
        drop(recorder);

        let content = std::fs::read_to_string(&path)?;
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["step,key,value", "2048,losses/value_loss,0.5"]);
        Ok(())
    }
}
