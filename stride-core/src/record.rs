//! Types and traits for recording training metrics.
//!
//! * [`Record`] - key-value container of [`RecordValue`]s
//! * [`Recorder`] - writes records to some destination
//! * [`AggregateRecorder`] - stores records and writes aggregated values at a given step
//! * [`RecordStorage`] - aggregation of stored records
//! * [`BufferedRecorder`] - keeps records in memory
//! * [`CsvRecorder`] - writes scalars to a CSV file
//! * [`NullRecorder`] - discards records
//!
//! # Basic Usage
//!
//! ```rust
//! use stride_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("losses/value_loss", RecordValue::Scalar(0.25));
//! record.insert("eval/episodic_returns", RecordValue::Array1(vec![1.0, 2.0]));
//! assert_eq!(record.get_scalar("losses/value_loss").unwrap(), 0.25);
//! ```
//!
//! The [`Trainer`](crate::Trainer) stores records of finished episodes and of each
//! optimization step in an [`AggregateRecorder`] and flushes them at the global
//! environment step of the update.
mod base;
mod buffered_recorder;
mod csv_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use csv_recorder::CsvRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
