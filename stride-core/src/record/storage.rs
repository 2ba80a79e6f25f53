//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// A storage of records with aggregation.
///
/// Scalars stored more than once under the same key are summarized into
/// `{key}_min`, `{key}_max`, `{key}_mean` and `{key}_median`. A scalar stored once is
/// written as is. For the other types of values the latest one is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn scalar(&self, key: &str, vs: Vec<f32>) -> Record {
        if vs.len() == 1 {
            Record::from_slice(&[(key.to_string(), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    fn latest(&self, key: &str) -> Option<RecordValue> {
        self.data.iter().rev().find_map(|r| r.get(key).cloned())
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let scalars: Vec<f32> = self
                .data
                .iter()
                .filter_map(|r| match r.get(key) {
                    Some(RecordValue::Scalar(v)) => Some(*v),
                    _ => None,
                })
                .collect();

            if !scalars.is_empty() {
                record.merge_inplace(self.scalar(key, scalars));
            } else if let Some(v) = self.latest(key) {
                record.insert(key.clone(), v);
            }
        }

        self.data = vec![];

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_scalar("ret", 1.0));
        storage.store(Record::from_scalar("ret", 3.0));
        storage.store(Record::from_scalar("ret", 2.0));
        storage.store(Record::from_scalar("loss", 0.5));
        let record = storage.aggregate();

        assert_eq!(record.get_scalar("ret_min").unwrap(), 1.0);
        assert_eq!(record.get_scalar("ret_max").unwrap(), 3.0);
        assert_eq!(record.get_scalar("ret_mean").unwrap(), 2.0);
        assert_eq!(record.get_scalar("ret_median").unwrap(), 2.0);
        assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
        assert!(storage.aggregate().is_empty());
    }
}
