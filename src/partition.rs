//! Splitting records per client.

use std::collections::HashMap;

use crate::normalize::NormalizedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionKey {
    /// Every record, unfiltered.
    Overview,
    Client(String),
}

#[derive(Debug, Clone)]
pub struct Partition<'a> {
    pub key: PartitionKey,
    pub records: Vec<&'a NormalizedRecord>,
}

/// Groups records by exact `client_id`, in the order each id first appears.
pub fn group_by_client(records: &[NormalizedRecord]) -> Vec<Partition<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Partition<'_>> = Vec::new();

    for record in records {
        let slot = *index.entry(record.client_id.as_str()).or_insert_with(|| {
            groups.push(Partition {
                key: PartitionKey::Client(record.client_id.clone()),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }
    groups
}

/// The overview partition followed by one partition per client.
pub fn partitions(records: &[NormalizedRecord]) -> Vec<Partition<'_>> {
    let overview = Partition {
        key: PartitionKey::Overview,
        records: records.iter().collect(),
    };
    std::iter::once(overview)
        .chain(group_by_client(records))
        .collect()
}
