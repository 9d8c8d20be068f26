//! Campaign state store — the durable map of per-kind id records.
//!
//! The contract is a read-modify-write over the whole map, keyed by the
//! campaign-kind string; point updates go through a full load/save cycle.

use std::collections::HashMap;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::debug;

use asc_core::types::StoredCampaignRecord;

pub trait CampaignStore: Send + Sync {
    fn load_all(&self) -> Result<HashMap<String, StoredCampaignRecord>>;
    fn save_all(&self, records: &HashMap<String, StoredCampaignRecord>) -> Result<()>;
}

/// In-memory store for development and testing. Production: back the same
/// surface with the host platform's key-value settings storage.
#[derive(Default)]
pub struct InMemoryCampaignStore {
    records: Mutex<HashMap<String, StoredCampaignRecord>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CampaignStore for InMemoryCampaignStore {
    fn load_all(&self) -> Result<HashMap<String, StoredCampaignRecord>> {
        Ok(self.records.lock().clone())
    }

    fn save_all(&self, records: &HashMap<String, StoredCampaignRecord>) -> Result<()> {
        debug!(kinds = records.len(), "Persisting campaign records");
        *self.records.lock() = records.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_modify_write() {
        let store = InMemoryCampaignStore::new();
        let mut map = store.load_all().unwrap();
        assert!(map.is_empty());

        map.insert(
            "retargeting".to_string(),
            StoredCampaignRecord {
                ad_account_id: Some("act_1".to_string()),
                ..Default::default()
            },
        );
        store.save_all(&map).unwrap();

        let reloaded = store.load_all().unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded["retargeting"].matches_account("act_1"));
    }
}
