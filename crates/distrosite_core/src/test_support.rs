use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::catalogue::DistroRecord;
use crate::enrich::EnrichedRecord;
use crate::fetch::HttpFetch;
use crate::metadata::ReleaseModel;

/// In-memory fetcher that serves canned bodies and records every request.
#[derive(Default)]
pub struct FakeFetcher {
    pub bytes: HashMap<String, Vec<u8>>,
    pub json: HashMap<String, Value>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_bytes(mut self, url: &str, body: &[u8]) -> Self {
        self.bytes.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn with_json(mut self, url: &str, body: Value) -> Self {
        self.json.insert(url.to_string(), body);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl HttpFetch for FakeFetcher {
    fn get_bytes(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        self.bytes
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no canned body for {url}"))
    }

    fn get_json(&self, url: &str, _query: &[(&str, String)], _timeout: Duration) -> Result<Value> {
        self.requests.borrow_mut().push(url.to_string());
        self.json
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no canned JSON for {url}"))
    }
}

pub fn enriched(id: &str, family: &str, badges: &[&str], rank: Option<u32>) -> EnrichedRecord {
    EnrichedRecord {
        record: DistroRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            family: family.to_string(),
            badges: badges.iter().map(ToString::to_string).collect(),
            ..DistroRecord::default()
        },
        logo_source: String::new(),
        logo_local: String::new(),
        release_model: ReleaseModel::Rolling,
        popularity_rank: rank,
        hints: BTreeSet::new(),
    }
}
