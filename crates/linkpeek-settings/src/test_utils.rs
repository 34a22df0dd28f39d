//! Shared fixtures for settings tests.

use std::sync::Mutex;

use async_trait::async_trait;
use linkpeek_types::error::{PeekError, Result};
use serde_json::Value;

use crate::lifecycle::{ExtensionHost, RuleUpdate};
use crate::local::LocalStorage;
use crate::store::MemoryStore;

pub fn storage_with<const N: usize>(entries: [(&str, Value); N]) -> LocalStorage<MemoryStore> {
    LocalStorage::new(MemoryStore::with_entries(entries))
}

/// An [`ExtensionHost`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingHost {
    tabs: Mutex<Vec<String>>,
    rule_updates: Mutex<Vec<RuleUpdate>>,
    fail_rules: bool,
}

impl RecordingHost {
    pub fn failing_rules() -> Self {
        Self {
            fail_rules: true,
            ..Self::default()
        }
    }

    pub fn tabs(&self) -> Vec<String> {
        self.tabs.lock().unwrap().clone()
    }

    pub fn rule_updates(&self) -> Vec<RuleUpdate> {
        self.rule_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtensionHost for RecordingHost {
    async fn open_tab(&self, url: &str) -> Result<()> {
        self.tabs.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn update_dynamic_rules(&self, update: &RuleUpdate) -> Result<()> {
        if self.fail_rules {
            return Err(PeekError::Settings("declarativeNetRequest unavailable".into()));
        }
        self.rule_updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}
