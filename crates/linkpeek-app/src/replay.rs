//! Scenario replay.
//!
//! Builds the scenario's page, mounts a [`ContentHost`] over a memory
//! store, and feeds the events through on a virtual clock: before each
//! event the clock advances to its timestamp, firing any long-press timer
//! that comes due on the way.

use std::fmt;
use std::rc::Rc;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::executor::block_on;
use linkpeek_detect::ManualTimers;
use linkpeek_settings::lifecycle::{self, ExtensionHost, RuleUpdate};
use linkpeek_settings::{LocalStorage, MemoryStore, SettingKey, SettingsStore};
use linkpeek_types::error::Result;
use serde_json::Value;

use crate::host::{ContentHost, HostEvent};
use crate::scenario::{BuiltPage, Scenario, Step};

/// One line of replay output.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayLine {
    Installed { opened: String, rules: usize },
    Mounted { mode: Option<String> },
    ModeChanged { at_ms: u64, mode: Option<String> },
    Detected { at_ms: u64, url: String, source: String },
    Previewed { at_ms: u64, url: String },
    Refused { at_ms: u64, url: String },
    Navigated { at_ms: u64, url: String },
}

impl fmt::Display for ReplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mode(m: &Option<String>) -> &str {
            m.as_deref().unwrap_or("off")
        }
        match self {
            Self::Installed { opened, rules } => write!(f, "     -  install   opened {opened}, {rules} frame rules"),
            Self::Mounted { mode: m } => write!(f, "     0  mount     mode {}", mode(m)),
            Self::ModeChanged { at_ms, mode: m } => write!(f, "{at_ms:>6}  settings  mode {}", mode(m)),
            Self::Detected { at_ms, url, source } => write!(f, "{at_ms:>6}  detect    {url} (from {source})"),
            Self::Previewed { at_ms, url } => write!(f, "{at_ms:>6}  preview   {url}"),
            Self::Refused { at_ms, url } => write!(f, "{at_ms:>6}  refuse    {url}"),
            Self::Navigated { at_ms, url } => write!(f, "{at_ms:>6}  navigate  {url}"),
        }
    }
}

/// Records what the install hook asked of the browser.
#[derive(Debug, Default)]
struct ReplayExtensionHost {
    tabs: Mutex<Vec<String>>,
    rules: Mutex<Vec<RuleUpdate>>,
}

#[async_trait]
impl ExtensionHost for ReplayExtensionHost {
    async fn open_tab(&self, url: &str) -> Result<()> {
        self.tabs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        Ok(())
    }

    async fn update_dynamic_rules(&self, update: &RuleUpdate) -> Result<()> {
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(update.clone());
        Ok(())
    }
}

/// Replay `scenario` and return everything that happened, in order.
pub fn run(scenario: &Scenario) -> Result<Vec<ReplayLine>> {
    let mut lines = Vec::new();
    let storage = LocalStorage::new(MemoryStore::new());

    if let Some(install) = &scenario.install {
        let host = ReplayExtensionHost::default();
        let outcome = block_on(lifecycle::on_installed(install.reason, &storage, &host, &install.date))?;
        if let Some(opened) = outcome.opened {
            let rules = host
                .rules
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .map(|u| u.add_rules.len())
                .sum();
            lines.push(ReplayLine::Installed { opened, rules });
        }
    }

    let store = storage.store();
    if let Some(behavior) = &scenario.settings.behavior {
        block_on(store.set(&SettingKey::Behavior.storage_key(), Value::from(behavior.as_str())))?;
    }
    if let Some(theme) = &scenario.settings.theme {
        block_on(store.set(&SettingKey::Theme.storage_key(), Value::from(theme.as_str())))?;
    }

    let built = scenario.build_page()?;
    let timers = Rc::new(ManualTimers::new());
    let mut host = block_on(ContentHost::mount(
        Rc::clone(&built.page),
        Rc::<ManualTimers>::clone(&timers),
        storage,
    ))?;
    lines.push(ReplayLine::Mounted {
        mode: host.mode().map(|m| m.to_string()),
    });

    for event in scenario.timeline() {
        timers.advance_to(event.at);
        collect(&host, &built, &mut lines);
        match event.to_step(&built)? {
            Step::Dispatch(dom_event) => {
                let outcome = built.page.dispatch(dom_event);
                collect(&host, &built, &mut lines);
                if let Some(url) = outcome.navigated_to {
                    lines.push(ReplayLine::Navigated { at_ms: event.at, url });
                }
            },
            Step::SetBehavior(behavior) => {
                let key = SettingKey::Behavior.storage_key();
                let store = host.storage().store();
                match behavior {
                    Some(behavior) => block_on(store.set(&key, Value::from(behavior)))?,
                    None => block_on(store.remove(&key))?,
                }
                block_on(host.refresh())?;
                lines.push(ReplayLine::ModeChanged {
                    at_ms: event.at,
                    mode: host.mode().map(|m| m.to_string()),
                });
            },
        }
    }

    if let Some(end_ms) = scenario.end_ms {
        timers.advance_to(end_ms);
        collect(&host, &built, &mut lines);
    }
    host.unmount();
    Ok(lines)
}

fn collect(host: &ContentHost<MemoryStore>, built: &BuiltPage, lines: &mut Vec<ReplayLine>) {
    for event in host.drain_events() {
        lines.push(match event {
            HostEvent::Detected { at_ms, url, source } => ReplayLine::Detected {
                at_ms,
                url,
                source: built
                    .name_of(source)
                    .map_or_else(|| format!("node {source}"), str::to_string),
            },
            HostEvent::Previewed { at_ms, target } => ReplayLine::Previewed {
                at_ms,
                url: target.url().to_string(),
            },
            HostEvent::Refused { at_ms, url } => ReplayLine::Refused { at_ms, url },
        });
    }
}
