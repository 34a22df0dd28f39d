//! Background worker hooks: first-install handling and the network rules
//! that let previewed pages load inside a frame.

use async_trait::async_trait;
use linkpeek_types::error::Result;
use serde::{Deserialize, Serialize};

use crate::local::LocalStorage;
use crate::schema::InstallDate;
use crate::store::SettingsStore;

/// Page opened on first install: the welcome wizard at its first step.
pub const WELCOME_PAGE: &str = "page.html?step=1";

/// Why the runtime reported an install event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallReason {
    Install,
    Update,
    ChromeUpdate,
    SharedModuleUpdate,
}

/// The browser APIs the background worker drives.
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    async fn open_tab(&self, url: &str) -> Result<()>;

    async fn update_dynamic_rules(&self, update: &RuleUpdate) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Frame embedding rules
// ---------------------------------------------------------------------------

/// Ids of the rules installed by [`frame_embedding_rules`].
pub const FRAME_RULE_IDS: [u32; 2] = [1, 2];

/// Response headers that stop a page from being framed.
const FRAME_BLOCKING_HEADERS: [&str; 2] = ["x-frame-options", "content-security-policy"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: RuleActionType,
    pub response_headers: Vec<HeaderEdit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleActionType {
    ModifyHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEdit {
    pub header: String,
    pub operation: HeaderOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderOperation {
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    SubFrame,
}

/// One `updateDynamicRules` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub remove_rule_ids: Vec<u32>,
    pub add_rules: Vec<DynamicRule>,
}

/// Rules stripping the frame-blocking headers from every sub-frame
/// response, one rule per header.
pub fn frame_embedding_rules() -> Vec<DynamicRule> {
    FRAME_RULE_IDS
        .into_iter()
        .zip(FRAME_BLOCKING_HEADERS)
        .map(|(id, header)| DynamicRule {
            id,
            priority: 1,
            action: RuleAction {
                kind: RuleActionType::ModifyHeaders,
                response_headers: vec![HeaderEdit {
                    header: header.to_string(),
                    operation: HeaderOperation::Remove,
                }],
            },
            condition: RuleCondition {
                url_filter: "*".to_string(),
                resource_types: vec![ResourceType::SubFrame],
            },
        })
        .collect()
}

/// Replace any earlier copy of the frame rules with a fresh one.
pub fn frame_rule_update() -> RuleUpdate {
    RuleUpdate {
        remove_rule_ids: FRAME_RULE_IDS.to_vec(),
        add_rules: frame_embedding_rules(),
    }
}

// ---------------------------------------------------------------------------
// Install handling
// ---------------------------------------------------------------------------

/// What [`on_installed`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    pub opened: Option<String>,
    pub rules_installed: bool,
}

/// Handle the runtime's install event.
///
/// Only a fresh install does anything: it opens the welcome page, records
/// `install_date`, and installs the frame rules. A rule update failure is
/// logged and reported through [`InstallOutcome::rules_installed`]; the
/// other failures are returned.
pub async fn on_installed<S, H>(
    reason: InstallReason,
    storage: &LocalStorage<S>,
    host: &H,
    install_date: &str,
) -> Result<InstallOutcome>
where
    S: SettingsStore,
    H: ExtensionHost + ?Sized,
{
    if reason != InstallReason::Install {
        log::debug!("install event ({reason:?}) ignored");
        return Ok(InstallOutcome::default());
    }

    host.open_tab(WELCOME_PAGE).await?;
    storage
        .set_item::<InstallDate>(&install_date.to_string())
        .await?;

    let rules_installed = match host.update_dynamic_rules(&frame_rule_update()).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("failed to update frame embedding rules: {e}");
            false
        },
    };
    log::info!("installed on {install_date}");
    Ok(InstallOutcome {
        opened: Some(WELCOME_PAGE.to_string()),
        rules_installed,
    })
}
