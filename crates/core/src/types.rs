//! Shared lifecycle domain types — campaign kinds, remote entity status,
//! the persisted id record, insight metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Campaign kind ─────────────────────────────────────────────────────────

/// The two concrete campaign types this subsystem manages. The kind selects
/// objective, targeting strategy, and update semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    NewBuyers,
    Retargeting,
}

impl CampaignKind {
    /// Stable key used by the campaign state store map.
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignKind::NewBuyers => "new-buyers",
            CampaignKind::Retargeting => "retargeting",
        }
    }

    /// Human-readable label used in remote-object display names.
    pub fn label(&self) -> &'static str {
        match self {
            CampaignKind::NewBuyers => "New Buyers",
            CampaignKind::Retargeting => "Retargeting",
        }
    }
}

impl std::fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Entity status ─────────────────────────────────────────────────────────

/// Status reported by a remote entity. Values outside the three the
/// lifecycle branches on are carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityStatus {
    Active,
    Paused,
    Archived,
    Other(String),
}

impl EntityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EntityStatus::Active => "ACTIVE",
            EntityStatus::Paused => "PAUSED",
            EntityStatus::Archived => "ARCHIVED",
            EntityStatus::Other(s) => s,
        }
    }

    pub fn is_active(&self) -> bool {
        *self == EntityStatus::Active
    }

    pub fn is_archived(&self) -> bool {
        *self == EntityStatus::Archived
    }
}

impl From<&str> for EntityStatus {
    fn from(s: &str) -> Self {
        match s {
            "ACTIVE" => EntityStatus::Active,
            "PAUSED" => EntityStatus::Paused,
            "ARCHIVED" => EntityStatus::Archived,
            other => EntityStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntityStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EntityStatus::from(s.as_str()))
    }
}

// ─── Stored record ─────────────────────────────────────────────────────────

/// Durable handle linking a local campaign kind to the remote entity tree.
/// All five ids must be present, and the account must match the handler's
/// configured account, for the record to be considered valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoredCampaignRecord {
    pub ad_account_id: Option<String>,
    pub campaign_id: Option<String>,
    pub adset_id: Option<String>,
    pub ad_id: Option<String>,
    pub adcreative_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredCampaignRecord {
    pub fn is_complete(&self) -> bool {
        self.ad_account_id.is_some()
            && self.campaign_id.is_some()
            && self.adset_id.is_some()
            && self.ad_id.is_some()
            && self.adcreative_id.is_some()
    }

    pub fn matches_account(&self, account_id: &str) -> bool {
        self.ad_account_id.as_deref() == Some(account_id)
    }
}

// ─── Insights ──────────────────────────────────────────────────────────────

/// Funnel event counts extracted from the campaign's aggregate insights.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunnelActions {
    pub clicks: u64,
    pub views: u64,
    pub cart: u64,
    pub purchases: u64,
}

/// Aggregate performance metrics for a running campaign. Derived, never
/// stored; fetched fresh whenever the campaign is confirmed running.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Insights {
    pub spend: f64,
    pub reach: u64,
    pub actions: FunnelActions,
}

// ─── Minimum budget ────────────────────────────────────────────────────────

/// Smallest daily spend the remote platform accepts for the account's
/// currency, scaled by the safety factor, together with the local/USD
/// conversion rate. Computed once per handler construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MinimumDailyBudget {
    pub value: f64,
    pub conversion_rate: f64,
}
