//! Subscription types.

use crate::types::OwnerKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of subscription. Ids are generated per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionClass {
    /// Subscriber data management subscriptions, per subscriber.
    Sdm,
    /// Event exposure subscriptions, per subscriber.
    Ee,
    /// Event exposure subscriptions, per subscriber group.
    EeGroup,
    /// Subscription-data change notifications, global.
    SubscriptionDataChange,
    /// Policy-data change notifications, global.
    PolicyDataChange,
    /// Traffic-influence-data notifications, global. Records live in the
    /// document store; only the id counter is kept in the registry.
    InfluenceData,
}

impl SubscriptionClass {
    pub const ALL: [SubscriptionClass; 6] = [
        SubscriptionClass::Sdm,
        SubscriptionClass::Ee,
        SubscriptionClass::EeGroup,
        SubscriptionClass::SubscriptionDataChange,
        SubscriptionClass::PolicyDataChange,
        SubscriptionClass::InfluenceData,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            SubscriptionClass::Sdm => 0,
            SubscriptionClass::Ee => 1,
            SubscriptionClass::EeGroup => 2,
            SubscriptionClass::SubscriptionDataChange => 3,
            SubscriptionClass::PolicyDataChange => 4,
            SubscriptionClass::InfluenceData => 5,
        }
    }

    /// Resource path of a subscription, relative to the API root.
    pub fn location_path(self, owner: &OwnerKey, id: SubscriptionId) -> String {
        match self {
            SubscriptionClass::Sdm => {
                format!("subscription-data/{}/context-data/sdm-subscriptions/{}", owner, id)
            }
            SubscriptionClass::Ee => {
                format!("subscription-data/{}/context-data/ee-subscriptions/{}", owner, id)
            }
            SubscriptionClass::EeGroup => {
                format!("subscription-data/group-data/{}/ee-subscriptions/{}", owner, id)
            }
            SubscriptionClass::SubscriptionDataChange => {
                format!("subscription-data/subs-to-notify/{}", id)
            }
            SubscriptionClass::PolicyDataChange => format!("policy-data/subs-to-notify/{}", id),
            SubscriptionClass::InfluenceData => {
                format!("application-data/influenceData/subs-to-notify/{}", id)
            }
        }
    }
}

/// Subscription identifier, rendered as a decimal string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(SubscriptionId)
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = std::num::ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Which changes a subscriber wants to hear about.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Restrict to one subscriber (None = any subscriber).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ue_id: Option<String>,
    /// Resource URIs whose changes are reported.
    #[serde(default)]
    pub monitored_resource_uris: Vec<String>,
}

impl FilterCriteria {
    pub fn matches(&self, owner: &OwnerKey, resource_uri: &str) -> bool {
        if let Some(ref ue_id) = self.ue_id {
            if owner.subscriber_id() != Some(ue_id.as_str()) {
                return false;
            }
        }

        self.monitored_resource_uris
            .iter()
            .any(|uri| uri == resource_uri)
    }
}

/// Request shape for creating or replacing a subscription.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_criteria: Option<FilterCriteria>,
    /// Callback URI notifications are delivered to.
    pub target_uri: String,
    /// Class-specific body, kept opaque.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl NewSubscription {
    pub fn new(target_uri: impl Into<String>) -> Self {
        Self {
            target_uri: target_uri.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: FilterCriteria) -> Self {
        self.filter_criteria = Some(filter);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A registered subscription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub owner: OwnerKey,
    pub class: SubscriptionClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_criteria: Option<FilterCriteria>,
    pub target_uri: String,
    pub payload: serde_json::Value,
    /// AMF subscription info attached to an event exposure subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amf_subscription_info: Option<serde_json::Value>,
}

/// Result of creating a subscription: the record and its resource URI.
#[derive(Clone, Debug, PartialEq)]
pub struct Created {
    pub subscription: Subscription,
    pub location: String,
}

impl Created {
    /// Transport status for a successful create.
    pub const STATUS: u16 = 201;
}
