//! Core types for the data repository.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored document: a JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Owner of a subscription collection.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerKey {
    /// A single subscriber (ueId).
    Subscriber(String),
    /// A subscriber group (ueGroupId).
    Group(String),
    /// Process-global scope.
    Global,
}

impl OwnerKey {
    pub fn subscriber(ue_id: impl Into<String>) -> Self {
        OwnerKey::Subscriber(ue_id.into())
    }

    pub fn group(group_id: impl Into<String>) -> Self {
        OwnerKey::Group(group_id.into())
    }

    /// The subscriber identity, if this owner is a single subscriber.
    pub fn subscriber_id(&self) -> Option<&str> {
        match self {
            OwnerKey::Subscriber(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKey::Subscriber(id) => write!(f, "Subscriber({})", id),
            OwnerKey::Group(id) => write!(f, "Group({})", id),
            OwnerKey::Global => write!(f, "Global"),
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKey::Subscriber(id) | OwnerKey::Group(id) => write!(f, "{}", id),
            OwnerKey::Global => write!(f, "global"),
        }
    }
}

/// Network slice selector (S-NSSAI).
///
/// Equality is structural over `(sst, sd)`, independent of how the selector
/// was encoded on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snssai {
    pub sst: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

impl Snssai {
    pub fn new(sst: u8, sd: impl Into<String>) -> Self {
        Self {
            sst,
            sd: Some(sd.into()),
        }
    }

    /// Storage key: two hex digits of `sst` followed by `sd`.
    pub fn to_key(&self) -> String {
        let mut key = hex::encode([self.sst]);
        if let Some(sd) = &self.sd {
            key.push_str(sd);
        }
        key
    }
}

/// PLMN identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

impl PlmnId {
    pub fn new(mcc: impl Into<String>, mnc: impl Into<String>) -> Self {
        Self {
            mcc: mcc.into(),
            mnc: mnc.into(),
        }
    }
}

impl fmt::Display for PlmnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mcc, self.mnc)
    }
}

/// RFC6902 operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// One ordered patch operation as received from a caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchItem {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchItem {
    pub fn add(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            from: None,
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            from: None,
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            from: None,
            value: None,
        }
    }

    pub fn test(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOp::Test,
            path: path.into(),
            from: None,
            value: Some(value),
        }
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Move,
            path: path.into(),
            from: Some(from.into()),
            value: None,
        }
    }

    pub fn copy_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Copy,
            path: path.into(),
            from: Some(from.into()),
            value: None,
        }
    }
}

/// Top-level resource family of the repository API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceFamily {
    SubscriptionData,
    PolicyData,
    ApplicationData,
}

impl ResourceFamily {
    /// URI segment between the API root and the owner.
    pub fn segment(self) -> &'static str {
        match self {
            ResourceFamily::SubscriptionData => "subscription-data",
            ResourceFamily::PolicyData => "policy-data/ues",
            ResourceFamily::ApplicationData => "application-data",
        }
    }
}

/// Per-subscriber documents that can be read, replaced, patched and merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataResource {
    Amf3gppAccess,
    AmfNon3gppAccess,
    AuthenticationSubscription,
    AuthenticationStatus,
    PpData,
    OperatorSpecificData,
    PolicyOperatorSpecificData,
    UePolicySet,
    SmPolicyData,
}

/// Key field injected into every per-subscriber document.
pub const UE_ID_FIELD: &str = "ueId";

impl DataResource {
    pub fn collection(self) -> &'static str {
        match self {
            DataResource::Amf3gppAccess => "subscriptionData.contextData.amf3gppAccess",
            DataResource::AmfNon3gppAccess => "subscriptionData.contextData.amfNon3gppAccess",
            DataResource::AuthenticationSubscription => {
                "subscriptionData.authenticationData.authenticationSubscription"
            }
            DataResource::AuthenticationStatus => {
                "subscriptionData.authenticationData.authenticationStatus"
            }
            DataResource::PpData => "subscriptionData.ppData",
            DataResource::OperatorSpecificData => "subscriptionData.operatorSpecificData",
            DataResource::PolicyOperatorSpecificData => "policyData.ues.operatorSpecificData",
            DataResource::UePolicySet => "policyData.ues.uePolicySet",
            DataResource::SmPolicyData => "policyData.ues.smData",
        }
    }

    pub fn family(self) -> ResourceFamily {
        match self {
            DataResource::PolicyOperatorSpecificData
            | DataResource::UePolicySet
            | DataResource::SmPolicyData => ResourceFamily::PolicyData,
            _ => ResourceFamily::SubscriptionData,
        }
    }

    /// Path below the owner segment.
    pub fn path(self) -> &'static str {
        match self {
            DataResource::Amf3gppAccess => "context-data/amf-3gpp-access",
            DataResource::AmfNon3gppAccess => "context-data/amf-non-3gpp-access",
            DataResource::AuthenticationSubscription => {
                "authentication-data/authentication-subscription"
            }
            DataResource::AuthenticationStatus => "authentication-data/authentication-status",
            DataResource::PpData => "pp-data",
            DataResource::OperatorSpecificData | DataResource::PolicyOperatorSpecificData => {
                "operator-specific-data"
            }
            DataResource::UePolicySet => "ue-policy-set",
            DataResource::SmPolicyData => "sm-data",
        }
    }

    /// Sub-field that ordered patches are scoped to, if any.
    pub fn patch_subfield(self) -> Option<&'static str> {
        match self {
            DataResource::PolicyOperatorSpecificData => Some("operatorSpecificDataContainerMap"),
            _ => None,
        }
    }
}
