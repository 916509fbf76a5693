//! Slice configuration input and derived entries.

use crate::error::{DataRepoError, Result};
use crate::types::{PlmnId, Snssai};
use serde::{Deserialize, Serialize};

/// One message of the slice configuration stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSliceBatch {
    #[serde(default)]
    pub network_slice: Vec<NetworkSlice>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSlice {
    pub name: String,
    #[serde(default)]
    pub nssai: Option<Nssai>,
    #[serde(default)]
    pub site: Option<SiteInfo>,
    #[serde(default)]
    pub device_group: Vec<DeviceGroup>,
}

/// Slice selector as carried on the configuration stream: `sst` is a
/// decimal string and an empty `sd` means no differentiator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nssai {
    pub sst: String,
    #[serde(default)]
    pub sd: String,
}

impl Nssai {
    pub fn new(sst: impl Into<String>, sd: impl Into<String>) -> Self {
        Self {
            sst: sst.into(),
            sd: sd.into(),
        }
    }

    /// Convert to a typed selector.
    pub fn to_snssai(&self) -> Result<Snssai> {
        let sst = self.sst.trim().parse::<u8>().map_err(|e| {
            DataRepoError::MalformedRequestSyntax(format!("invalid sst {:?}: {}", self.sst, e))
        })?;

        Ok(Snssai {
            sst,
            sd: if self.sd.is_empty() {
                None
            } else {
                Some(self.sd.clone())
            },
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub site_name: String,
    #[serde(default)]
    pub plmn: Option<PlmnId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroup {
    pub name: String,
    #[serde(default)]
    pub imsi: Vec<String>,
    #[serde(default)]
    pub ip_domain_details: Vec<IpDomain>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpDomain {
    pub name: String,
    pub dnn_name: String,
}

/// Policy entry derived for one subscriber and one data network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmPolicyUpdateEntry {
    pub imsi: String,
    pub dnn: String,
    pub snssai: Snssai,
}

impl SmPolicyUpdateEntry {
    /// Subscriber key of the policy document.
    pub fn ue_id(&self) -> String {
        format!("imsi-{}", self.imsi)
    }
}
