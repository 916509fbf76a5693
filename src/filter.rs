//! Read-path query filtering.
//!
//! A query is a conjunction of field matches. Each field match is a
//! disjunction over the supplied values: a document passes a field if its
//! stored value equals any of them, and passes the query if it passes every
//! field. A stored array passes if any element does. Fields with no values
//! are not part of the query.

use crate::error::{DataRepoError, Result};
use crate::types::{Document, Snssai};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Raw query parameters: name to every value supplied for it.
pub type QueryParams = HashMap<String, Vec<String>>;

#[derive(Clone, Debug, PartialEq)]
enum FieldMatch {
    Strings { field: String, values: Vec<String> },
    Snssais { field: String, values: Vec<Snssai> },
}

impl FieldMatch {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            FieldMatch::Strings { field, values } => doc
                .get(field)
                .map(|stored| any_element(stored, |v| string_matches(v, values)))
                .unwrap_or(false),
            FieldMatch::Snssais { field, values } => doc
                .get(field)
                .map(|stored| any_element(stored, |v| snssai_matches(v, values)))
                .unwrap_or(false),
        }
    }
}

fn any_element<F>(stored: &Value, f: F) -> bool
where
    F: Fn(&Value) -> bool,
{
    match stored {
        Value::Array(items) => items.iter().any(f),
        scalar => f(scalar),
    }
}

fn string_matches(stored: &Value, values: &[String]) -> bool {
    stored
        .as_str()
        .map(|s| values.iter().any(|v| v == s))
        .unwrap_or(false)
}

fn snssai_matches(stored: &Value, values: &[Snssai]) -> bool {
    match serde_json::from_value::<Snssai>(stored.clone()) {
        Ok(snssai) => values.contains(&snssai),
        Err(e) => {
            debug!(error = %e, "stored slice selector is unreadable");
            false
        }
    }
}

/// Conjunction of per-field disjunctions over stored documents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentQuery {
    fields: Vec<FieldMatch>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal one of `values`. Ignored when `values` is
    /// empty.
    pub fn string_field(mut self, field: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.fields.push(FieldMatch::Strings {
                field: field.to_string(),
                values: values.to_vec(),
            });
        }
        self
    }

    /// Require the slice selector at `field` to equal one of `values`.
    /// Ignored when `values` is empty.
    pub fn snssai_field(mut self, field: &str, values: &[Snssai]) -> Self {
        if !values.is_empty() {
            self.fields.push(FieldMatch::Snssais {
                field: field.to_string(),
                values: values.to_vec(),
            });
        }
        self
    }

    /// True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.fields.iter().all(|f| f.matches(doc))
    }

    /// Keep the matching documents, in their original order.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        docs.into_iter().filter(|d| self.matches(d)).collect()
    }
}

fn parse_snssai(raw: &str) -> Result<Snssai> {
    serde_json::from_str(raw).map_err(|e| {
        DataRepoError::MalformedRequestSyntax(format!("Invalid snssai query parameter: {}", e))
    })
}

fn values_of(params: &QueryParams, name: &str) -> Vec<String> {
    params.get(name).cloned().unwrap_or_default()
}

fn single_value(params: &QueryParams, name: &str) -> Result<Option<String>> {
    match params.get(name).map(Vec::as_slice) {
        None | Some([]) => Ok(None),
        Some([one]) => Ok(Some(one.clone())),
        Some(_) => Err(DataRepoError::MalformedRequestSyntax(format!(
            "Too many {} query parameters",
            name
        ))),
    }
}

/// Query over traffic influence data. Every parameter is multi-valued.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfluenceDataQuery {
    pub influence_ids: Vec<String>,
    pub dnns: Vec<String>,
    pub snssais: Vec<Snssai>,
    pub internal_group_ids: Vec<String>,
    pub supis: Vec<String>,
}

impl InfluenceDataQuery {
    /// Build from `influence-Ids`, `dnns`, `snssais`, `internal-Group-Ids`
    /// and `supis`. At least one must be present.
    pub fn from_params(params: &QueryParams) -> Result<Self> {
        let snssais = values_of(params, "snssais")
            .iter()
            .map(|raw| parse_snssai(raw))
            .collect::<Result<Vec<_>>>()?;

        let query = Self {
            influence_ids: values_of(params, "influence-Ids"),
            dnns: values_of(params, "dnns"),
            snssais,
            internal_group_ids: values_of(params, "internal-Group-Ids"),
            supis: values_of(params, "supis"),
        };

        if query.to_document_query().is_empty() {
            return Err(DataRepoError::MalformedRequestSyntax(
                "No query parameters".to_string(),
            ));
        }
        Ok(query)
    }

    pub fn to_document_query(&self) -> DocumentQuery {
        DocumentQuery::new()
            .string_field("influenceId", &self.influence_ids)
            .string_field("dnn", &self.dnns)
            .string_field("interGroupId", &self.internal_group_ids)
            .string_field("supi", &self.supis)
            .snssai_field("snssai", &self.snssais)
    }
}

/// Query over influence-data subscriptions. Every parameter is
/// single-valued.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfluenceSubsQuery {
    pub dnn: Option<String>,
    pub snssai: Option<Snssai>,
    pub internal_group_id: Option<String>,
    pub supi: Option<String>,
}

impl InfluenceSubsQuery {
    /// Build from `dnn`, `snssai`, `internal-Group-Id` and `supi`. At least
    /// one must be present and none may repeat.
    pub fn from_params(params: &QueryParams) -> Result<Self> {
        let dnn = single_value(params, "dnn")?;
        let snssai = single_value(params, "snssai")?;
        let internal_group_id = single_value(params, "internal-Group-Id")?;
        let supi = single_value(params, "supi")?;

        if dnn.is_none() && snssai.is_none() && internal_group_id.is_none() && supi.is_none() {
            return Err(DataRepoError::MalformedRequestSyntax(
                "No query parameters".to_string(),
            ));
        }

        Ok(Self {
            dnn,
            snssai: snssai.as_deref().map(parse_snssai).transpose()?,
            internal_group_id,
            supi,
        })
    }

    pub fn to_document_query(&self) -> DocumentQuery {
        DocumentQuery::new()
            .string_field("dnns", self.dnn.as_slice())
            .string_field("internalGroupIds", self.internal_group_id.as_slice())
            .string_field("supis", self.supi.as_slice())
            .snssai_field("snssais", self.snssai.as_slice())
    }
}
