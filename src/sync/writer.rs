//! Writes derived SM policy entries to the document store.

use crate::error::{DataRepoError, Result};
use crate::store::{DocumentStore, Filter};
use crate::types::{DataResource, Document, UE_ID_FIELD};
use crossbeam_channel::Receiver;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::types::SmPolicyUpdateEntry;

const SNSSAI_DATA_FIELD: &str = "smPolicySnssaiData";
const DNN_DATA_FIELD: &str = "smPolicyDnnData";

/// Consumer of the policy entry queue.
pub struct SmPolicyWriter {
    store: Arc<dyn DocumentStore>,
}

impl SmPolicyWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record one `(subscriber, dnn, slice)` entry in the subscriber's SM
    /// policy document, creating the document when absent.
    pub fn apply(&self, entry: &SmPolicyUpdateEntry) -> Result<()> {
        let ue_id = entry.ue_id();
        let collection = DataResource::SmPolicyData.collection();
        let filter = Filter::by(UE_ID_FIELD, ue_id.as_str());
        debug!(ue_id = %ue_id, dnn = %entry.dnn, sst = entry.snssai.sst, "writing sm policy entry");

        let mut doc = match self.store.get_one(collection, &filter)? {
            Some(doc) => doc,
            None => {
                let mut doc = Document::new();
                doc.insert(UE_ID_FIELD.to_string(), Value::String(ue_id.clone()));
                doc
            }
        };

        let slices = object_field(&mut doc, SNSSAI_DATA_FIELD)?;
        let slice = match slices.entry(entry.snssai.to_key()).or_insert_with(|| {
            Value::Object(Map::new())
        }) {
            Value::Object(slice) => slice,
            _ => return Err(malformed(&ue_id, "slice entry")),
        };
        slice.insert("snssai".to_string(), serde_json::to_value(&entry.snssai)?);

        let dnns = object_field(slice, DNN_DATA_FIELD)?;
        let mut dnn_data = Map::new();
        dnn_data.insert("dnn".to_string(), Value::String(entry.dnn.clone()));
        dnns.insert(entry.dnn.clone(), Value::Object(dnn_data));

        self.store.put_one(collection, &filter, doc)?;
        Ok(())
    }

    /// Drain the queue until it disconnects. Returns the number of entries
    /// written; failed entries are logged and skipped.
    pub fn run(&self, entries: Receiver<SmPolicyUpdateEntry>) -> u64 {
        let mut written = 0;
        for entry in entries.iter() {
            match self.apply(&entry) {
                Ok(()) => written += 1,
                Err(e) => {
                    error!(imsi = %entry.imsi, dnn = %entry.dnn, error = %e, "failed to write sm policy entry")
                }
            }
        }
        info!(written, "sm policy queue closed");
        written
    }
}

fn object_field<'a>(doc: &'a mut Document, field: &str) -> Result<&'a mut Document> {
    match doc
        .entry(field.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(map) => Ok(map),
        _ => Err(DataRepoError::Unspecified(format!("{} is not an object", field))),
    }
}

fn malformed(ue_id: &str, what: &str) -> DataRepoError {
    DataRepoError::Unspecified(format!("sm policy document of {} has a malformed {}", ue_id, what))
}
