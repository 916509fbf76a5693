//! Data repository facade tying the store, patch engine, notification
//! pipeline and subscription registry together.

use crate::error::{
    DataRepoError, Result, AMF_SUBSCRIPTION_NOT_FOUND, DATA_NOT_FOUND, USER_NOT_FOUND,
};
use crate::filter::{InfluenceDataQuery, InfluenceSubsQuery};
use crate::notify::{NotificationPipeline, Notifier};
use crate::patch::{apply_patch, diff, PatchEngine};
use crate::store::{DocumentStore, Filter};
use crate::subscriptions::{
    Created, NewSubscription, Subscription, SubscriptionClass, SubscriptionId,
    SubscriptionRegistry,
};
use crate::types::{DataResource, Document, OwnerKey, PatchItem, Snssai, UE_ID_FIELD};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collection of traffic influence data.
pub const INFLUENCE_DATA_COLLECTION: &str = "applicationData.influenceData";

/// Collection of influence-data change subscriptions.
pub const INFLUENCE_SUBS_COLLECTION: &str = "applicationData.influenceData.subsToNotify";

/// Store-assigned document id, never returned to callers.
const STORE_ID_FIELD: &str = "_id";
const INFLUENCE_ID_FIELD: &str = "influenceId";
const SUBSCRIPTION_ID_FIELD: &str = "subscriptionId";
const AF_APP_ID_FIELD: &str = "afAppId";

/// Outcome of an upsert-style replace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// No document existed; one was created.
    Created,
    /// An existing document was replaced.
    Replaced,
}

impl PutOutcome {
    pub fn status(self) -> u16 {
        match self {
            PutOutcome::Created => 201,
            PutOutcome::Replaced => 200,
        }
    }
}

/// Transport status of successful updates and deletes.
pub const STATUS_NO_CONTENT: u16 = 204;

/// A created influence-data subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct InfluenceSubscriptionCreated {
    pub id: SubscriptionId,
    pub location: String,
    pub body: Document,
}

/// The data repository service.
///
/// Constructed once and shared by `Arc`; holds no global state.
pub struct DataRepository {
    store: Arc<dyn DocumentStore>,
    registry: Arc<SubscriptionRegistry>,
    engine: PatchEngine,
    pipeline: NotificationPipeline,
}

impl DataRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<SubscriptionRegistry>,
        notifier: Arc<dyn Notifier>,
        api_root: impl Into<String>,
    ) -> Self {
        Self {
            engine: PatchEngine::new(Arc::clone(&store)),
            pipeline: NotificationPipeline::new(api_root, notifier),
            store,
            registry,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn pipeline(&self) -> &NotificationPipeline {
        &self.pipeline
    }

    pub fn api_root(&self) -> &str {
        self.pipeline.api_root()
    }

    // --- Subscriber documents ---

    /// Read a subscriber document.
    pub fn get(&self, ue_id: &str, resource: DataResource) -> Result<Document> {
        info!(ue_id, ?resource, "handle get");
        let doc = self
            .store
            .get_one(resource.collection(), &Filter::by(UE_ID_FIELD, ue_id))?
            .ok_or(DataRepoError::NotFound(DATA_NOT_FOUND))?;
        Ok(strip(doc, &[STORE_ID_FIELD, UE_ID_FIELD]))
    }

    /// Create or replace a subscriber document.
    pub fn put(&self, ue_id: &str, resource: DataResource, mut doc: Document) -> Result<PutOutcome> {
        info!(ue_id, ?resource, "handle put");
        doc.insert(UE_ID_FIELD.to_string(), Value::String(ue_id.to_string()));

        let existed = self
            .store
            .put_one(resource.collection(), &Filter::by(UE_ID_FIELD, ue_id), doc)?;
        Ok(if existed {
            PutOutcome::Replaced
        } else {
            PutOutcome::Created
        })
    }

    /// Delete a subscriber document. Deleting a missing document succeeds.
    pub fn delete(&self, ue_id: &str, resource: DataResource) -> Result<()> {
        info!(ue_id, ?resource, "handle delete");
        self.store
            .delete_one(resource.collection(), &Filter::by(UE_ID_FIELD, ue_id))?;
        Ok(())
    }

    /// Apply ordered patch operations and notify once on success.
    pub fn patch(&self, ue_id: &str, resource: DataResource, items: &[PatchItem]) -> Result<()> {
        info!(ue_id, ?resource, ops = items.len(), "handle patch");
        let snapshot = self.engine.patch(
            resource.collection(),
            &Filter::by(UE_ID_FIELD, ue_id),
            items,
            resource.patch_subfield(),
        )?;

        self.pipeline.dispatch(
            &OwnerKey::subscriber(ue_id),
            resource,
            items.to_vec(),
            snapshot,
        );
        Ok(())
    }

    /// Merge a partial document and notify once on success. The event
    /// carries the operations that turn the old document into the new one.
    pub fn merge(&self, ue_id: &str, resource: DataResource, partial: &Document) -> Result<()> {
        info!(ue_id, ?resource, "handle merge");
        let snapshot =
            self.engine
                .merge(resource.collection(), &Filter::by(UE_ID_FIELD, ue_id), partial)?;

        // The write has happened; dispatch regardless.
        let operations = diff(&snapshot.before, &snapshot.after).unwrap_or_else(|e| {
            warn!(ue_id, ?resource, error = %e, "merge diff unavailable");
            Vec::new()
        });
        self.pipeline
            .dispatch(&OwnerKey::subscriber(ue_id), resource, operations, snapshot);
        Ok(())
    }

    /// SM policy data of a subscriber, optionally required to hold a slice
    /// and a DNN within that slice.
    pub fn sm_policy_data(
        &self,
        ue_id: &str,
        snssai: Option<&Snssai>,
        dnn: Option<&str>,
    ) -> Result<Document> {
        info!(ue_id, "handle sm policy data get");
        let mut filter = Filter::by(UE_ID_FIELD, ue_id);
        if let Some(snssai) = snssai {
            let key = snssai.to_key();
            filter = filter.exists(&format!("smPolicySnssaiData.{}", key));
            if let Some(dnn) = dnn {
                filter =
                    filter.exists(&format!("smPolicySnssaiData.{}.smPolicyDnnData.{}", key, dnn));
            }
        }

        let doc = self
            .store
            .get_one(DataResource::SmPolicyData.collection(), &filter)?
            .ok_or(DataRepoError::NotFound(USER_NOT_FOUND))?;
        Ok(strip(doc, &[STORE_ID_FIELD]))
    }

    // --- Subscriptions ---

    /// Register a subscription and build its resource URI.
    pub fn create_subscription(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        request: NewSubscription,
    ) -> Created {
        info!(owner = %owner, ?class, "handle subscription create");
        let subscription = self.registry.create(owner, class, request);
        let location = self.location(class, owner, subscription.id);
        debug!(location = %location, "subscription location");
        Created {
            subscription,
            location,
        }
    }

    pub fn subscription(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
    ) -> Result<Subscription> {
        self.registry.get(owner, class, id)
    }

    pub fn subscriptions(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
    ) -> Result<Vec<Subscription>> {
        self.registry.list(owner, class)
    }

    pub fn update_subscription(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
        request: NewSubscription,
    ) -> Result<()> {
        info!(owner = %owner, ?class, %id, "handle subscription update");
        self.registry.update(owner, class, id, request).map(|_| ())
    }

    pub fn delete_subscription(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
    ) -> Result<()> {
        info!(owner = %owner, ?class, %id, "handle subscription delete");
        self.registry.delete(owner, class, id)
    }

    fn location(&self, class: SubscriptionClass, owner: &OwnerKey, id: SubscriptionId) -> String {
        format!("{}/{}", self.api_root(), class.location_path(owner, id))
    }

    // --- AMF subscription info on event exposure subscriptions ---

    /// Attach AMF subscription info, replacing any already attached.
    pub fn create_amf_subscription_info(
        &self,
        ue_id: &str,
        id: SubscriptionId,
        infos: Value,
    ) -> Result<()> {
        info!(ue_id, %id, "handle amf subscription info create");
        self.registry
            .modify(&OwnerKey::subscriber(ue_id), SubscriptionClass::Ee, id, |sub| {
                sub.amf_subscription_info = Some(infos);
                Ok(())
            })
    }

    pub fn amf_subscription_info(&self, ue_id: &str, id: SubscriptionId) -> Result<Value> {
        self.registry
            .get(&OwnerKey::subscriber(ue_id), SubscriptionClass::Ee, id)?
            .amf_subscription_info
            .ok_or(DataRepoError::NotFound(AMF_SUBSCRIPTION_NOT_FOUND))
    }

    /// Patch the attached AMF subscription info. All or nothing.
    pub fn modify_amf_subscription_info(
        &self,
        ue_id: &str,
        id: SubscriptionId,
        items: &[PatchItem],
    ) -> Result<()> {
        info!(ue_id, %id, "handle amf subscription info modify");
        self.registry
            .modify(&OwnerKey::subscriber(ue_id), SubscriptionClass::Ee, id, |sub| {
                let current = sub
                    .amf_subscription_info
                    .as_ref()
                    .ok_or(DataRepoError::NotFound(AMF_SUBSCRIPTION_NOT_FOUND))?;
                sub.amf_subscription_info = Some(apply_patch(current, items)?);
                Ok(())
            })
    }

    pub fn remove_amf_subscription_info(&self, ue_id: &str, id: SubscriptionId) -> Result<()> {
        info!(ue_id, %id, "handle amf subscription info remove");
        self.registry
            .modify(&OwnerKey::subscriber(ue_id), SubscriptionClass::Ee, id, |sub| {
                sub.amf_subscription_info
                    .take()
                    .map(|_| ())
                    .ok_or(DataRepoError::NotFound(AMF_SUBSCRIPTION_NOT_FOUND))
            })
    }

    // --- Traffic influence data ---

    /// Create or replace one influence data record.
    pub fn put_influence_data(&self, influence_id: &str, mut doc: Document) -> Result<PutOutcome> {
        info!(influence_id, "handle influence data put");
        doc.insert(
            INFLUENCE_ID_FIELD.to_string(),
            Value::String(influence_id.to_string()),
        );

        let existed = self.store.put_one(
            INFLUENCE_DATA_COLLECTION,
            &Filter::by(INFLUENCE_ID_FIELD, influence_id),
            doc,
        )?;
        Ok(if existed {
            PutOutcome::Replaced
        } else {
            PutOutcome::Created
        })
    }

    /// Replace an existing influence data record with the fields of
    /// `patch`. The stored `afAppId` survives; `internalGroupId` is stored as
    /// `interGroupId`. Returns the new record.
    pub fn patch_influence_data(&self, influence_id: &str, patch: Document) -> Result<Document> {
        info!(influence_id, "handle influence data patch");
        let filter = Filter::by(INFLUENCE_ID_FIELD, influence_id);
        let old = self
            .store
            .get_one(INFLUENCE_DATA_COLLECTION, &filter)?
            .ok_or(DataRepoError::NotFound(DATA_NOT_FOUND))?;

        let mut record: Document = patch
            .into_iter()
            .filter(|(key, _)| key != AF_APP_ID_FIELD && key != INFLUENCE_ID_FIELD)
            .map(|(key, value)| match key.as_str() {
                "internalGroupId" => ("interGroupId".to_string(), value),
                _ => (key, value),
            })
            .collect();
        if let Some(app_id) = old.get(AF_APP_ID_FIELD) {
            record.insert(AF_APP_ID_FIELD.to_string(), app_id.clone());
        }
        record.insert(
            INFLUENCE_ID_FIELD.to_string(),
            Value::String(influence_id.to_string()),
        );

        self.store
            .put_one(INFLUENCE_DATA_COLLECTION, &filter, record.clone())?;
        Ok(strip(record, &[INFLUENCE_ID_FIELD]))
    }

    /// Influence data records accepted by `query`.
    pub fn query_influence_data(&self, query: &InfluenceDataQuery) -> Result<Vec<Document>> {
        info!(?query, "handle influence data query");
        let all = self
            .store
            .get_many(INFLUENCE_DATA_COLLECTION, &Filter::new())?;

        Ok(query
            .to_document_query()
            .apply(all)
            .into_iter()
            .map(|doc| strip(doc, &[STORE_ID_FIELD, INFLUENCE_ID_FIELD]))
            .collect())
    }

    pub fn delete_influence_data(&self, influence_id: &str) -> Result<()> {
        info!(influence_id, "handle influence data delete");
        self.store.delete_one(
            INFLUENCE_DATA_COLLECTION,
            &Filter::by(INFLUENCE_ID_FIELD, influence_id),
        )?;
        Ok(())
    }

    // --- Influence data subscriptions ---

    /// Store a new influence-data subscription under a fresh id.
    pub fn create_influence_subscription(
        &self,
        mut doc: Document,
    ) -> Result<InfluenceSubscriptionCreated> {
        let id = self.registry.next_id(SubscriptionClass::InfluenceData);
        info!(%id, "handle influence subscription create");

        doc.insert(
            SUBSCRIPTION_ID_FIELD.to_string(),
            Value::String(id.to_string()),
        );
        self.store.put_one(
            INFLUENCE_SUBS_COLLECTION,
            &Filter::by(SUBSCRIPTION_ID_FIELD, id.to_string()),
            doc.clone(),
        )?;

        Ok(InfluenceSubscriptionCreated {
            id,
            location: self.location(SubscriptionClass::InfluenceData, &OwnerKey::Global, id),
            body: strip(doc, &[SUBSCRIPTION_ID_FIELD]),
        })
    }

    pub fn influence_subscription(&self, id: SubscriptionId) -> Result<Document> {
        let doc = self
            .store
            .get_one(
                INFLUENCE_SUBS_COLLECTION,
                &Filter::by(SUBSCRIPTION_ID_FIELD, id.to_string()),
            )?
            .ok_or(DataRepoError::NotFound(DATA_NOT_FOUND))?;
        Ok(strip(doc, &[STORE_ID_FIELD, SUBSCRIPTION_ID_FIELD]))
    }

    /// Replace an existing influence-data subscription.
    pub fn replace_influence_subscription(
        &self,
        id: SubscriptionId,
        mut doc: Document,
    ) -> Result<Document> {
        info!(%id, "handle influence subscription replace");
        let filter = Filter::by(SUBSCRIPTION_ID_FIELD, id.to_string());
        if self.store.get_one(INFLUENCE_SUBS_COLLECTION, &filter)?.is_none() {
            return Err(DataRepoError::NotFound(DATA_NOT_FOUND));
        }

        doc.insert(
            SUBSCRIPTION_ID_FIELD.to_string(),
            Value::String(id.to_string()),
        );
        self.store
            .put_one(INFLUENCE_SUBS_COLLECTION, &filter, doc.clone())?;
        Ok(strip(doc, &[SUBSCRIPTION_ID_FIELD]))
    }

    pub fn delete_influence_subscription(&self, id: SubscriptionId) -> Result<()> {
        info!(%id, "handle influence subscription delete");
        self.store.delete_one(
            INFLUENCE_SUBS_COLLECTION,
            &Filter::by(SUBSCRIPTION_ID_FIELD, id.to_string()),
        )?;
        Ok(())
    }

    /// Influence-data subscriptions accepted by `query`.
    pub fn query_influence_subscriptions(&self, query: &InfluenceSubsQuery) -> Result<Vec<Document>> {
        info!(?query, "handle influence subscription query");
        let all = self
            .store
            .get_many(INFLUENCE_SUBS_COLLECTION, &Filter::new())?;

        Ok(query
            .to_document_query()
            .apply(all)
            .into_iter()
            .map(|doc| strip(doc, &[STORE_ID_FIELD, SUBSCRIPTION_ID_FIELD]))
            .collect())
    }
}

fn strip(mut doc: Document, fields: &[&str]) -> Document {
    for field in fields {
        doc.remove(*field);
    }
    doc
}
