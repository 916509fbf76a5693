//! Subscription registry.

use crate::error::{DataRepoError, Result, SUBSCRIPTION_NOT_FOUND, USER_NOT_FOUND};
use crate::types::OwnerKey;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::types::{NewSubscription, Subscription, SubscriptionClass, SubscriptionId};

/// Subscriptions of one owner, ordered by class then id.
#[derive(Default)]
struct OwnerCollection {
    records: RwLock<BTreeMap<(SubscriptionClass, SubscriptionId), Subscription>>,
}

/// Holds every subscription of the process.
///
/// Owner collections are created lazily on first subscription. Creation goes
/// through the owner map's write lock, so concurrent first subscribers for
/// the same owner share one collection. Ids come from one counter per class
/// and are never handed out twice.
pub struct SubscriptionRegistry {
    /// Owner collections by owner key.
    owners: RwLock<HashMap<OwnerKey, Arc<OwnerCollection>>>,
    /// Next id per subscription class.
    next_ids: [AtomicU64; SubscriptionClass::ALL.len()],
    /// How many owner collections were ever created.
    collections_created: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            owners: RwLock::new(HashMap::new()),
            next_ids: std::array::from_fn(|_| AtomicU64::new(1)),
            collections_created: AtomicU64::new(0),
        }
    }

    /// Reserve the next id of a class without storing a record.
    pub fn next_id(&self, class: SubscriptionClass) -> SubscriptionId {
        SubscriptionId(self.next_ids[class.index()].fetch_add(1, Ordering::SeqCst))
    }

    /// Register a subscription and return the stored record.
    pub fn create(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        request: NewSubscription,
    ) -> Subscription {
        let collection = self.collection_or_create(owner);
        let id = self.next_id(class);

        let subscription = Subscription {
            id,
            owner: owner.clone(),
            class,
            filter_criteria: request.filter_criteria,
            target_uri: request.target_uri,
            payload: request.payload,
            amf_subscription_info: None,
        };

        collection
            .records
            .write()
            .insert((class, id), subscription.clone());

        debug!(owner = %owner, ?class, %id, "subscription created");
        subscription
    }

    /// Fetch one subscription.
    pub fn get(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
    ) -> Result<Subscription> {
        let collection = self.collection(owner)?;
        let records = collection.records.read();
        records
            .get(&(class, id))
            .cloned()
            .ok_or(DataRepoError::NotFound(SUBSCRIPTION_NOT_FOUND))
    }

    /// All subscriptions of a class for an owner, ordered by id.
    pub fn list(&self, owner: &OwnerKey, class: SubscriptionClass) -> Result<Vec<Subscription>> {
        let collection = match self.collection(owner) {
            Ok(collection) => collection,
            Err(_) if *owner == OwnerKey::Global => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let records = collection.records.read();
        Ok(records
            .range((class, SubscriptionId(0))..=(class, SubscriptionId(u64::MAX)))
            .map(|(_, sub)| sub.clone())
            .collect())
    }

    /// Replace the caller-supplied parts of a subscription. Id, owner, class
    /// and attached AMF info are kept.
    pub fn update(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
        request: NewSubscription,
    ) -> Result<Subscription> {
        self.modify(owner, class, id, |sub| {
            sub.filter_criteria = request.filter_criteria;
            sub.target_uri = request.target_uri;
            sub.payload = request.payload;
            Ok(sub.clone())
        })
    }

    /// Run `f` against a stored subscription under the collection lock.
    ///
    /// If `f` fails the record is left as it was.
    pub fn modify<T, F>(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Subscription) -> Result<T>,
    {
        let collection = self.collection(owner)?;
        let mut records = collection.records.write();
        let stored = records
            .get_mut(&(class, id))
            .ok_or(DataRepoError::NotFound(SUBSCRIPTION_NOT_FOUND))?;

        let mut working = stored.clone();
        let out = f(&mut working)?;
        *stored = working;
        Ok(out)
    }

    /// Remove a subscription. Its id is not reused.
    pub fn delete(
        &self,
        owner: &OwnerKey,
        class: SubscriptionClass,
        id: SubscriptionId,
    ) -> Result<()> {
        let collection = self.collection(owner)?;
        let removed = collection.records.write().remove(&(class, id));
        match removed {
            Some(_) => {
                debug!(owner = %owner, ?class, %id, "subscription deleted");
                Ok(())
            }
            None => Err(DataRepoError::NotFound(SUBSCRIPTION_NOT_FOUND)),
        }
    }

    /// Clones of every subscription of `class` accepted by `predicate`.
    pub fn matching<F>(&self, class: SubscriptionClass, predicate: F) -> Vec<Subscription>
    where
        F: Fn(&Subscription) -> bool,
    {
        let collections: Vec<Arc<OwnerCollection>> =
            self.owners.read().values().cloned().collect();

        let mut found = Vec::new();
        for collection in collections {
            let records = collection.records.read();
            found.extend(
                records
                    .range((class, SubscriptionId(0))..=(class, SubscriptionId(u64::MAX)))
                    .map(|(_, sub)| sub)
                    .filter(|sub| predicate(sub))
                    .cloned(),
            );
        }
        found.sort_by_key(|sub| sub.id);
        found
    }

    /// Number of owners with a collection.
    pub fn owner_count(&self) -> usize {
        self.owners.read().len()
    }

    /// Number of owner collections created since startup.
    pub fn collections_created(&self) -> u64 {
        self.collections_created.load(Ordering::SeqCst)
    }

    /// The global scope always exists, so a miss there is a missing
    /// subscription rather than a missing user.
    fn collection(&self, owner: &OwnerKey) -> Result<Arc<OwnerCollection>> {
        match self.owners.read().get(owner) {
            Some(collection) => Ok(Arc::clone(collection)),
            None if *owner == OwnerKey::Global => {
                Err(DataRepoError::NotFound(SUBSCRIPTION_NOT_FOUND))
            }
            None => Err(DataRepoError::NotFound(USER_NOT_FOUND)),
        }
    }

    fn collection_or_create(&self, owner: &OwnerKey) -> Arc<OwnerCollection> {
        if let Some(existing) = self.owners.read().get(owner) {
            return Arc::clone(existing);
        }

        let mut owners = self.owners.write();
        let collection = owners.entry(owner.clone()).or_insert_with(|| {
            self.collections_created.fetch_add(1, Ordering::SeqCst);
            Arc::new(OwnerCollection::default())
        });
        Arc::clone(collection)
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
