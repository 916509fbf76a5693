//! Supported PLMN set.

use crate::types::PlmnId;
use parking_lot::RwLock;

/// Distinct PLMN identifiers the function serves.
///
/// Append-only. Written by the synchronizer, read by request handlers.
#[derive(Debug, Default)]
pub struct PlmnSupportSet {
    plmns: RwLock<Vec<PlmnId>>,
}

impl PlmnSupportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with configured PLMNs, dropping duplicates.
    pub fn with_plmns(plmns: impl IntoIterator<Item = PlmnId>) -> Self {
        let set = Self::new();
        for plmn in plmns {
            set.insert(plmn);
        }
        set
    }

    /// Add a PLMN unless an equal `(mcc, mnc)` pair is present. Returns
    /// whether it was added.
    pub fn insert(&self, plmn: PlmnId) -> bool {
        let mut plmns = self.plmns.write();
        if plmns.contains(&plmn) {
            return false;
        }
        plmns.push(plmn);
        true
    }

    pub fn contains(&self, plmn: &PlmnId) -> bool {
        self.plmns.read().contains(plmn)
    }

    /// Current members in insertion order.
    pub fn snapshot(&self) -> Vec<PlmnId> {
        self.plmns.read().clone()
    }

    pub fn len(&self) -> usize {
        self.plmns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plmns.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_exact_match_dedup() {
        let set = PlmnSupportSet::new();
        assert!(set.insert(PlmnId::new("001", "01")));
        assert!(!set.insert(PlmnId::new("001", "01")));
        assert!(set.insert(PlmnId::new("001", "001")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_seeded_set_drops_duplicates() {
        let set = PlmnSupportSet::with_plmns(vec![
            PlmnId::new("208", "93"),
            PlmnId::new("208", "93"),
        ]);
        assert_eq!(set.snapshot(), vec![PlmnId::new("208", "93")]);
    }
}
