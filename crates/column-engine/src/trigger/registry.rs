use std::collections::HashSet;

use crate::error::PopupError;
use crate::trigger::descriptor::TriggerDescriptor;

/// Ordered descriptor table plus the per-descriptor "shown this session" flag.
///
/// Descriptors are kept sorted by ascending trigger position; the scheduler's
/// tie-breaks and closest-match search rely on it.
#[derive(Debug, Clone)]
pub struct TriggerRegistry {
    descriptors: Vec<TriggerDescriptor>,
    shown: Vec<bool>,
}

impl TriggerRegistry {
    /// Build a registry. Input order does not matter; ids must be unique.
    pub fn new(mut descriptors: Vec<TriggerDescriptor>) -> Result<Self, PopupError> {
        let mut seen = HashSet::with_capacity(descriptors.len());
        for d in &descriptors {
            if !seen.insert(d.id.as_str()) {
                return Err(PopupError::DuplicateDescriptor(d.id.clone()));
            }
        }
        descriptors.sort_by_key(|d| d.trigger_position);
        let shown = vec![false; descriptors.len()];
        Ok(Self { descriptors, shown })
    }

    /// Parse a descriptor table from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, PopupError> {
        let descriptors: Vec<TriggerDescriptor> = serde_json::from_str(json)?;
        Self::new(descriptors)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.id == id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&TriggerDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// All descriptors, ascending by trigger position.
    pub fn all(&self) -> &[TriggerDescriptor] {
        &self.descriptors
    }

    /// Descriptors not yet shown, ascending by trigger position.
    pub fn unshown(&self) -> impl Iterator<Item = &TriggerDescriptor> {
        self.descriptors
            .iter()
            .zip(self.shown.iter())
            .filter(|(_, shown)| !**shown)
            .map(|(d, _)| d)
    }

    pub fn mark_shown(&mut self, id: &str) -> Result<(), PopupError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| PopupError::UnknownDescriptor(id.to_string()))?;
        self.shown[idx] = true;
        Ok(())
    }

    /// Unknown ids report false.
    pub fn is_shown(&self, id: &str) -> bool {
        self.index_of(id).is_some_and(|idx| self.shown[idx])
    }

    pub fn reset_all(&mut self) {
        self.shown.iter_mut().for_each(|s| *s = false);
    }

    pub fn shown_count(&self) -> usize {
        self.shown.iter().filter(|s| **s).count()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
