// ── Data item registry ──
//
// Flat id → location index over a DeviceModel, used to dispatch stream
// updates without walking the tree by name.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::model::{DataItem, DeviceModel, ItemPath};

/// Lookup from data item id to its position in the owning [`DeviceModel`].
///
/// The registry never owns data items; it resolves ids against the model
/// it was built from.
#[derive(Debug, Clone, Default)]
pub struct DataItemRegistry {
    by_id: HashMap<String, ItemPath>,
    /// Ids in traversal order.
    order: Vec<String>,
}

impl DataItemRegistry {
    /// Flatten `model`, failing on the first repeated id.
    pub fn build(model: &DeviceModel) -> Result<Self, CoreError> {
        let mut registry = Self::default();
        let mut duplicate = None;

        model.visit_data_items(|path, item| {
            if duplicate.is_some() {
                return;
            }
            if registry.by_id.contains_key(&item.id) {
                duplicate = Some(item.id.clone());
                return;
            }
            registry.by_id.insert(item.id.clone(), path);
            registry.order.push(item.id.clone());
        });

        match duplicate {
            Some(id) => Err(CoreError::DuplicateDataItemId { id }),
            None => Ok(registry),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All registered ids, in traversal order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Location of `id` in the model, if registered.
    pub fn path(&self, id: &str) -> Option<&ItemPath> {
        self.by_id.get(id)
    }

    /// Resolve `id` against the model this registry was built from.
    pub fn resolve<'m>(&self, model: &'m DeviceModel, id: &str) -> Option<&'m DataItem> {
        model.data_item(self.by_id.get(id)?)
    }

    pub(crate) fn resolve_mut<'m>(
        &self,
        model: &'m mut DeviceModel,
        id: &str,
    ) -> Option<&'m mut DataItem> {
        model.data_item_mut(self.by_id.get(id)?)
    }
}
