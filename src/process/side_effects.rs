//! Traversal-global side-effect store
//!
//! Keys are registered with an optional initial-value supplier and an
//! optional reducer. Without a reducer, [`SideEffects::add`] assigns.

use crate::error::{TraversalError, TraversalResult};
use crate::structure::Value;
use crate::util::Supplier;
use indexmap::IndexMap;
use std::sync::Arc;

/// Folds a new value into the current one
pub type Reducer = Arc<dyn Fn(Value, Value) -> Value + Send + Sync>;

/// Reducer that appends to a list, starting one when needed
pub fn append_reducer() -> Reducer {
    Arc::new(|current, value| match current {
        Value::List(mut items) => {
            items.push(value);
            Value::List(items)
        }
        other => Value::List(vec![other, value]),
    })
}

#[derive(Clone, Default)]
struct Slot {
    value: Option<Value>,
    supplier: Option<Arc<dyn Supplier<Value>>>,
    reducer: Option<Reducer>,
}

#[derive(Clone, Default)]
pub struct SideEffects {
    slots: IndexMap<String, Slot>,
}

impl SideEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key`, replacing any previous supplier and reducer
    pub fn register(
        &mut self,
        key: impl Into<String>,
        supplier: Option<Arc<dyn Supplier<Value>>>,
        reducer: Option<Reducer>,
    ) {
        let slot = self.slots.entry(key.into()).or_default();
        if supplier.is_some() {
            slot.supplier = supplier;
        }
        if reducer.is_some() {
            slot.reducer = reducer;
        }
    }

    /// Declare `key`, keeping a supplier or reducer already present
    pub fn register_if_absent(
        &mut self,
        key: impl Into<String>,
        supplier: Option<Arc<dyn Supplier<Value>>>,
        reducer: Option<Reducer>,
    ) {
        let slot = self.slots.entry(key.into()).or_default();
        if slot.supplier.is_none() {
            slot.supplier = supplier;
        }
        if slot.reducer.is_none() {
            slot.reducer = reducer;
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Current value, materialized from the supplier on first access
    pub fn get(&mut self, key: &str) -> TraversalResult<Value> {
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| TraversalError::SideEffectNotFound(key.to_string()))?;
        if let Some(value) = &slot.value {
            return Ok(value.clone());
        }
        let value = slot
            .supplier
            .as_ref()
            .map(|s| s.get())
            .ok_or_else(|| TraversalError::SideEffectNotFound(key.to_string()))?;
        slot.value = Some(value.clone());
        Ok(value)
    }

    /// Value without materializing from the supplier
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.slots.get(key).and_then(|s| s.value.as_ref())
    }

    /// Overwrite the value of a registered key
    pub fn set(&mut self, key: &str, value: Value) -> TraversalResult<()> {
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| TraversalError::SideEffectNotFound(key.to_string()))?;
        slot.value = Some(value);
        Ok(())
    }

    /// Fold `value` into `key` with its reducer
    pub fn add(&mut self, key: &str, value: Value) -> TraversalResult<()> {
        let current = self.get(key).ok();
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| TraversalError::SideEffectNotFound(key.to_string()))?;
        slot.value = Some(match (current, &slot.reducer) {
            (Some(current), Some(reducer)) => reducer(current, value),
            _ => value,
        });
        Ok(())
    }

    /// Forget `key` entirely
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.slots.shift_remove(key).and_then(|s| s.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Drop every value; registrations stay
    pub fn reset(&mut self) {
        for slot in self.slots.values_mut() {
            slot.value = None;
        }
    }
}

impl std::fmt::Debug for SideEffects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(k, s)| (k, &s.value)))
            .finish()
    }
}
