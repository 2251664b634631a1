//! Value factories for side-effect slots

use crate::structure::Value;
use std::sync::Arc;

/// Produces a value on demand
pub trait Supplier<T>: Send + Sync {
    fn get(&self) -> T;
}

impl<T, F> Supplier<T> for F
where
    F: Fn() -> T + Send + Sync,
{
    fn get(&self) -> T {
        self()
    }
}

/// Returns the same shared instance on every call
#[derive(Debug)]
pub struct ConstantSupplier<T> {
    value: Arc<T>,
}

impl<T> ConstantSupplier<T> {
    pub fn new(value: T) -> Self {
        Self { value: Arc::new(value) }
    }
}

impl<T> Clone for ConstantSupplier<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: Send + Sync> Supplier<Arc<T>> for ConstantSupplier<T> {
    fn get(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }
}

/// Fresh empty list per call
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSupplier;

impl Supplier<Value> for ListSupplier {
    fn get(&self) -> Value {
        Value::List(Vec::new())
    }
}

impl Supplier<Vec<Value>> for ListSupplier {
    fn get(&self) -> Vec<Value> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_supplier_returns_identical_instance() {
        let supplier = ConstantSupplier::new(vec![1, 2, 3]);
        let a = supplier.get();
        let b = supplier.get();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &supplier.clone().get()));
    }

    #[test]
    fn test_list_supplier_returns_fresh_instances() {
        let supplier = ListSupplier;
        let mut a: Vec<Value> = supplier.get();
        let b: Vec<Value> = supplier.get();
        a.push(Value::from(1));
        assert!(b.is_empty());
        let v: Value = Supplier::<Value>::get(&supplier);
        assert_eq!(v, Value::List(vec![]));
    }

    #[test]
    fn test_closure_supplier() {
        let supplier = || Value::from(0);
        assert_eq!(Supplier::get(&supplier), Value::from(0));
    }
}
