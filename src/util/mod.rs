//! Helpers shared by the process layer

pub mod function;
pub mod iter;
pub mod number;

pub use function::{ConstantSupplier, ListSupplier, Supplier};
pub use iter::DoubleIterator;
pub use number::BulkAccumulator;
