//! Object pooling
//!
//! [`FixedPool`] keeps a fixed set of pre-built values and recycles them
//! without ever allocating after construction.

mod fixed;

pub use fixed::{FixedPool, PoolHandle};
