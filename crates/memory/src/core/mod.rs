//! Core functionality for forge-memory
//!
//! This module contains the fundamental building blocks shared by every
//! allocator:
//! - Capability traits for usage reporting and statistics
//! - Layout constants and the block status type

pub mod traits;
pub mod types;

pub use crate::error::{MemoryError, MemoryResult};
pub use traits::{BasicMemoryUsage, MemoryUsage, StatisticsProvider};
pub use types::BlockStatus;
