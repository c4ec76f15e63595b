//! Utility functions and helpers
//!
//! This module provides naming conventions and the in-memory comparator.

pub mod comparator;
pub mod string;

pub use comparator::UjoComparator;
pub use string::StringUtils;
