//! Multi-key comparator of Ujo objects

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::models::SortKey;
use crate::ujo::Ujo;

/// Comparator ordering the objects by a list of sort items, nulls last
#[derive(Debug, Clone)]
pub struct UjoComparator<U> {
    keys: Vec<SortKey>,
    _marker: PhantomData<fn(&U)>,
}

impl<U: Ujo> UjoComparator<U> {
    /// Create a comparator of the sort items
    pub fn new(keys: Vec<SortKey>) -> Self {
        UjoComparator {
            keys,
            _marker: PhantomData,
        }
    }

    /// Sort items of the comparator
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Compare two objects, the first unequal sort item decides
    pub fn compare(&self, a: &U, b: &U) -> Ordering {
        for key in &self.keys {
            let left = key.path().read(a);
            let right = key.path().read(b);

            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ordering = left.compare(&right).unwrap_or(Ordering::Equal);
                    if key.is_descending() {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort of the objects
    pub fn sort(&self, items: &mut [U]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}
