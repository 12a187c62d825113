//! Keyed edit buffer
//!
//! Entries are addressed by their catalog key, never by position. Every edit
//! is applied to a copy of the target entry first, so a rejected edit leaves
//! the buffer exactly as it was.

use serde::Serialize;

use crate::error::{EditError, EditResult};

/// An entry that can be located by a stable string key
pub trait Keyed {
    fn key(&self) -> &str;
}

/// An entry that accepts typed edits
pub trait Editable: Keyed + Clone {
    type Edit;

    fn apply(&mut self, edit: Self::Edit) -> EditResult<()>;
}

/// Ordered set of editable entries for one entitlement dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EditBuffer<T> {
    entries: Vec<T>,
    #[serde(skip)]
    revision: u64,
}

impl<T> Default for EditBuffer<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            revision: 0,
        }
    }
}

impl<T: Editable> EditBuffer<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            entries,
            revision: 0,
        }
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|entry| entry.key() == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of accepted edits since the buffer was built
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.revision > 0
    }

    /// Forget pending edits once the backend has accepted the entries as they are
    pub fn mark_clean(&mut self) {
        self.revision = 0;
    }

    /// Apply `edit` to the entry keyed `key`, leaving every other entry untouched
    pub fn apply(&mut self, key: &str, edit: T::Edit) -> EditResult<()> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.key() == key)
            .ok_or_else(|| EditError::NotFound(key.to_string()))?;

        let mut updated = self.entries[index].clone();
        updated.apply(edit)?;

        self.entries[index] = updated;
        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        id: String,
        value: i32,
    }

    impl Keyed for Counter {
        fn key(&self) -> &str {
            &self.id
        }
    }

    impl Editable for Counter {
        type Edit = i32;

        fn apply(&mut self, edit: i32) -> EditResult<()> {
            if edit < 0 {
                return Err(EditError::InvalidValue(edit.to_string()));
            }
            self.value = edit;
            Ok(())
        }
    }

    fn counters(n: usize) -> EditBuffer<Counter> {
        EditBuffer::new(
            (0..n)
                .map(|i| Counter {
                    id: format!("c{}", i),
                    value: 0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_apply_only_touches_target() {
        let mut buffer = counters(5);
        let before = buffer.clone();

        buffer.apply("c2", 7).unwrap();

        for (i, (old, new)) in before.entries().iter().zip(buffer.entries()).enumerate() {
            if i == 2 {
                assert_eq!(new.value, 7);
            } else {
                assert_eq!(old, new);
            }
        }
        assert_eq!(buffer.revision(), 1);
        assert!(buffer.is_dirty());
    }

    #[test]
    fn test_rejected_edit_leaves_buffer_unchanged() {
        let mut buffer = counters(3);
        let before = buffer.clone();

        assert!(buffer.apply("c1", -1).is_err());
        assert_eq!(buffer, before);
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let mut buffer = counters(2);
        assert_eq!(
            buffer.apply("missing", 1),
            Err(EditError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_mark_clean_keeps_entries() {
        let mut buffer = counters(2);
        buffer.apply("c0", 3).unwrap();
        buffer.apply("c1", 4).unwrap();

        buffer.mark_clean();

        assert!(!buffer.is_dirty());
        assert_eq!(buffer.get("c0").unwrap().value, 3);
        assert_eq!(buffer.get("c1").unwrap().value, 4);
    }
}
