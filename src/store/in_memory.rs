use crate::consensus::{Entry, HardState};
use crate::store::api::LogStore;
use std::io;
use std::sync::Mutex;

// Theoretical durability: entries survive for the process lifetime only.
// Useful for demos and tests; a disk-backed store slots in via LogStore.
pub struct InMemoryLogStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    hard_state: Option<HardState>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        InMemoryLogStore {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn last_hard_state(&self) -> Option<HardState> {
        self.lock().hard_state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Poisoning only happens if a writer panicked mid-append; the data
        // is a plain Vec, so it is still coherent.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore for InMemoryLogStore {
    fn append_entries(&self, entries: &[Entry]) -> Result<(), io::Error> {
        let mut inner = self.lock();
        for entry in entries {
            let expected = inner.entries.len() as u64 + 1;
            if entry.index != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "non-contiguous append: got index {}, expected {}",
                        entry.index, expected
                    ),
                ));
            }
            inner.entries.push(entry.clone());
        }
        Ok(())
    }

    fn save_hard_state(&self, hard_state: &HardState) -> Result<(), io::Error> {
        self.lock().hard_state = Some(*hard_state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn entry(index: u64) -> Entry {
        Entry {
            term: 1,
            index,
            payload: Bytes::from_static(b"a"),
        }
    }

    #[test]
    fn appends_in_order() {
        let store = InMemoryLogStore::new();
        store.append_entries(&[entry(1), entry(2)]).unwrap();
        store.append_entries(&[entry(3)]).unwrap();
        assert_eq!(3, store.entry_count());
    }

    #[test]
    fn rejects_gap() {
        let store = InMemoryLogStore::new();
        store.append_entries(&[entry(1)]).unwrap();
        let err = store.append_entries(&[entry(3)]).unwrap_err();
        assert_eq!(io::ErrorKind::InvalidInput, err.kind());
    }
}
