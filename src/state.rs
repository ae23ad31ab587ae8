//! Persisted cyclic display state.
//!
//! Each widget display cycles through a closed set of modes on user request and
//! remembers the selected mode across sessions through a [`KeyValueStore`].

use core::fmt::Write;

use crate::logging::debug;

/// Maximum length of a stored value.
pub const STORED_VALUE_LEN: usize = 32;

/// Value read back from a [`KeyValueStore`].
pub type StoredValue = heapless::String<STORED_VALUE_LEN>;

/// Trait for abstracting persisted key-value storage.
///
/// Implement this over whatever the host persists with (browser local
/// storage, a file, flash). Write failures are the implementation's concern;
/// state in memory stays authoritative.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<StoredValue>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);
}

/// Reads an integer stored under `key`, if present and parseable.
pub fn load_integer<S: KeyValueStore>(store: &S, key: &str) -> Option<u64> {
    store.get(key)?.trim().parse().ok()
}

/// Stores `value` under `key` in decimal.
pub fn store_integer<S: KeyValueStore>(store: &mut S, key: &str, value: u64) {
    let mut text: heapless::String<20> = heapless::String::new();
    // u64::MAX has 20 digits.
    if write!(text, "{}", value).is_ok() {
        store.set(key, &text);
    }
}

/// A cyclic index in `[0, count)` persisted under a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    current_index: usize,
    count: usize,
    storage_key: &'static str,
}

impl DisplayState {
    /// Creates a state at `initial_index`.
    ///
    /// A `count` of zero is treated as one, and an index outside the range
    /// wraps into it.
    pub fn new(initial_index: usize, count: usize, storage_key: &'static str) -> Self {
        let count = count.max(1);

        Self {
            current_index: initial_index % count,
            count,
            storage_key,
        }
    }

    /// Creates a state from the index stored under `storage_key`.
    ///
    /// The stored index is used only if it parses as an integer below
    /// `count`. Otherwise `default_index` is used.
    pub fn load<S: KeyValueStore>(
        store: &S,
        storage_key: &'static str,
        count: usize,
        default_index: usize,
    ) -> Self {
        let stored = load_integer(store, storage_key)
            .and_then(|index| usize::try_from(index).ok())
            .filter(|index| *index < count);

        Self::new(stored.unwrap_or(default_index), count, storage_key)
    }

    /// Advances to the next index, wrapping at `count`, and persists it.
    pub fn cycle<S: KeyValueStore>(&mut self, store: &mut S) -> usize {
        self.current_index = (self.current_index + 1) % self.count;
        store_integer(store, self.storage_key, self.current_index as u64);
        self.current_index
    }

    /// Returns the current index.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns the number of states.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the key the index is persisted under.
    pub fn storage_key(&self) -> &'static str {
        self.storage_key
    }
}

/// A closed set of display modes addressed by a stable index.
pub trait CyclicMode: Copy + PartialEq {
    /// Number of modes.
    const COUNT: usize;

    /// Stable index of this mode, below `COUNT`.
    fn index(self) -> usize;

    /// The mode at `index`, if any.
    fn from_index(index: usize) -> Option<Self>;
}

/// A [`DisplayState`] over a typed mode enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState<M: CyclicMode> {
    state: DisplayState,
    mode: M,
}

impl<M: CyclicMode> ModeState<M> {
    /// Loads the mode persisted under `storage_key`, falling back to `default`.
    pub fn load<S: KeyValueStore>(store: &S, storage_key: &'static str, default: M) -> Self {
        let state = DisplayState::load(store, storage_key, M::COUNT, default.index());
        let mode = M::from_index(state.current_index()).unwrap_or(default);

        Self { state, mode }
    }

    /// Returns the current mode.
    pub fn current(&self) -> M {
        self.mode
    }

    /// Advances to the next mode and persists it.
    pub fn cycle<S: KeyValueStore>(&mut self, store: &mut S) -> M {
        let index = self.state.cycle(store);
        if let Some(mode) = M::from_index(index) {
            self.mode = mode;
        }
        debug!("{} cycled to {}", self.state.storage_key(), index);
        self.mode
    }

    /// Returns the underlying index state.
    pub fn state(&self) -> &DisplayState {
        &self.state
    }
}
