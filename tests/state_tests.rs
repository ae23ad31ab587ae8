//! Integration tests for persisted display state

mod common;
use common::*;

use countdown_widget::state::{load_integer, store_integer};
use countdown_widget::{CountdownMode, CyclicMode, DatetimeMode, DisplayState, ModeState, StatisticMode};

#[test]
fn cycle_wraps_and_persists() {
    let mut store = MemoryStore::new();
    let mut state = DisplayState::new(0, 3, "countdown_state");

    assert_eq!(state.cycle(&mut store), 1);
    assert_eq!(store.value("countdown_state"), Some("1"));
    assert_eq!(state.cycle(&mut store), 2);
    assert_eq!(state.cycle(&mut store), 0);
    assert_eq!(store.value("countdown_state"), Some("0"));
}

#[test]
fn stored_zero_is_honoured() {
    let store = MemoryStore::new().with("countdown_state", "0");
    let state = DisplayState::load(&store, "countdown_state", 3, 2);
    assert_eq!(state.current_index(), 0);
}

#[test]
fn invalid_stored_values_fall_back_to_default() {
    for stored in ["3", "-1", "one", "", "1.5"] {
        let store = MemoryStore::new().with("key", stored);
        let state = DisplayState::load(&store, "key", 3, 2);
        assert_eq!(state.current_index(), 2, "stored {:?}", stored);
    }

    let state = DisplayState::load(&MemoryStore::new(), "key", 3, 1);
    assert_eq!(state.current_index(), 1);
}

#[test]
fn zero_count_behaves_as_single_state() {
    let mut store = MemoryStore::new();
    let mut state = DisplayState::new(5, 0, "key");
    assert_eq!(state.count(), 1);
    assert_eq!(state.current_index(), 0);
    assert_eq!(state.cycle(&mut store), 0);
}

#[test]
fn mode_state_survives_a_reload() {
    let mut store = MemoryStore::new();
    let mut modes = ModeState::load(&store, "countdown_state", CountdownMode::CompactNoMillis);
    assert_eq!(modes.cycle(&mut store), CountdownMode::Compact);
    assert_eq!(modes.cycle(&mut store), CountdownMode::Blocky);

    let reloaded = ModeState::load(&store, "countdown_state", CountdownMode::CompactNoMillis);
    assert_eq!(reloaded.current(), CountdownMode::Blocky);
    assert_eq!(reloaded.state().storage_key(), "countdown_state");
}

#[test]
fn every_mode_enum_round_trips_its_index() {
    assert_eq!(StatisticMode::COUNT, 2);
    assert_eq!(StatisticMode::from_index(1), Some(StatisticMode::ClickCount));
    assert_eq!(DatetimeMode::COUNT, 3);
    assert_eq!(DatetimeMode::LocalTimezone.index(), 2);
    assert_eq!(DatetimeMode::from_index(3), None);
}

#[test]
fn integers_are_stored_in_decimal() {
    let mut store = MemoryStore::new();
    store_integer(&mut store, "battlebit-click-count", 1234);
    assert_eq!(store.value("battlebit-click-count"), Some("1234"));
    assert_eq!(load_integer(&store, "battlebit-click-count"), Some(1234));
    assert_eq!(load_integer(&store, "missing"), None);
}
