//! Integration tests for UserStatistic

mod common;
use common::*;

use countdown_widget::statistic::{added_minutes, decompose, StatisticUnit, UnitAmount};
use countdown_widget::{Emphasis, RenderError, StatisticMode, StatisticSlot, UserStatistic};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const MODE_KEY: &str = "user-statistic-state";
const CLICK_KEY: &str = "battlebit-click-count";

fn mounted(store: &MemoryStore, seed: u64) -> UserStatistic<RecordingTree<StatisticSlot>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    UserStatistic::mount(
        RecordingTree::with_root(StatisticSlot::Container),
        store,
        MODE_KEY,
        CLICK_KEY,
        &mut rng,
    )
    .unwrap()
}

fn minute_value(text: &str) -> u64 {
    text.trim_end_matches('m').parse().unwrap()
}

#[test]
fn no_clicks_shows_dimmed_zero_minutes() {
    let statistic = mounted(&MemoryStore::new(), 1);

    assert_eq!(statistic.click_count(), 0);
    assert_eq!(statistic.text(StatisticSlot::Minute), Some("00m"));
    assert_eq!(statistic.emphasis(StatisticSlot::Minute), Some(Emphasis::Dimmed));
    for slot in [
        StatisticSlot::Hour,
        StatisticSlot::Day,
        StatisticSlot::Week,
        StatisticSlot::Month,
        StatisticSlot::Year,
    ] {
        assert_eq!(statistic.text(slot), Some(""));
        assert_eq!(statistic.emphasis(slot), Some(Emphasis::Hidden));
    }
}

#[test]
fn a_single_click_adds_the_noise_only() {
    for seed in 0..20 {
        let store = MemoryStore::new().with(CLICK_KEY, "1");
        let statistic = mounted(&store, seed);

        let minutes = minute_value(statistic.text(StatisticSlot::Minute).unwrap());
        assert!((25..35).contains(&minutes), "seed {} gave {}", seed, minutes);
        assert_eq!(statistic.emphasis(StatisticSlot::Minute), Some(Emphasis::Normal));
        assert_eq!(statistic.emphasis(StatisticSlot::Hour), Some(Emphasis::Hidden));
    }
}

#[test]
fn sixty_one_clicks_span_a_day() {
    let store = MemoryStore::new().with(CLICK_KEY, "61");
    let statistic = mounted(&store, 7);

    assert_eq!(statistic.text(StatisticSlot::Day), Some("1d"));
    assert_eq!(statistic.text(StatisticSlot::Hour), Some("06h"));
    let minutes = minute_value(statistic.text(StatisticSlot::Minute).unwrap());
    assert!((25..35).contains(&minutes));
    assert_eq!(statistic.emphasis(StatisticSlot::Week), Some(Emphasis::Hidden));
    assert_eq!(statistic.emphasis(StatisticSlot::Year), Some(Emphasis::Hidden));
}

#[test]
fn missing_units_below_the_greatest_are_dimmed() {
    // 336 * 30 minutes is exactly one week.
    let store = MemoryStore::new().with(CLICK_KEY, "337");
    let statistic = mounted(&store, 3);

    assert_eq!(statistic.text(StatisticSlot::Week), Some("1w"));
    assert_eq!(statistic.emphasis(StatisticSlot::Week), Some(Emphasis::Normal));
    assert_eq!(statistic.text(StatisticSlot::Day), Some("0d"));
    assert_eq!(statistic.emphasis(StatisticSlot::Day), Some(Emphasis::Dimmed));
    assert_eq!(statistic.text(StatisticSlot::Hour), Some("00h"));
    assert_eq!(statistic.emphasis(StatisticSlot::Hour), Some(Emphasis::Dimmed));
    assert_eq!(statistic.emphasis(StatisticSlot::Minute), Some(Emphasis::Normal));
    assert_eq!(statistic.emphasis(StatisticSlot::Month), Some(Emphasis::Hidden));
}

#[test]
fn click_count_mode_replaces_the_unit_slots() {
    let mut store = MemoryStore::new().with(CLICK_KEY, "61");
    let mut rng = SmallRng::seed_from_u64(11);
    let mut statistic = mounted(&store, 11);

    assert_eq!(
        statistic.cycle(&mut store, &mut rng),
        Ok(StatisticMode::ClickCount)
    );
    assert_eq!(store.value(MODE_KEY), Some("1"));
    assert_eq!(
        statistic.tree().children(StatisticSlot::Container),
        vec![StatisticSlot::Click]
    );
    assert_eq!(statistic.text(StatisticSlot::Click), Some("61"));
    assert!(!statistic.is_present(StatisticSlot::Minute));

    assert_eq!(
        statistic.cycle(&mut store, &mut rng),
        Ok(StatisticMode::AddedDuration)
    );
    assert_eq!(
        statistic.tree().children(StatisticSlot::Container),
        vec![
            StatisticSlot::Year,
            StatisticSlot::Month,
            StatisticSlot::Week,
            StatisticSlot::Day,
            StatisticSlot::Hour,
            StatisticSlot::Minute,
        ]
    );
}

#[test]
fn persisted_mode_is_restored() {
    let store = MemoryStore::new().with(MODE_KEY, "1").with(CLICK_KEY, "4");
    let statistic = mounted(&store, 0);

    assert_eq!(statistic.mode(), StatisticMode::ClickCount);
    assert_eq!(statistic.tree().text(StatisticSlot::Click), Some("4"));
}

#[test]
fn increment_persists_the_count() {
    let mut store = MemoryStore::new().with(MODE_KEY, "1");
    let mut rng = SmallRng::seed_from_u64(5);
    let mut statistic = mounted(&store, 5);

    assert_eq!(statistic.increment_click_count(&mut store, &mut rng), Ok(1));
    assert_eq!(statistic.increment_click_count(&mut store, &mut rng), Ok(2));
    assert_eq!(store.value(CLICK_KEY), Some("2"));
    assert_eq!(statistic.text(StatisticSlot::Click), Some("2"));
}

#[test]
fn mount_requires_the_container() {
    let mut rng = SmallRng::seed_from_u64(0);
    let result = UserStatistic::mount(
        RecordingTree::<StatisticSlot>::empty(),
        &MemoryStore::new(),
        MODE_KEY,
        CLICK_KEY,
        &mut rng,
    );
    assert!(matches!(result, Err(RenderError::MissingSlot("user-statistic"))));
}

#[test]
fn decomposition_is_greedy() {
    assert!(decompose(0).is_empty());
    assert_eq!(
        decompose(525_960 + 43_800 + 61).as_slice(),
        &[
            UnitAmount { unit: StatisticUnit::Year, value: 1 },
            UnitAmount { unit: StatisticUnit::Month, value: 1 },
            UnitAmount { unit: StatisticUnit::Hour, value: 1 },
            UnitAmount { unit: StatisticUnit::Minute, value: 1 },
        ]
    );
    // Exactly one unit is that unit, not sixty of the smaller one.
    assert_eq!(
        decompose(60).as_slice(),
        &[UnitAmount { unit: StatisticUnit::Hour, value: 1 }]
    );
}

#[test]
fn zero_clicks_add_nothing() {
    let mut rng = SmallRng::seed_from_u64(9);
    assert_eq!(added_minutes(0, &mut rng), 0);
    let minutes = added_minutes(3, &mut rng);
    assert!((85..95).contains(&minutes));
}
