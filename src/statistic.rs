//! User statistic display.
//!
//! Each refresh click adds about half an hour to the target. The statistic
//! either shows that accumulated duration, decomposed greedily into calendar
//! units, or the raw click count.

use core::fmt::{self, Write};

use rand::{Rng, RngCore};

use crate::logging::debug;
use crate::state::{load_integer, store_integer, CyclicMode, KeyValueStore, ModeState};
use crate::visual::{Emphasis, RenderError, SlotId, SlotText, VisualTree};

/// Minutes each click adds on average.
pub const MINUTES_PER_CLICK: u64 = 30;

/// Noise added on top of the per-click base, in minutes.
pub const CLICK_NOISE_MINUTES: core::ops::Range<u64> = 25..35;

/// What the statistic shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatisticMode {
    /// Time added to the countdown by all clicks.
    AddedDuration,
    /// Number of refresh clicks.
    ClickCount,
}

impl CyclicMode for StatisticMode {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            StatisticMode::AddedDuration => 0,
            StatisticMode::ClickCount => 1,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(StatisticMode::AddedDuration),
            1 => Some(StatisticMode::ClickCount),
            _ => None,
        }
    }
}

/// Units of the added-duration decomposition, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatisticUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl StatisticUnit {
    /// All units, smallest first.
    pub const ALL: [StatisticUnit; 6] = [
        StatisticUnit::Minute,
        StatisticUnit::Hour,
        StatisticUnit::Day,
        StatisticUnit::Week,
        StatisticUnit::Month,
        StatisticUnit::Year,
    ];

    /// Length of the unit in minutes.
    pub const fn minutes(self) -> u64 {
        match self {
            StatisticUnit::Minute => 1,
            StatisticUnit::Hour => 60,
            StatisticUnit::Day => 1_440,
            StatisticUnit::Week => 10_080,
            StatisticUnit::Month => 43_800,
            StatisticUnit::Year => 525_960,
        }
    }

    /// Display suffix.
    pub const fn suffix(self) -> char {
        match self {
            StatisticUnit::Minute => 'm',
            StatisticUnit::Hour => 'h',
            StatisticUnit::Day => 'd',
            StatisticUnit::Week => 'w',
            StatisticUnit::Month => 'M',
            StatisticUnit::Year => 'Y',
        }
    }

    /// Slot displaying this unit.
    pub const fn slot(self) -> StatisticSlot {
        match self {
            StatisticUnit::Minute => StatisticSlot::Minute,
            StatisticUnit::Hour => StatisticSlot::Hour,
            StatisticUnit::Day => StatisticSlot::Day,
            StatisticUnit::Week => StatisticSlot::Week,
            StatisticUnit::Month => StatisticSlot::Month,
            StatisticUnit::Year => StatisticSlot::Year,
        }
    }
}

/// A non-zero amount of a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitAmount {
    pub unit: StatisticUnit,
    pub value: u64,
}

/// A formatted unit amount such as `3w` or `05h`.
impl fmt::Display for UnitAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            StatisticUnit::Minute | StatisticUnit::Hour => {
                write!(f, "{:02}{}", self.value, self.unit.suffix())
            }
            _ => write!(f, "{}{}", self.value, self.unit.suffix()),
        }
    }
}

/// Every slot the statistic display can contain, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatisticSlot {
    /// Root element. Supplied by the host.
    Container,
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Click,
}

impl StatisticSlot {
    /// Number of slots.
    pub const COUNT: usize = 8;

    /// All slots in document order.
    pub const ALL: [StatisticSlot; Self::COUNT] = [
        StatisticSlot::Container,
        StatisticSlot::Year,
        StatisticSlot::Month,
        StatisticSlot::Week,
        StatisticSlot::Day,
        StatisticSlot::Hour,
        StatisticSlot::Minute,
        StatisticSlot::Click,
    ];

    const UNITS: [StatisticSlot; 6] = [
        StatisticSlot::Year,
        StatisticSlot::Month,
        StatisticSlot::Week,
        StatisticSlot::Day,
        StatisticSlot::Hour,
        StatisticSlot::Minute,
    ];

    #[inline]
    fn ordinal(self) -> usize {
        self as usize
    }
}

impl SlotId for StatisticSlot {
    fn id(self) -> &'static str {
        match self {
            StatisticSlot::Container => "user-statistic",
            StatisticSlot::Year => "statistic-year",
            StatisticSlot::Month => "statistic-month",
            StatisticSlot::Week => "statistic-week",
            StatisticSlot::Day => "statistic-day",
            StatisticSlot::Hour => "statistic-hour",
            StatisticSlot::Minute => "statistic-minute",
            StatisticSlot::Click => "statistic-click",
        }
    }
}

/// Minutes added by `click_count` clicks.
///
/// Zero clicks add nothing. Otherwise every click but the last counts for
/// [`MINUTES_PER_CLICK`] and the last one for a uniform draw from
/// [`CLICK_NOISE_MINUTES`].
pub fn added_minutes<R: RngCore + ?Sized>(click_count: u64, rng: &mut R) -> u64 {
    if click_count == 0 {
        return 0;
    }

    let noise = rng.gen_range(CLICK_NOISE_MINUTES);
    (click_count - 1)
        .saturating_mul(MINUTES_PER_CLICK)
        .saturating_add(noise)
}

/// Splits `minutes` into units greedily, largest first. Units that do not fit
/// are left out.
pub fn decompose(minutes: u64) -> heapless::Vec<UnitAmount, 6> {
    let mut amounts = heapless::Vec::new();
    let mut remaining = minutes;

    for unit in StatisticUnit::ALL.into_iter().rev() {
        let per_unit = unit.minutes();
        if remaining >= per_unit {
            // At most one entry per unit.
            let _ = amounts.push(UnitAmount {
                unit,
                value: remaining / per_unit,
            });
            remaining %= per_unit;
        }
    }

    amounts
}

/// Renders the user statistic into a [`VisualTree`].
///
/// # Type Parameters
/// * `V` - Visual tree implementation type
pub struct UserStatistic<V: VisualTree<StatisticSlot>> {
    tree: V,
    mode: ModeState<StatisticMode>,
    click_count: u64,
    click_key: &'static str,
    texts: [Option<SlotText>; StatisticSlot::COUNT],
    emphasis: [Option<Emphasis>; StatisticSlot::COUNT],
}

impl<V: VisualTree<StatisticSlot>> UserStatistic<V> {
    /// Loads the persisted mode and click count and builds the display.
    ///
    /// # Returns
    /// * `Ok(statistic)` - Display built and populated
    /// * `Err(RenderError::MissingSlot)` - The tree has no container
    pub fn mount<S, R>(
        tree: V,
        store: &S,
        mode_key: &'static str,
        click_key: &'static str,
        rng: &mut R,
    ) -> Result<Self, RenderError>
    where
        S: KeyValueStore,
        R: RngCore + ?Sized,
    {
        if !tree.contains(StatisticSlot::Container) {
            return Err(RenderError::MissingSlot(StatisticSlot::Container.id()));
        }

        let mut statistic = Self {
            tree,
            mode: ModeState::load(store, mode_key, StatisticMode::AddedDuration),
            click_count: load_integer(store, click_key).unwrap_or(0),
            click_key,
            texts: core::array::from_fn(|_| None),
            emphasis: [None; StatisticSlot::COUNT],
        };

        statistic.texts[StatisticSlot::Container.ordinal()] = Some(SlotText::new());
        statistic.build_slots();
        statistic.render(rng)?;
        Ok(statistic)
    }

    /// Switches to the next mode, persists it and redraws.
    pub fn cycle<S, R>(&mut self, store: &mut S, rng: &mut R) -> Result<StatisticMode, RenderError>
    where
        S: KeyValueStore,
        R: RngCore + ?Sized,
    {
        let mode = self.mode.cycle(store);
        self.build_slots();
        self.render(rng)?;
        Ok(mode)
    }

    /// Counts one more click, persists the count and redraws.
    pub fn increment_click_count<S, R>(&mut self, store: &mut S, rng: &mut R) -> Result<u64, RenderError>
    where
        S: KeyValueStore,
        R: RngCore + ?Sized,
    {
        self.click_count = self.click_count.saturating_add(1);
        store_integer(store, self.click_key, self.click_count);
        debug!("click count now {}", self.click_count);

        self.render(rng)?;
        Ok(self.click_count)
    }

    /// Redraws the current mode. A new noise value is drawn each time.
    pub fn render<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> Result<(), RenderError> {
        match self.mode.current() {
            StatisticMode::AddedDuration => {
                let minutes = added_minutes(self.click_count, rng);
                self.render_duration(minutes)
            }
            StatisticMode::ClickCount => {
                let mut text = SlotText::new();
                let _ = write!(text, "{}", self.click_count);
                self.write(StatisticSlot::Click, &text)
            }
        }
    }

    /// Returns the click count.
    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    /// Returns the current mode.
    pub fn mode(&self) -> StatisticMode {
        self.mode.current()
    }

    /// Returns true if the slot exists in the current layout.
    pub fn is_present(&self, slot: StatisticSlot) -> bool {
        self.texts[slot.ordinal()].is_some()
    }

    /// Returns the mirrored text of a present slot.
    pub fn text(&self, slot: StatisticSlot) -> Option<&str> {
        self.texts[slot.ordinal()].as_ref().map(|text| text.as_str())
    }

    /// Returns the last emphasis applied to a present slot.
    pub fn emphasis(&self, slot: StatisticSlot) -> Option<Emphasis> {
        self.emphasis[slot.ordinal()]
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &V {
        &self.tree
    }

    fn render_duration(&mut self, minutes: u64) -> Result<(), RenderError> {
        let amounts = decompose(minutes);
        let greatest = amounts
            .first()
            .map_or(StatisticUnit::Minute, |amount| amount.unit);

        for unit in StatisticUnit::ALL {
            let slot = unit.slot();
            if unit > greatest {
                self.write(slot, "")?;
                self.set_emphasis(slot, Emphasis::Hidden);
                continue;
            }

            let (amount, emphasis) = match amounts.iter().find(|amount| amount.unit == unit) {
                Some(amount) => (*amount, Emphasis::Normal),
                None => (UnitAmount { unit, value: 0 }, Emphasis::Dimmed),
            };

            let mut text = SlotText::new();
            let _ = write!(text, "{}", amount);
            self.write(slot, &text)?;
            self.set_emphasis(slot, emphasis);
        }
        Ok(())
    }

    fn build_slots(&mut self) {
        match self.mode.current() {
            StatisticMode::AddedDuration => {
                self.remove(StatisticSlot::Click);
                for slot in StatisticSlot::UNITS {
                    self.ensure(slot);
                }
            }
            StatisticMode::ClickCount => {
                for slot in StatisticSlot::UNITS {
                    self.remove(slot);
                }
                self.ensure(StatisticSlot::Click);
            }
        }
    }

    fn ensure(&mut self, slot: StatisticSlot) {
        if self.is_present(slot) {
            return;
        }

        let before = StatisticSlot::ALL[slot.ordinal() + 1..]
            .iter()
            .copied()
            .find(|candidate| self.is_present(*candidate));
        self.tree.create(slot, StatisticSlot::Container, before);
        self.texts[slot.ordinal()] = Some(SlotText::new());
        self.emphasis[slot.ordinal()] = None;
    }

    fn remove(&mut self, slot: StatisticSlot) {
        if slot == StatisticSlot::Container || !self.is_present(slot) {
            return;
        }

        self.tree.detach(slot);
        self.texts[slot.ordinal()] = None;
        self.emphasis[slot.ordinal()] = None;
    }

    fn write(&mut self, slot: StatisticSlot, text: &str) -> Result<(), RenderError> {
        let current = self.texts[slot.ordinal()]
            .as_mut()
            .ok_or(RenderError::MissingSlot(slot.id()))?;

        if current.as_str() != text {
            current.clear();
            let _ = current.push_str(text);
            self.tree.set_text(slot, text);
        }
        Ok(())
    }

    fn set_emphasis(&mut self, slot: StatisticSlot, emphasis: Emphasis) {
        if self.emphasis[slot.ordinal()] != Some(emphasis) {
            self.tree.set_emphasis(slot, emphasis);
            self.emphasis[slot.ordinal()] = Some(emphasis);
        }
    }
}
