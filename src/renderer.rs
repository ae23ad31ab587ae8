//! Differential countdown renderer.
//!
//! [`CountdownRenderer`] keeps a mirror of every slot it has created (parent
//! and current text) and applies engine changes against it. Switching modes
//! only creates the slots the new mode adds and detaches the ones it drops;
//! text writes whose content matches the mirror never reach the tree.

use core::fmt;

use crate::logging::{debug, trace};
use crate::state::CyclicMode;
use crate::time::TickInterval;
use crate::types::{CountdownUnit, UnitChange};
use crate::visual::{
    padded, zeros, Emphasis, FontSize, RenderError, SlotId, SlotText, VisualTree,
    FONT_SIZE_VH_RATIO, FONT_SIZE_VW_RATIO,
};

/// Width of the countdown display in viewport widths.
pub const DISPLAY_VW: f32 = 80.0;

/// Height of the countdown display in viewport heights.
pub const DISPLAY_VH: f32 = 50.0;

/// Lower font clamp for every countdown mode, in rem.
pub const MIN_FONT_REM: f32 = 1.5;

/// Upper font clamp in the compact modes, in rem.
pub const COMPACT_MAX_FONT_REM: f32 = 8.0;

/// Upper font clamp in blocky mode, in rem.
pub const BLOCKY_MAX_FONT_REM: f32 = 11.0;

/// Visual layout of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountdownMode {
    /// `D:HH:MM:SS` on one line.
    CompactNoMillis,
    /// `D:HH:MM:SS.mmm` on one line.
    Compact,
    /// One block per unit with labels `D H M S`, right-aligned to the days
    /// width with dimmed zero spacers.
    Blocky,
}

impl CountdownMode {
    /// Default mode when nothing is persisted.
    pub fn default_for_viewport(small_viewport: bool) -> Self {
        if small_viewport {
            CountdownMode::Blocky
        } else {
            CountdownMode::CompactNoMillis
        }
    }

    /// Returns true if the mode displays milliseconds.
    pub fn shows_milliseconds(self) -> bool {
        self == CountdownMode::Compact
    }

    /// Default tick cadence for the mode.
    pub fn tick_interval(self) -> TickInterval {
        if self.shows_milliseconds() {
            TickInterval::FAST
        } else {
            TickInterval::SLOW
        }
    }
}

impl CyclicMode for CountdownMode {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            CountdownMode::CompactNoMillis => 0,
            CountdownMode::Compact => 1,
            CountdownMode::Blocky => 2,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(CountdownMode::CompactNoMillis),
            1 => Some(CountdownMode::Compact),
            2 => Some(CountdownMode::Blocky),
            _ => None,
        }
    }
}

impl fmt::Display for CountdownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CountdownMode::CompactNoMillis => "compact",
            CountdownMode::Compact => "compact-ms",
            CountdownMode::Blocky => "blocky",
        };
        f.write_str(name)
    }
}

/// Every slot the countdown display can contain, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountdownSlot {
    /// Root element. Supplied by the host, never created or detached.
    Container,
    Days,
    DaysLabel,
    HoursContainer,
    HoursSpacer,
    Hours,
    HoursLabel,
    MinutesContainer,
    MinutesSpacer,
    Minutes,
    MinutesLabel,
    SecondsContainer,
    SecondsSpacer,
    Seconds,
    SecondsLabel,
    Milliseconds,
}

impl CountdownSlot {
    /// Number of slots.
    pub const COUNT: usize = 16;

    /// All slots in document order.
    pub const ALL: [CountdownSlot; Self::COUNT] = [
        CountdownSlot::Container,
        CountdownSlot::Days,
        CountdownSlot::DaysLabel,
        CountdownSlot::HoursContainer,
        CountdownSlot::HoursSpacer,
        CountdownSlot::Hours,
        CountdownSlot::HoursLabel,
        CountdownSlot::MinutesContainer,
        CountdownSlot::MinutesSpacer,
        CountdownSlot::Minutes,
        CountdownSlot::MinutesLabel,
        CountdownSlot::SecondsContainer,
        CountdownSlot::SecondsSpacer,
        CountdownSlot::Seconds,
        CountdownSlot::SecondsLabel,
        CountdownSlot::Milliseconds,
    ];

    #[inline]
    fn ordinal(self) -> usize {
        self as usize
    }
}

impl SlotId for CountdownSlot {
    fn id(self) -> &'static str {
        match self {
            CountdownSlot::Container => "countdown",
            CountdownSlot::Days => "countdown-days",
            CountdownSlot::DaysLabel => "days-label",
            CountdownSlot::HoursContainer => "hours-container",
            CountdownSlot::HoursSpacer => "hours-spacer",
            CountdownSlot::Hours => "countdown-hours",
            CountdownSlot::HoursLabel => "hours-label",
            CountdownSlot::MinutesContainer => "minutes-container",
            CountdownSlot::MinutesSpacer => "minutes-spacer",
            CountdownSlot::Minutes => "countdown-minutes",
            CountdownSlot::MinutesLabel => "minutes-label",
            CountdownSlot::SecondsContainer => "seconds-container",
            CountdownSlot::SecondsSpacer => "seconds-spacer",
            CountdownSlot::Seconds => "countdown-seconds",
            CountdownSlot::SecondsLabel => "seconds-label",
            CountdownSlot::Milliseconds => "countdown-milliseconds",
        }
    }
}

/// A value slot that blocky mode wraps in a container with a zero spacer.
#[derive(Debug, Clone, Copy)]
struct AlignedField {
    value: CountdownSlot,
    spacer: CountdownSlot,
    container: CountdownSlot,
}

const ALIGNED_FIELDS: [AlignedField; 3] = [
    AlignedField {
        value: CountdownSlot::Hours,
        spacer: CountdownSlot::HoursSpacer,
        container: CountdownSlot::HoursContainer,
    },
    AlignedField {
        value: CountdownSlot::Minutes,
        spacer: CountdownSlot::MinutesSpacer,
        container: CountdownSlot::MinutesContainer,
    },
    AlignedField {
        value: CountdownSlot::Seconds,
        spacer: CountdownSlot::SecondsSpacer,
        container: CountdownSlot::SecondsContainer,
    },
];

/// Slots present in every mode, directly under the container.
const BASE_SLOTS: [CountdownSlot; 7] = [
    CountdownSlot::Days,
    CountdownSlot::DaysLabel,
    CountdownSlot::Hours,
    CountdownSlot::HoursLabel,
    CountdownSlot::Minutes,
    CountdownSlot::MinutesLabel,
    CountdownSlot::Seconds,
];

#[derive(Debug, Clone)]
struct SlotEntry {
    parent: CountdownSlot,
    text: SlotText,
}

/// Renders countdown changes into a [`VisualTree`].
///
/// # Type Parameters
/// * `V` - Visual tree implementation type
pub struct CountdownRenderer<V: VisualTree<CountdownSlot>> {
    tree: V,
    mode: CountdownMode,
    slots: [Option<SlotEntry>; CountdownSlot::COUNT],
    days_len: usize,
    font_key: Option<(CountdownMode, usize)>,
    font_size: Option<FontSize>,
}

impl<V: VisualTree<CountdownSlot>> CountdownRenderer<V> {
    /// Builds the display for `mode` under the host's container.
    ///
    /// Any non-root slot already in the tree is detached first so the mirror
    /// starts out exact.
    ///
    /// # Returns
    /// * `Ok(renderer)` - Display built
    /// * `Err(RenderError::MissingSlot)` - The tree has no container
    pub fn mount(mut tree: V, mode: CountdownMode) -> Result<Self, RenderError> {
        if !tree.contains(CountdownSlot::Container) {
            return Err(RenderError::MissingSlot(CountdownSlot::Container.id()));
        }

        for slot in CountdownSlot::ALL.into_iter().rev() {
            if slot != CountdownSlot::Container && tree.contains(slot) {
                tree.detach(slot);
            }
        }

        let mut renderer = Self {
            tree,
            mode,
            slots: core::array::from_fn(|_| None),
            days_len: 0,
            font_key: None,
            font_size: None,
        };

        renderer.slots[CountdownSlot::Container.ordinal()] = Some(SlotEntry {
            parent: CountdownSlot::Container,
            text: SlotText::new(),
        });
        for slot in BASE_SLOTS {
            renderer.ensure(slot, CountdownSlot::Container);
        }

        renderer.enter(mode)?;
        Ok(renderer)
    }

    /// Switches to `mode`, creating and detaching only the slots that differ.
    ///
    /// Value slots recreated by the switch start out empty; follow up with a
    /// full batch from the engine to populate them.
    pub fn set_mode(&mut self, mode: CountdownMode) -> Result<(), RenderError> {
        debug!("countdown display {} -> {}", self.mode.index(), mode.index());
        self.enter(mode)
    }

    /// Applies a single change notification.
    pub fn apply(&mut self, change: UnitChange) -> Result<(), RenderError> {
        match change.unit {
            CountdownUnit::Milliseconds => {
                if self.mode.shows_milliseconds() {
                    self.write(CountdownSlot::Milliseconds, &padded(change.value, 3))?;
                }
                Ok(())
            }
            CountdownUnit::Seconds => self.write_aligned(ALIGNED_FIELDS[2], change.value),
            CountdownUnit::Minutes => self.write_aligned(ALIGNED_FIELDS[1], change.value),
            CountdownUnit::Hours => self.write_aligned(ALIGNED_FIELDS[0], change.value),
            CountdownUnit::Days | CountdownUnit::Months | CountdownUnit::Years => Ok(()),
            CountdownUnit::TotalDays => self.write_total_days(change.value),
        }
    }

    /// Applies a batch in order, stopping at the first error.
    pub fn apply_all<I>(&mut self, changes: I) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = UnitChange>,
    {
        for change in changes {
            self.apply(change)?;
        }
        Ok(())
    }

    /// Recomputes the container font size if the relevant text length
    /// changed since the last computation.
    pub fn refresh_font_size(&mut self) {
        let (len, lines, max_rem) = match self.mode {
            CountdownMode::CompactNoMillis | CountdownMode::Compact => {
                (self.line_len(), 1.0, COMPACT_MAX_FONT_REM)
            }
            CountdownMode::Blocky => {
                let longest = [
                    CountdownSlot::Days,
                    CountdownSlot::Hours,
                    CountdownSlot::Minutes,
                    CountdownSlot::Seconds,
                ]
                .into_iter()
                .map(|slot| self.text_len(slot))
                .max()
                .unwrap_or(0);
                // One extra column for the unit label.
                (longest + 1, 4.0, BLOCKY_MAX_FONT_REM)
            }
        };

        let key = (self.mode, len);
        if self.font_key == Some(key) {
            return;
        }

        let size = FontSize {
            vw: (FONT_SIZE_VW_RATIO * DISPLAY_VW) / len.max(1) as f32,
            vh: Some((FONT_SIZE_VH_RATIO * DISPLAY_VH) / lines),
            min_rem: MIN_FONT_REM,
            max_rem,
        };
        trace!("countdown font recomputed for {} characters", len);

        self.tree.set_font_size(CountdownSlot::Container, &size);
        self.font_key = Some(key);
        self.font_size = Some(size);
    }

    /// Returns the current mode.
    pub fn mode(&self) -> CountdownMode {
        self.mode
    }

    /// Returns true if the slot exists in the current layout.
    pub fn is_present(&self, slot: CountdownSlot) -> bool {
        self.slots[slot.ordinal()].is_some()
    }

    /// Iterates the slots of the current layout in document order.
    pub fn present_slots(&self) -> impl Iterator<Item = CountdownSlot> + '_ {
        CountdownSlot::ALL
            .into_iter()
            .filter(move |slot| self.is_present(*slot))
    }

    /// Returns the parent of a present slot. The container is its own parent.
    pub fn parent_of(&self, slot: CountdownSlot) -> Option<CountdownSlot> {
        self.slots[slot.ordinal()].as_ref().map(|entry| entry.parent)
    }

    /// Returns the mirrored text of a present slot.
    pub fn text(&self, slot: CountdownSlot) -> Option<&str> {
        self.slots[slot.ordinal()]
            .as_ref()
            .map(|entry| entry.text.as_str())
    }

    /// Length of the days text used for alignment.
    pub fn days_text_len(&self) -> usize {
        self.days_len
    }

    /// Last font size pushed to the tree.
    pub fn font_size(&self) -> Option<&FontSize> {
        self.font_size.as_ref()
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &V {
        &self.tree
    }

    /// Returns the underlying tree mutably.
    pub fn tree_mut(&mut self) -> &mut V {
        &mut self.tree
    }

    fn enter(&mut self, mode: CountdownMode) -> Result<(), RenderError> {
        match mode {
            CountdownMode::CompactNoMillis => {
                self.remove(CountdownSlot::Milliseconds);
                self.remove(CountdownSlot::SecondsLabel);
                for field in ALIGNED_FIELDS {
                    self.unwrap_field(field);
                }
                self.write_labels(&[
                    (CountdownSlot::DaysLabel, ":"),
                    (CountdownSlot::HoursLabel, ":"),
                    (CountdownSlot::MinutesLabel, ":"),
                ])?;
            }
            CountdownMode::Compact => {
                for field in ALIGNED_FIELDS {
                    self.unwrap_field(field);
                }
                self.ensure(CountdownSlot::SecondsLabel, CountdownSlot::Container);
                self.ensure(CountdownSlot::Milliseconds, CountdownSlot::Container);
                self.write_labels(&[
                    (CountdownSlot::DaysLabel, ":"),
                    (CountdownSlot::HoursLabel, ":"),
                    (CountdownSlot::MinutesLabel, ":"),
                    (CountdownSlot::SecondsLabel, "."),
                ])?;
            }
            CountdownMode::Blocky => {
                self.remove(CountdownSlot::Milliseconds);
                self.ensure(CountdownSlot::SecondsLabel, CountdownSlot::Container);
                for field in ALIGNED_FIELDS {
                    self.wrap_field(field);
                }
                self.write_labels(&[
                    (CountdownSlot::DaysLabel, "D"),
                    (CountdownSlot::HoursLabel, "H"),
                    (CountdownSlot::MinutesLabel, "M"),
                    (CountdownSlot::SecondsLabel, "S"),
                ])?;
            }
        }

        self.mode = mode;
        if mode == CountdownMode::Blocky {
            self.realign_spacers()?;
        }
        self.refresh_font_size();
        Ok(())
    }

    fn write_labels(&mut self, labels: &[(CountdownSlot, &str)]) -> Result<(), RenderError> {
        for (slot, text) in labels {
            self.write(*slot, text)?;
        }
        Ok(())
    }

    fn wrap_field(&mut self, field: AlignedField) {
        if self.is_present(field.container) {
            return;
        }

        self.remove(field.value);
        self.ensure(field.container, CountdownSlot::Container);
        self.ensure(field.spacer, field.container);
        self.tree.set_emphasis(field.spacer, Emphasis::Dimmed);
        self.ensure(field.value, field.container);
    }

    fn unwrap_field(&mut self, field: AlignedField) {
        if self.is_present(field.container) {
            self.remove(field.container);
        }
        self.ensure(field.value, CountdownSlot::Container);
    }

    fn write_total_days(&mut self, value: i64) -> Result<(), RenderError> {
        let text = padded(value, 0);
        self.write(CountdownSlot::Days, &text)?;

        if text.len() != self.days_len {
            self.days_len = text.len();
            self.refresh_font_size();
            if self.mode == CountdownMode::Blocky {
                self.realign_spacers()?;
            }
        }
        Ok(())
    }

    fn write_aligned(&mut self, field: AlignedField, value: i64) -> Result<(), RenderError> {
        match self.mode {
            CountdownMode::CompactNoMillis | CountdownMode::Compact => {
                self.write(field.value, &padded(value, 2))
            }
            CountdownMode::Blocky => {
                self.write(field.value, &padded(value, 0))?;
                self.realign_spacer(field)
            }
        }
    }

    fn realign_spacers(&mut self) -> Result<(), RenderError> {
        for field in ALIGNED_FIELDS {
            self.realign_spacer(field)?;
        }
        Ok(())
    }

    fn realign_spacer(&mut self, field: AlignedField) -> Result<(), RenderError> {
        let len = self
            .text(field.value)
            .ok_or(RenderError::MissingSlot(field.value.id()))?
            .len();
        self.write(field.spacer, &zeros(self.days_len.saturating_sub(len)))
    }

    fn write(&mut self, slot: CountdownSlot, text: &str) -> Result<(), RenderError> {
        let entry = self.slots[slot.ordinal()]
            .as_mut()
            .ok_or(RenderError::MissingSlot(slot.id()))?;

        if entry.text.as_str() == text {
            return Ok(());
        }

        entry.text.clear();
        // Slot text is bounded; overlong text is truncated.
        for c in text.chars() {
            if entry.text.push(c).is_err() {
                break;
            }
        }
        self.tree.set_text(slot, text);
        Ok(())
    }

    fn ensure(&mut self, slot: CountdownSlot, parent: CountdownSlot) {
        if self.is_present(slot) {
            return;
        }

        let before = self.next_sibling(slot, parent);
        self.tree.create(slot, parent, before);
        self.slots[slot.ordinal()] = Some(SlotEntry {
            parent,
            text: SlotText::new(),
        });
    }

    fn remove(&mut self, slot: CountdownSlot) {
        if slot == CountdownSlot::Container || !self.is_present(slot) {
            return;
        }

        for child in CountdownSlot::ALL {
            if child != slot && self.parent_of(child) == Some(slot) {
                self.remove(child);
            }
        }

        self.tree.detach(slot);
        self.slots[slot.ordinal()] = None;
    }

    fn next_sibling(&self, slot: CountdownSlot, parent: CountdownSlot) -> Option<CountdownSlot> {
        CountdownSlot::ALL[slot.ordinal() + 1..]
            .iter()
            .copied()
            .find(|candidate| self.parent_of(*candidate) == Some(parent))
    }

    fn text_len(&self, slot: CountdownSlot) -> usize {
        self.text(slot).map_or(0, str::len)
    }

    fn line_len(&self) -> usize {
        CountdownSlot::ALL
            .into_iter()
            .filter(|slot| *slot != CountdownSlot::Container)
            .map(|slot| self.text_len(slot))
            .sum()
    }
}
