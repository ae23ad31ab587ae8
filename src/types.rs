//! Core types shared between the engine and its displays.

/// A field of a [`CalendarDuration`](crate::calendar::CalendarDuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountdownUnit {
    /// Millisecond remainder.
    Milliseconds,

    /// Second remainder.
    Seconds,

    /// Minute remainder.
    Minutes,

    /// Hour remainder.
    Hours,

    /// Day remainder after whole months.
    Days,

    /// Months remainder after whole years.
    Months,

    /// Whole years.
    Years,

    /// Whole calendar days between both dates.
    TotalDays,
}

impl CountdownUnit {
    /// Every unit in emission order. `TotalDays` is always last.
    pub const EMISSION_ORDER: [CountdownUnit; 8] = [
        CountdownUnit::Milliseconds,
        CountdownUnit::Seconds,
        CountdownUnit::Minutes,
        CountdownUnit::Hours,
        CountdownUnit::Days,
        CountdownUnit::Months,
        CountdownUnit::Years,
        CountdownUnit::TotalDays,
    ];
}

/// A single per-field change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitChange {
    /// Which field changed.
    pub unit: CountdownUnit,

    /// Its new value.
    pub value: i64,
}

impl UnitChange {
    /// Creates a new change notification.
    #[inline]
    pub const fn new(unit: CountdownUnit, value: i64) -> Self {
        Self { unit, value }
    }
}
