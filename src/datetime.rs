//! Target datetime display.
//!
//! Shows the countdown target itself in one of three formats.

use core::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, Month, Offset, Timelike, Utc};

use crate::state::{CyclicMode, KeyValueStore, ModeState};
use crate::time::Instant;
use crate::visual::{FontSize, RenderError, SlotId, SlotText, VisualTree, FONT_SIZE_VW_RATIO};

/// Width of the datetime display in viewport widths.
pub const DISPLAY_VW: f32 = 35.0;

/// Format of the target datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DatetimeMode {
    /// `Wed, 14 Oct 2026 17:53:00 GMT`
    Utc,
    /// `2026-10-14T17:53:00.000Z`
    Iso8601,
    /// `Wed, 14 Oct 2026 19:53:00 GMT+0200`
    LocalTimezone,
}

impl CyclicMode for DatetimeMode {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            DatetimeMode::Utc => 0,
            DatetimeMode::Iso8601 => 1,
            DatetimeMode::LocalTimezone => 2,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(DatetimeMode::Utc),
            1 => Some(DatetimeMode::Iso8601),
            2 => Some(DatetimeMode::LocalTimezone),
            _ => None,
        }
    }
}

/// The datetime display has a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DatetimeSlot {
    Container,
}

impl SlotId for DatetimeSlot {
    fn id(self) -> &'static str {
        match self {
            DatetimeSlot::Container => "datetime",
        }
    }
}

/// Returns a fixed offset `minutes` east of UTC, or UTC when out of range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Formats `instant` in `mode`. `offset` is only used by
/// [`DatetimeMode::LocalTimezone`].
pub fn format_datetime(instant: Instant, mode: DatetimeMode, offset: FixedOffset) -> SlotText {
    let millis = instant.as_unix_millis();
    let utc = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    });

    let mut text = SlotText::new();
    // Every format fits the slot capacity.
    let _ = match mode {
        DatetimeMode::Utc => write_rfc_style(&mut text, &utc).and_then(|_| text.write_str(" GMT")),
        DatetimeMode::Iso8601 => write!(
            text,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            utc.year(),
            utc.month(),
            utc.day(),
            utc.hour(),
            utc.minute(),
            utc.second(),
            utc.timestamp_subsec_millis().min(999),
        ),
        DatetimeMode::LocalTimezone => {
            let local = utc.with_timezone(&offset);
            let offset_minutes = offset.local_minus_utc() / 60;
            let sign = if offset_minutes < 0 { '-' } else { '+' };
            let offset_minutes = offset_minutes.unsigned_abs();

            write_rfc_style(&mut text, &local).and_then(|_| {
                write!(
                    text,
                    " GMT{}{:02}{:02}",
                    sign,
                    offset_minutes / 60,
                    offset_minutes % 60
                )
            })
        }
    };
    text
}

fn write_rfc_style<Tz: chrono::TimeZone>(text: &mut SlotText, datetime: &DateTime<Tz>) -> core::fmt::Result {
    // `Month::name` is the full English name.
    let month = u8::try_from(datetime.month())
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .map_or("", |month| &month.name()[..3]);

    write!(
        text,
        "{}, {:02} {} {:04} {:02}:{:02}:{:02}",
        datetime.weekday(),
        datetime.day(),
        month,
        datetime.year(),
        datetime.hour(),
        datetime.minute(),
        datetime.second(),
    )
}

/// Renders the countdown target into a single-slot [`VisualTree`].
///
/// # Type Parameters
/// * `V` - Visual tree implementation type
pub struct DatetimeDisplay<V: VisualTree<DatetimeSlot>> {
    tree: V,
    mode: ModeState<DatetimeMode>,
    target: Instant,
    offset: FixedOffset,
    text: SlotText,
}

impl<V: VisualTree<DatetimeSlot>> DatetimeDisplay<V> {
    /// Loads the persisted mode and draws `target`.
    pub fn mount<S: KeyValueStore>(
        tree: V,
        store: &S,
        storage_key: &'static str,
        target: Instant,
        offset: FixedOffset,
    ) -> Result<Self, RenderError> {
        if !tree.contains(DatetimeSlot::Container) {
            return Err(RenderError::MissingSlot(DatetimeSlot::Container.id()));
        }

        let mut display = Self {
            tree,
            mode: ModeState::load(store, storage_key, DatetimeMode::LocalTimezone),
            target,
            offset,
            text: SlotText::new(),
        };
        display.render();
        display.refresh_font_size();
        Ok(display)
    }

    /// Shows a new target. The font size is left alone.
    pub fn update_target(&mut self, target: Instant) {
        self.target = target;
        self.render();
    }

    /// Switches to the next format, persists it and redraws.
    pub fn cycle<S: KeyValueStore>(&mut self, store: &mut S) -> DatetimeMode {
        let mode = self.mode.cycle(store);
        self.render();
        self.refresh_font_size();
        mode
    }

    /// Returns the current format.
    pub fn mode(&self) -> DatetimeMode {
        self.mode.current()
    }

    /// Returns the displayed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &V {
        &self.tree
    }

    fn render(&mut self) {
        let text = format_datetime(self.target, self.mode.current(), self.offset);
        if text != self.text {
            self.tree.set_text(DatetimeSlot::Container, &text);
            self.text = text;
        }
    }

    fn refresh_font_size(&mut self) {
        let size = FontSize {
            vw: (FONT_SIZE_VW_RATIO * DISPLAY_VW) / self.text.len().max(1) as f32,
            vh: None,
            min_rem: 0.9,
            max_rem: 2.0,
        };
        self.tree.set_font_size(DatetimeSlot::Container, &size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-10-14T17:53:00Z, a Wednesday.
    const TARGET: Instant = Instant::from_unix_millis(1_792_000_380_000);

    #[test]
    fn utc_format() {
        let text = format_datetime(TARGET, DatetimeMode::Utc, Utc.fix());
        assert_eq!(text.as_str(), "Wed, 14 Oct 2026 17:53:00 GMT");
    }

    #[test]
    fn iso_format_keeps_milliseconds() {
        let instant = Instant::from_unix_millis(TARGET.as_unix_millis() + 7);
        let text = format_datetime(instant, DatetimeMode::Iso8601, Utc.fix());
        assert_eq!(text.as_str(), "2026-10-14T17:53:00.007Z");
    }

    #[test]
    fn local_format_applies_the_offset() {
        let text = format_datetime(TARGET, DatetimeMode::LocalTimezone, offset_from_minutes(120));
        assert_eq!(text.as_str(), "Wed, 14 Oct 2026 19:53:00 GMT+0200");

        let text = format_datetime(TARGET, DatetimeMode::LocalTimezone, offset_from_minutes(-570));
        assert_eq!(text.as_str(), "Wed, 14 Oct 2026 08:23:00 GMT-0930");
    }

    #[test]
    fn month_and_weekday_abbreviations() {
        use chrono::TimeZone;

        let months = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        for (month, name) in (1..=12).zip(months) {
            let millis = Utc
                .with_ymd_and_hms(2026, month, 1, 0, 0, 0)
                .unwrap()
                .timestamp_millis();
            let text = format_datetime(Instant::from_unix_millis(millis), DatetimeMode::Utc, Utc.fix());
            assert_eq!(&text[8..11], name);
        }

        // 2026-10-18 is a Sunday.
        let sunday = Instant::from_unix_millis(TARGET.as_unix_millis() + 4 * 86_400_000);
        let text = format_datetime(sunday, DatetimeMode::Utc, Utc.fix());
        assert_eq!(text.as_str(), "Sun, 18 Oct 2026 17:53:00 GMT");
    }

    #[test]
    fn out_of_range_offsets_fall_back_to_utc() {
        assert_eq!(offset_from_minutes(24 * 60), Utc.fix());
        assert_eq!(offset_from_minutes(i32::MAX), Utc.fix());
    }
}
