//! Widget configuration.

use crate::engine::EngineError;
use crate::live::BackoffStrategy;
use crate::renderer::CountdownMode;
use crate::time::TickInterval;

/// Storage key of the countdown mode.
pub const COUNTDOWN_STATE_KEY: &str = "countdown_state";

/// Storage key of the statistic mode.
pub const STATISTIC_STATE_KEY: &str = "user-statistic-state";

/// Storage key of the datetime mode.
pub const DATETIME_STATE_KEY: &str = "datetime_state";

/// Storage key of the refresh click count.
pub const CLICK_COUNT_KEY: &str = "battlebit-click-count";

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Grace period before a hidden page drops its live connection.
pub const DEFAULT_HIDDEN_DISCONNECT_MS: u32 = 3_000;

/// Settings for [`CountdownApp`](crate::app::CountdownApp).
///
/// Use [`WidgetConfig::default`] and the builder-style setters:
///
/// ```
/// use countdown_widget::config::WidgetConfig;
///
/// let config = WidgetConfig::default()
///     .small_viewport(true)
///     .utc_offset_minutes(120);
/// assert_eq!(config.utc_offset_minutes, 120);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetConfig {
    pub countdown_key: &'static str,
    pub statistic_key: &'static str,
    pub datetime_key: &'static str,
    pub click_count_key: &'static str,
    pub theme_key: &'static str,
    /// Cadence while milliseconds are displayed.
    pub fast_interval: TickInterval,
    /// Cadence in the other modes.
    pub slow_interval: TickInterval,
    pub backoff: BackoffStrategy,
    /// Delay before disconnecting a hidden page when background timers work.
    pub hidden_disconnect_ms: u32,
    /// Selects the default countdown mode when none is persisted.
    pub small_viewport: bool,
    /// Offset of the local timezone, in minutes east of UTC.
    pub utc_offset_minutes: i32,
    /// Host color scheme preference, used when no theme is stored.
    pub prefers_dark: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            countdown_key: COUNTDOWN_STATE_KEY,
            statistic_key: STATISTIC_STATE_KEY,
            datetime_key: DATETIME_STATE_KEY,
            click_count_key: CLICK_COUNT_KEY,
            theme_key: THEME_KEY,
            fast_interval: TickInterval::FAST,
            slow_interval: TickInterval::SLOW,
            backoff: BackoffStrategy::default(),
            hidden_disconnect_ms: DEFAULT_HIDDEN_DISCONNECT_MS,
            small_viewport: false,
            utc_offset_minutes: 0,
            prefers_dark: false,
        }
    }
}

impl WidgetConfig {
    pub fn countdown_key(mut self, key: &'static str) -> Self {
        self.countdown_key = key;
        self
    }

    pub fn statistic_key(mut self, key: &'static str) -> Self {
        self.statistic_key = key;
        self
    }

    pub fn datetime_key(mut self, key: &'static str) -> Self {
        self.datetime_key = key;
        self
    }

    pub fn click_count_key(mut self, key: &'static str) -> Self {
        self.click_count_key = key;
        self
    }

    pub fn theme_key(mut self, key: &'static str) -> Self {
        self.theme_key = key;
        self
    }

    /// Sets the millisecond-mode cadence. Zero is rejected.
    pub fn fast_interval_ms(mut self, millis: u32) -> Result<Self, EngineError> {
        self.fast_interval = TickInterval::from_millis(millis)?;
        Ok(self)
    }

    /// Sets the cadence of the other modes. Zero is rejected.
    pub fn slow_interval_ms(mut self, millis: u32) -> Result<Self, EngineError> {
        self.slow_interval = TickInterval::from_millis(millis)?;
        Ok(self)
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn hidden_disconnect_ms(mut self, millis: u32) -> Self {
        self.hidden_disconnect_ms = millis;
        self
    }

    pub fn small_viewport(mut self, small: bool) -> Self {
        self.small_viewport = small;
        self
    }

    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn prefers_dark(mut self, dark: bool) -> Self {
        self.prefers_dark = dark;
        self
    }

    /// Tick cadence for a countdown mode.
    pub fn interval_for(&self, mode: CountdownMode) -> TickInterval {
        if mode.shows_milliseconds() {
            self.fast_interval
        } else {
            self.slow_interval
        }
    }
}
