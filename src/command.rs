//! Command-based control for the widget.

/// User and page events the widget reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WidgetAction {
    /// Countdown clicked: next countdown layout.
    CycleCountdown,
    /// Statistic clicked: next statistic mode.
    CycleStatistic,
    /// Datetime clicked: next datetime format.
    CycleDatetime,
    /// Refresh clicked: request a target increment, or connect if closed.
    Refresh,
    /// Theme toggle clicked.
    ToggleTheme,
    /// Page visibility changed.
    VisibilityChanged { hidden: bool },
}
