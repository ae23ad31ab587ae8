#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`CalendarDuration`**: Years/months/days/… between two instants, with calendar-month borrowing
//! - **`CountdownEngine`**: Recomputes the duration on each tick and queues per-unit changes
//! - **`CountdownRenderer`**: Keeps a countdown display's slots in sync with its mode and the changes
//! - **`UserStatistic`**: Shows how much the user's refresh clicks added to the countdown
//! - **`DatetimeDisplay`**: Shows the target datetime in one of three formats
//! - **`ThemeState`**: Persisted light/dark preference
//! - **`LiveClient`**: Decodes server frames and owns the reconnect policy
//! - **`CountdownApp`**: Ties all of the above to a host
//! - **`TimeSource`**, **`KeyValueStore`**, **`VisualTree`**, **`Channel`**, **`ThemeSink`**: Traits to implement for your platform
//!
//! The crate never sleeps or spawns timers. Operations return a
//! [`ServiceTiming`] or a deadline and the host arms its own timers.

mod logging;

pub mod time;
pub mod types;
pub mod calendar;
pub mod state;
pub mod engine;
pub mod visual;
pub mod renderer;
pub mod statistic;
pub mod datetime;
pub mod theme;
pub mod live;
pub mod config;
pub mod command;
pub mod app;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod web;

pub use app::{CountdownApp, Host, HostParts, WidgetError};
pub use calendar::{compute_duration, CalendarDuration, CalendarError};
pub use command::WidgetAction;
pub use config::WidgetConfig;
pub use datetime::{DatetimeDisplay, DatetimeMode, DatetimeSlot};
pub use engine::{CountdownEngine, EngineError, ServiceTiming, TickState};
pub use live::{BackoffStrategy, Channel, ChannelEvent, ChannelState, FrameError, LiveClient, LiveEvent};
pub use renderer::{CountdownMode, CountdownRenderer, CountdownSlot};
pub use state::{CyclicMode, DisplayState, KeyValueStore, ModeState};
pub use statistic::{StatisticMode, StatisticSlot, UserStatistic};
pub use theme::{Theme, ThemeSink, ThemeState};
pub use time::{Instant, TickInterval, TimeSource};
pub use types::{CountdownUnit, UnitChange};
pub use visual::{Emphasis, FontSize, RenderError, SlotId, VisualTree};
