//! Application context tying the displays, the engine and the live client
//! together.

use rand::RngCore;

use crate::command::WidgetAction;
use crate::config::WidgetConfig;
use crate::datetime::{offset_from_minutes, DatetimeDisplay, DatetimeSlot};
use crate::engine::{CountdownEngine, EngineError, ServiceTiming};
use crate::live::{Channel, ChannelEvent, ChannelState, FrameError, LiveClient, LiveEvent, TimerProbe};
use crate::logging::{debug, info};
use crate::renderer::{CountdownMode, CountdownRenderer, CountdownSlot};
use crate::state::{CyclicMode, KeyValueStore, ModeState};
use crate::statistic::{StatisticSlot, UserStatistic};
use crate::theme::{Theme, ThemeSink, ThemeState};
use crate::time::{Instant, TimeSource};
use crate::visual::{RenderError, VisualTree};

/// Errors that can occur while driving the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WidgetError {
    /// An engine operation failed.
    Engine(EngineError),

    /// A display's slots did not match its mode.
    Render(RenderError),

    /// An inbound frame could not be decoded.
    Frame(FrameError),
}

impl core::fmt::Display for WidgetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WidgetError::Engine(err) => write!(f, "engine error: {}", err),
            WidgetError::Render(err) => write!(f, "render error: {}", err),
            WidgetError::Frame(err) => write!(f, "frame error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WidgetError {}

impl From<EngineError> for WidgetError {
    fn from(err: EngineError) -> Self {
        WidgetError::Engine(err)
    }
}

impl From<RenderError> for WidgetError {
    fn from(err: RenderError) -> Self {
        WidgetError::Render(err)
    }
}

impl From<FrameError> for WidgetError {
    fn from(err: FrameError) -> Self {
        WidgetError::Frame(err)
    }
}

/// The collaborator types a host provides.
pub trait Host {
    type Clock: TimeSource;
    type Store: KeyValueStore;
    type Channel: Channel;
    type CountdownTree: VisualTree<CountdownSlot>;
    type StatisticTree: VisualTree<StatisticSlot>;
    type DatetimeTree: VisualTree<DatetimeSlot>;
    type Rng: RngCore;
    type Theme: ThemeSink;
}

/// Owned collaborators handed to [`CountdownApp::new`].
pub struct HostParts<H: Host> {
    pub store: H::Store,
    pub channel: H::Channel,
    pub countdown_tree: H::CountdownTree,
    pub statistic_tree: H::StatisticTree,
    pub datetime_tree: H::DatetimeTree,
    pub rng: H::Rng,
    pub theme_sink: H::Theme,
}

/// The whole widget: countdown, statistic, datetime, theme and live client.
///
/// Construct it once at startup and route host events to
/// [`handle_action`](Self::handle_action),
/// [`handle_channel_event`](Self::handle_channel_event),
/// [`tick`](Self::tick) and [`service_timers`](Self::service_timers).
/// Operations returning [`ServiceTiming`] describe the recurring countdown
/// tick; one-shot deadlines are read with [`next_deadline`](Self::next_deadline).
///
/// # Type Parameters
/// * `'t` - Lifetime of the clock reference
/// * `H` - Host collaborator bundle
pub struct CountdownApp<'t, H: Host> {
    clock: &'t H::Clock,
    config: WidgetConfig,
    store: H::Store,
    rng: H::Rng,
    countdown_mode: ModeState<CountdownMode>,
    engine: CountdownEngine<'t, H::Clock>,
    renderer: CountdownRenderer<H::CountdownTree>,
    statistic: UserStatistic<H::StatisticTree>,
    datetime: DatetimeDisplay<H::DatetimeTree>,
    live: LiveClient<H::Channel>,
    theme: ThemeState,
    theme_sink: H::Theme,
    probe: TimerProbe,
    hidden: bool,
    user_count: Option<u64>,
    refresh_enabled: bool,
}

impl<'t, H: Host> CountdownApp<'t, H> {
    /// Loads persisted modes, mounts every display, applies the theme, starts
    /// the countdown at its mode's cadence and connects the live channel.
    ///
    /// The countdown is running afterwards; arm the recurring tick with
    /// [`tick_timing`](Self::tick_timing).
    pub fn new(
        clock: &'t H::Clock,
        parts: HostParts<H>,
        config: WidgetConfig,
        target: Instant,
    ) -> Result<Self, WidgetError> {
        let HostParts {
            store,
            channel,
            countdown_tree,
            statistic_tree,
            datetime_tree,
            mut rng,
            theme_sink,
        } = parts;

        let countdown_mode = ModeState::load(
            &store,
            config.countdown_key,
            CountdownMode::default_for_viewport(config.small_viewport),
        );
        let renderer = CountdownRenderer::mount(countdown_tree, countdown_mode.current())?;
        let statistic = UserStatistic::mount(
            statistic_tree,
            &store,
            config.statistic_key,
            config.click_count_key,
            &mut rng,
        )?;
        let datetime = DatetimeDisplay::mount(
            datetime_tree,
            &store,
            config.datetime_key,
            target,
            offset_from_minutes(config.utc_offset_minutes),
        )?;

        let theme = ThemeState::load(&store, config.theme_key, config.prefers_dark);

        let mut app = Self {
            clock,
            config,
            store,
            rng,
            countdown_mode,
            engine: CountdownEngine::new(clock, target),
            renderer,
            statistic,
            datetime,
            live: LiveClient::new(channel, config.backoff),
            theme,
            theme_sink,
            probe: TimerProbe::new(),
            hidden: false,
            user_count: None,
            refresh_enabled: false,
        };

        app.theme.apply(&mut app.store, &mut app.theme_sink);
        app.engine
            .start(app.config.interval_for(app.countdown_mode.current()));
        app.flush_changes()?;
        app.renderer.refresh_font_size();
        app.live.try_connect();

        info!("countdown widget started");
        Ok(app)
    }

    /// Handles a user or page action.
    ///
    /// Returns what to do with the recurring countdown tick.
    pub fn handle_action(&mut self, action: WidgetAction) -> Result<ServiceTiming, WidgetError> {
        match action {
            WidgetAction::CycleCountdown => self.cycle_countdown(),
            WidgetAction::CycleStatistic => {
                self.statistic.cycle(&mut self.store, &mut self.rng)?;
                Ok(ServiceTiming::Unchanged)
            }
            WidgetAction::CycleDatetime => {
                self.datetime.cycle(&mut self.store);
                Ok(ServiceTiming::Unchanged)
            }
            WidgetAction::ToggleTheme => {
                self.theme.toggle(&mut self.store, &mut self.theme_sink);
                Ok(ServiceTiming::Unchanged)
            }
            WidgetAction::Refresh => {
                self.refresh()?;
                Ok(ServiceTiming::Unchanged)
            }
            WidgetAction::VisibilityChanged { hidden } => self.set_hidden(hidden),
        }
    }

    /// Runs one countdown tick and renders the changes.
    ///
    /// Call when the recurring tick fires.
    pub fn tick(&mut self) -> Result<ServiceTiming, WidgetError> {
        let timing = self.engine.service()?;
        self.flush_changes()?;
        Ok(timing)
    }

    /// Routes a transport event.
    ///
    /// A malformed message returns `Err(WidgetError::Frame)` and leaves the
    /// widget untouched.
    pub fn handle_channel_event(
        &mut self,
        event: ChannelEvent<'_>,
    ) -> Result<Option<LiveEvent>, WidgetError> {
        let event = self.live.handle_event(event, self.clock.now())?;

        match event {
            Some(LiveEvent::Connected) => self.refresh_enabled = true,
            Some(LiveEvent::Disconnected) | Some(LiveEvent::ReconnectScheduled { .. }) => {
                self.refresh_enabled = false
            }
            Some(LiveEvent::TargetUpdated(target)) => {
                self.engine.update_target(target);
                self.flush_changes()?;
                self.datetime.update_target(target);
            }
            Some(LiveEvent::UserCountUpdated(count)) => self.user_count = Some(count),
            None => {}
        }

        Ok(event)
    }

    /// Fires due one-shot deadlines (reconnect, delayed disconnect, timer
    /// probe) and returns the next one.
    pub fn service_timers(&mut self) -> Option<Instant> {
        let now = self.clock.now();

        if self.probe.deadline().is_some_and(|at| at <= now) {
            self.probe.fire(now, self.hidden);
        }
        self.live.service(now);

        self.next_deadline()
    }

    /// Earliest pending one-shot deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.live.next_deadline(), self.probe.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Current recurring-tick instruction.
    pub fn tick_timing(&self) -> ServiceTiming {
        if self.engine.is_running() {
            ServiceTiming::Delay(self.engine.interval())
        } else {
            ServiceTiming::Idle
        }
    }

    /// Last user count received, if any.
    pub fn user_count(&self) -> Option<u64> {
        self.user_count
    }

    /// True while the channel is open and refresh clicks can be sent.
    pub fn refresh_enabled(&self) -> bool {
        self.refresh_enabled
    }

    /// True while the page is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn engine(&self) -> &CountdownEngine<'t, H::Clock> {
        &self.engine
    }

    pub fn renderer(&self) -> &CountdownRenderer<H::CountdownTree> {
        &self.renderer
    }

    pub fn statistic(&self) -> &UserStatistic<H::StatisticTree> {
        &self.statistic
    }

    pub fn datetime(&self) -> &DatetimeDisplay<H::DatetimeTree> {
        &self.datetime
    }

    pub fn live(&self) -> &LiveClient<H::Channel> {
        &self.live
    }

    /// Mutable access to the channel, for hosts that update its state.
    pub fn channel_mut(&mut self) -> &mut H::Channel {
        self.live.channel_mut()
    }

    /// Current theme.
    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    pub fn theme_sink(&self) -> &H::Theme {
        &self.theme_sink
    }

    pub fn store(&self) -> &H::Store {
        &self.store
    }

    pub fn probe(&self) -> &TimerProbe {
        &self.probe
    }

    fn cycle_countdown(&mut self) -> Result<ServiceTiming, WidgetError> {
        let mode = self.countdown_mode.cycle(&mut self.store);
        self.renderer.set_mode(mode)?;

        let interval = self.config.interval_for(mode);
        let timing = if self.engine.is_running() {
            self.engine.set_interval(interval)
        } else {
            // Retain the cadence for the next play.
            self.engine.set_interval(interval);
            ServiceTiming::Unchanged
        };

        self.engine.emit_all();
        self.flush_changes()?;
        self.renderer.refresh_font_size();

        debug!("countdown mode {}", mode.index());
        Ok(timing)
    }

    fn refresh(&mut self) -> Result<(), WidgetError> {
        match self.live.state() {
            ChannelState::Open => {
                self.live.request_increment();
                self.statistic
                    .increment_click_count(&mut self.store, &mut self.rng)?;
            }
            ChannelState::Closed => {
                self.live.try_connect();
            }
            ChannelState::Connecting | ChannelState::Closing => {}
        }
        Ok(())
    }

    fn set_hidden(&mut self, hidden: bool) -> Result<ServiceTiming, WidgetError> {
        self.hidden = hidden;
        let now = self.clock.now();

        if hidden {
            // The verdict from the previous probe decides this time.
            let supports_background_timers = self.probe.supports_background_timers();
            self.probe.start(now);

            if supports_background_timers {
                self.live
                    .delayed_disconnect(now, self.config.hidden_disconnect_ms);
            } else {
                self.live.try_disconnect();
            }
            Ok(self.engine.pause())
        } else {
            self.live.reconnect();
            let timing = self.engine.play();
            self.flush_changes()?;
            Ok(timing)
        }
    }

    fn flush_changes(&mut self) -> Result<(), RenderError> {
        for change in self.engine.drain_changes() {
            self.renderer.apply(change)?;
        }
        Ok(())
    }
}
