//! Live-update client over an opaque byte channel.
//!
//! The server pushes 8-byte big-endian frames: a non-negative value is the new
//! target in Unix seconds, a negative value is the negated number of connected
//! users. The client sends an empty frame to request a target increment.
//!
//! [`LiveClient`] owns the reconnect and idle-disconnect policy. It never
//! sleeps; deadlines are reported to the host, which calls
//! [`LiveClient::service`] once they pass.

use core::fmt;
use core::ops::RangeInclusive;

use crate::logging::{debug, info, warning};
use crate::time::Instant;

/// Largest magnitude a frame value may have (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Length of every inbound frame.
pub const FRAME_LEN: usize = 8;

/// Outbound frame requesting a target increment.
pub const INCREMENT_FRAME: [u8; 0] = [];

/// Connection state reported by a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Trait for abstracting the bidirectional transport.
///
/// Implement this over a WebSocket or any message-oriented link. Transport
/// events are fed back through [`LiveClient::handle_event`].
pub trait Channel {
    /// Starts connecting. Only called while `Closed`.
    fn open(&mut self);

    /// Starts closing. Only called while `Open`.
    fn close(&mut self);

    /// Sends one binary frame.
    fn send(&mut self, frame: &[u8]);

    /// Returns the current connection state.
    fn state(&self) -> ChannelState;
}

/// Transport event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent<'a> {
    Open,
    Close,
    Error,
    Message(&'a [u8]),
}

/// Decoded inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LiveFrame {
    /// New countdown target.
    Target(Instant),
    /// Number of connected users.
    UserCount(u64),
}

/// What a transport event meant to the rest of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LiveEvent {
    Connected,
    Disconnected,
    TargetUpdated(Instant),
    UserCountUpdated(u64),
    /// A transport error occurred; reconnecting after `delay_ms`.
    ReconnectScheduled { delay_ms: u32 },
}

/// Errors decoding an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame was not exactly [`FRAME_LEN`] bytes.
    InvalidLength(usize),
    /// Value magnitude exceeds [`MAX_SAFE_INTEGER`].
    OutOfSafeRange(i64),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidLength(len) => {
                write!(f, "expected a {}-byte frame, got {} bytes", FRAME_LEN, len)
            }
            FrameError::OutOfSafeRange(value) => {
                write!(f, "frame value {} exceeds the safe integer range", value)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

/// Decodes an inbound frame.
pub fn decode_frame(frame: &[u8]) -> Result<LiveFrame, FrameError> {
    let bytes: [u8; FRAME_LEN] = frame
        .try_into()
        .map_err(|_| FrameError::InvalidLength(frame.len()))?;
    let value = i64::from_be_bytes(bytes);

    if value.unsigned_abs() > MAX_SAFE_INTEGER {
        return Err(FrameError::OutOfSafeRange(value));
    }

    if value >= 0 {
        Ok(LiveFrame::Target(Instant::from_unix_seconds(value)))
    } else {
        Ok(LiveFrame::UserCount(value.unsigned_abs()))
    }
}

/// Backoff strategy for calculating reconnect delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackoffStrategy {
    /// Same delay for every attempt.
    Fixed { delay_ms: u32 },
    /// `initial_ms + attempt * increment_ms`, capped at `max_ms`.
    Linear {
        initial_ms: u32,
        increment_ms: u32,
        max_ms: u32,
    },
    /// `initial_ms * 2^attempt`, capped at `max_ms`.
    Exponential { initial_ms: u32, max_ms: u32 },
}

impl BackoffStrategy {
    /// Delay before reconnect attempt number `attempt` (zero-based).
    pub fn calculate_delay(&self, attempt: u32) -> u32 {
        match *self {
            BackoffStrategy::Fixed { delay_ms } => delay_ms,
            BackoffStrategy::Linear {
                initial_ms,
                increment_ms,
                max_ms,
            } => initial_ms
                .saturating_add(increment_ms.saturating_mul(attempt))
                .min(max_ms),
            BackoffStrategy::Exponential { initial_ms, max_ms } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                initial_ms.saturating_mul(factor).min(max_ms)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential {
            initial_ms: 2_000,
            max_ms: 30_000,
        }
    }
}

/// Reconnecting client around a [`Channel`].
///
/// # Type Parameters
/// * `C` - Channel implementation type
pub struct LiveClient<C: Channel> {
    channel: C,
    backoff: BackoffStrategy,
    failures: u32,
    reconnect_at: Option<Instant>,
    disconnect_at: Option<Instant>,
}

impl<C: Channel> LiveClient<C> {
    /// Wraps a channel. Nothing is opened until [`try_connect`](Self::try_connect).
    pub fn new(channel: C, backoff: BackoffStrategy) -> Self {
        Self {
            channel,
            backoff,
            failures: 0,
            reconnect_at: None,
            disconnect_at: None,
        }
    }

    /// Interprets a transport event.
    ///
    /// Errors never fail: they schedule a reconnect using the backoff
    /// strategy. Only undecodable messages return `Err`.
    pub fn handle_event(
        &mut self,
        event: ChannelEvent<'_>,
        now: Instant,
    ) -> Result<Option<LiveEvent>, FrameError> {
        match event {
            ChannelEvent::Open => {
                info!("live channel open");
                self.failures = 0;
                self.reconnect_at = None;
                Ok(Some(LiveEvent::Connected))
            }
            ChannelEvent::Close => {
                info!("live channel closed");
                Ok(Some(LiveEvent::Disconnected))
            }
            ChannelEvent::Error => {
                self.try_disconnect();

                let delay_ms = self.backoff.calculate_delay(self.failures);
                self.failures = self.failures.saturating_add(1);
                self.reconnect_at = now.checked_add_millis(i64::from(delay_ms));
                warning!(
                    "live channel error, reconnecting in {}ms (attempt {})",
                    delay_ms, self.failures
                );

                Ok(Some(LiveEvent::ReconnectScheduled { delay_ms }))
            }
            ChannelEvent::Message(frame) => match decode_frame(frame)? {
                LiveFrame::Target(target) => Ok(Some(LiveEvent::TargetUpdated(target))),
                LiveFrame::UserCount(count) => Ok(Some(LiveEvent::UserCountUpdated(count))),
            },
        }
    }

    /// Opens the channel if it is fully closed. Returns true if it did.
    pub fn try_connect(&mut self) -> bool {
        if self.channel.state() != ChannelState::Closed {
            return false;
        }

        debug!("live channel connecting");
        self.channel.open();
        true
    }

    /// Closes the channel if it is open. Returns true if it did.
    pub fn try_disconnect(&mut self) -> bool {
        if self.channel.state() != ChannelState::Open {
            return false;
        }

        debug!("live channel disconnecting");
        self.channel.close();
        true
    }

    /// Schedules a disconnect `delay_ms` from `now`, replacing any pending one.
    pub fn delayed_disconnect(&mut self, now: Instant, delay_ms: u32) {
        debug!("live channel disconnect in {}ms", delay_ms);
        self.disconnect_at = now.checked_add_millis(i64::from(delay_ms));
    }

    /// Cancels a pending delayed disconnect, then connects if closed.
    pub fn reconnect(&mut self) -> bool {
        self.disconnect_at = None;
        self.try_connect()
    }

    /// Sends the increment request if the channel is open.
    pub fn request_increment(&mut self) -> bool {
        if self.channel.state() != ChannelState::Open {
            return false;
        }

        self.channel.send(&INCREMENT_FRAME);
        true
    }

    /// Fires every deadline at or before `now` and returns the next one.
    pub fn service(&mut self, now: Instant) -> Option<Instant> {
        if self.disconnect_at.is_some_and(|at| at <= now) {
            self.disconnect_at = None;
            self.try_disconnect();
        }

        if self.reconnect_at.is_some_and(|at| at <= now) {
            self.reconnect_at = None;
            self.try_connect();
        }

        self.next_deadline()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.disconnect_at, self.reconnect_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the channel's connection state.
    pub fn state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Consecutive failures since the last successful open.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Pending delayed disconnect, if any.
    pub fn pending_disconnect(&self) -> Option<Instant> {
        self.disconnect_at
    }

    /// Pending reconnect, if any.
    pub fn pending_reconnect(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Returns the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns the underlying channel mutably.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}

/// Checks whether the host keeps running timers while the page is hidden.
///
/// Start a probe when the page is hidden; if the host fires it while still
/// hidden and roughly on time, background timers are considered honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerProbe {
    started_at: Option<Instant>,
    supported: bool,
}

impl TimerProbe {
    /// Delay the probe asks the host for.
    pub const PROBE_DELAY_MS: u32 = 1_000;

    /// Elapsed times accepted as "on time".
    pub const ACCEPTED_MS: RangeInclusive<u64> = 900..=1_700;

    /// Creates a probe that assumes no background timer support.
    pub const fn new() -> Self {
        Self {
            started_at: None,
            supported: false,
        }
    }

    /// Starts (or restarts) the probe.
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    /// When the probe wants to fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.started_at
            .and_then(|start| start.checked_add_millis(i64::from(Self::PROBE_DELAY_MS)))
    }

    /// Completes the probe. The verdict only changes if the page is still hidden.
    pub fn fire(&mut self, now: Instant, hidden: bool) {
        let Some(start) = self.started_at.take() else {
            return;
        };

        if hidden {
            let elapsed = now.saturating_millis_since(start);
            self.supported = Self::ACCEPTED_MS.contains(&elapsed);
            debug!("timer probe fired after {}ms", elapsed);
        }
    }

    /// Current verdict.
    pub fn supports_background_timers(&self) -> bool {
        self.supported
    }
}
