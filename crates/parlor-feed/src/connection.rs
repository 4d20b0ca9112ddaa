//! Live-channel lifecycle for one room activation.
//!
//! One background task per active room: connect, heartbeat, bounded
//! fixed-delay reconnect, resynchronize after a reconnect, tear down on
//! cancellation. Every timer lives inside the task's select loops, so
//! cancelling the task is cancelling the timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, interval_at, sleep};
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelError, ChannelEvent, ChannelFactory, CloseReason, RoomChannel};
use crate::events::{ConnectionState, DisconnectReason};
use crate::session::Shared;

/// Timing and bounds for the live channel.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Client heartbeat period
    pub heartbeat_interval: Duration,
    /// Fixed delay before each reconnect attempt
    pub reconnect_delay: Duration,
    /// Consecutive failed attempts before giving up for this room activation
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(25),
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_attempts: 5,
        }
    }
}

/// Owns the connection task for one room activation.
///
/// Dropping the guard cancels the task and, with it, the heartbeat interval
/// and any pending reconnect sleep — no timer outlives its room.
pub(crate) struct ConnectionGuard {
    cancel: CancellationToken,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(crate) fn spawn(
    shared: Arc<Shared>,
    channels: Arc<dyn ChannelFactory>,
    room_id: String,
    epoch: u64,
) -> ConnectionGuard {
    let cancel = CancellationToken::new();
    tokio::spawn(run(shared, channels, room_id, epoch, cancel.clone()));
    ConnectionGuard { cancel }
}

async fn run(
    shared: Arc<Shared>,
    channels: Arc<dyn ChannelFactory>,
    room_id: String,
    epoch: u64,
    cancel: CancellationToken,
) {
    let config = shared.config.connection.clone();
    let mut attempt: u32 = 0;
    let mut reconnected = false;

    loop {
        shared.set_connection(epoch, ConnectionState::Connecting);

        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            result = channels.connect(&room_id) => result,
        };

        match connected {
            Ok(mut channel) => {
                attempt = 0;
                shared.set_connection(epoch, ConnectionState::Connected);

                // Close the gap that opened while we were away before trusting
                // incremental pushes again. The reload goes through the same
                // idempotent merge, so overlap with the stream is harmless.
                if reconnected {
                    reconnected = false;
                    if let Err(err) = shared.load_initial(&room_id, epoch).await {
                        tracing::warn!("post-reconnect reload failed for room {room_id}: {err}");
                    }
                }

                match drive(channel.as_mut(), &shared, &room_id, epoch, &cancel, &config).await {
                    Outcome::Teardown => return,
                    Outcome::Closed(reason) => {
                        if reason.is_unauthenticated() {
                            shared.fail_connection(epoch, DisconnectReason::Unauthorized);
                            return;
                        }
                        if reason.is_forbidden() {
                            shared.fail_connection(epoch, DisconnectReason::Forbidden);
                            return;
                        }
                        tracing::debug!(
                            "channel for room {room_id} closed (code {:?})",
                            reason.code
                        );
                    }
                }
            }
            Err(ChannelError::MissingCredential) => {
                shared.fail_connection(epoch, DisconnectReason::MissingCredential);
                return;
            }
            Err(err) => {
                tracing::warn!("connect failed for room {room_id}: {err}");
            }
        }

        attempt += 1;
        if attempt > config.max_reconnect_attempts {
            shared.fail_connection(epoch, DisconnectReason::RetriesExhausted);
            return;
        }
        shared.set_reconnecting(epoch, attempt);
        reconnected = true;
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sleep(config.reconnect_delay) => {}
        }
    }
}

enum Outcome {
    Teardown,
    Closed(CloseReason),
}

/// What woke the drive loop.
enum Wake {
    Cancelled,
    Heartbeat,
    Channel(ChannelEvent),
}

async fn drive(
    channel: &mut dyn RoomChannel,
    shared: &Shared,
    room_id: &str,
    epoch: u64,
    cancel: &CancellationToken,
    config: &ConnectionConfig,
) -> Outcome {
    // First ping one period after connect, not immediately
    let mut heartbeat = interval_at(
        Instant::now() + config.heartbeat_interval,
        config.heartbeat_interval,
    );

    loop {
        let wake = tokio::select! {
            _ = cancel.cancelled() => Wake::Cancelled,
            _ = heartbeat.tick() => Wake::Heartbeat,
            event = channel.recv() => Wake::Channel(event),
        };

        match wake {
            Wake::Cancelled => return Outcome::Teardown,
            Wake::Heartbeat => {
                if let Err(err) = channel.ping().await {
                    tracing::debug!("heartbeat failed for room {room_id}: {err}");
                    return Outcome::Closed(CloseReason::new(None));
                }
                shared.note_heartbeat(epoch);
            }
            Wake::Channel(ChannelEvent::Frame(frame)) => {
                shared.apply_frame(room_id, epoch, frame).await;
            }
            Wake::Channel(ChannelEvent::Closed(reason)) => return Outcome::Closed(reason),
        }
    }
}
