//! The room session: active-room lifecycle and the consumer-facing contract.
//!
//! One session owns the feed store, the pagination state, and the live
//! connection for whichever room is active. All async completions are tagged
//! with the epoch current when they started; a completion whose epoch no
//! longer matches is discarded, which is what makes room switching safe
//! against late responses.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use parlor_api::{AgentSummary, ApiClient, FrameKind, StreamFrame};
use tokio::sync::broadcast;

use crate::backend::{Backend, HttpBackend};
use crate::channel::ChannelFactory;
use crate::connection::{self, ConnectionConfig, ConnectionGuard};
use crate::entry::{ChatMessage, FeedEntry, NarratorEvent};
use crate::error::{Error, Result};
use crate::events::{ConnectionState, DisconnectReason, LoadKind, SessionEvent};
use crate::filter::HiddenSenders;
use crate::store::{FeedMutation, FeedStore};
use crate::ws::WebSocketFactory;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Page size for the initial load and backward pagination
    pub page_size: usize,
    /// Senders whose messages never reach the visible feed
    pub hidden_senders: HiddenSenders,
    /// Live-channel timing and bounds
    pub connection: ConnectionConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            hidden_senders: HiddenSenders::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

/// Immutable view of the session for rendering.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub room_id: Option<String>,
    /// Timeline in ascending time order
    pub entries: Vec<FeedEntry>,
    /// Participant directory for the active room
    pub participants: Vec<AgentSummary>,
    pub connection: ConnectionState,
    pub reconnect_attempts: u32,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub is_initial_loading: bool,
    pub is_loading_older: bool,
    pub has_more_history: bool,
    /// Which load path last failed, until the room is reselected
    pub load_error: Option<LoadKind>,
}

struct SessionState {
    active_room: Option<String>,
    /// Bumped on every room switch; async completions compare against it
    epoch: u64,
    store: FeedStore,
    participants: Vec<AgentSummary>,
    connection: ConnectionState,
    reconnect_attempts: u32,
    last_heartbeat_at: Option<DateTime<Utc>>,
    is_initial_loading: bool,
    is_loading_older: bool,
    load_error: Option<LoadKind>,
    guard: Option<ConnectionGuard>,
}

impl SessionState {
    fn new(hidden: HiddenSenders) -> Self {
        Self {
            active_room: None,
            epoch: 0,
            store: FeedStore::new(hidden),
            participants: Vec::new(),
            connection: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            last_heartbeat_at: None,
            is_initial_loading: false,
            is_loading_older: false,
            load_error: None,
            guard: None,
        }
    }
}

/// State and collaborators shared between the session and its connection task.
pub(crate) struct Shared {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) config: SessionConfig,
    state: Mutex<SessionState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn set_connection(&self, epoch: u64, state: ConnectionState) {
        let mut st = self.state.lock();
        if st.epoch != epoch || st.connection == state {
            return;
        }
        st.connection = state;
        if state == ConnectionState::Connected {
            st.reconnect_attempts = 0;
        }
        drop(st);
        self.emit(SessionEvent::ConnectionChanged { state });
    }

    pub(crate) fn set_reconnecting(&self, epoch: u64, attempt: u32) {
        let mut st = self.state.lock();
        if st.epoch != epoch {
            return;
        }
        st.connection = ConnectionState::Reconnecting;
        st.reconnect_attempts = attempt;
        drop(st);
        self.emit(SessionEvent::ConnectionChanged {
            state: ConnectionState::Reconnecting,
        });
    }

    pub(crate) fn fail_connection(&self, epoch: u64, reason: DisconnectReason) {
        let mut st = self.state.lock();
        if st.epoch != epoch {
            return;
        }
        let was = st.connection;
        st.connection = ConnectionState::Disconnected;
        drop(st);
        if was != ConnectionState::Disconnected {
            self.emit(SessionEvent::ConnectionChanged {
                state: ConnectionState::Disconnected,
            });
        }
        self.emit(SessionEvent::ConnectionFailed { reason });
    }

    pub(crate) fn note_heartbeat(&self, epoch: u64) {
        let mut st = self.state.lock();
        if st.epoch != epoch {
            return;
        }
        st.last_heartbeat_at = Some(Utc::now());
    }

    /// Load the most recent page plus the participant directory and replace
    /// the feed. Also the resynchronization path after a reconnect.
    pub(crate) async fn load_initial(&self, room_id: &str, epoch: u64) -> Result<()> {
        {
            let mut st = self.state.lock();
            if st.epoch != epoch {
                return Ok(());
            }
            st.is_initial_loading = true;
        }

        let limit = self.config.page_size;
        let (feed, participants) = tokio::join!(
            self.backend.fetch_feed(room_id, limit),
            self.backend.fetch_participants(room_id),
        );

        let mut st = self.state.lock();
        if st.epoch != epoch {
            // The user switched rooms while this was in flight
            return Ok(());
        }
        st.is_initial_loading = false;

        match (feed, participants) {
            (Ok(items), Ok(agents)) => {
                let entries = items
                    .into_iter()
                    .map(|item| FeedEntry::from_wire(room_id, item))
                    .collect();
                let mutation = st.store.replace_all(entries);
                // Unknown until a backward page proves otherwise
                st.store.set_has_more_history(true);
                st.participants = agents;
                st.load_error = None;
                drop(st);
                self.emit(SessionEvent::FeedChanged { mutation });
                Ok(())
            }
            (Err(err), _) | (_, Err(err)) => {
                let cleared = st.store.remove_all();
                st.participants.clear();
                st.load_error = Some(LoadKind::Initial);
                drop(st);
                if let Some(mutation) = cleared {
                    self.emit(SessionEvent::FeedChanged { mutation });
                }
                self.emit(SessionEvent::LoadFailed {
                    kind: LoadKind::Initial,
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                });
                Err(err.into())
            }
        }
    }

    /// Handle one inbound frame from the live channel.
    pub(crate) async fn apply_frame(&self, room_id: &str, epoch: u64, frame: StreamFrame) {
        match frame.kind {
            FrameKind::Message => {
                match FeedEntry::from_stream_message(room_id, frame.message_payload()) {
                    Some(entry) => self.merge_live(epoch, entry),
                    None => {
                        // Incomplete payload: the snapshot is the only way to
                        // recover whatever this frame was announcing
                        tracing::debug!("incomplete message frame; reloading room {room_id}");
                        let _ = self.load_initial(room_id, epoch).await;
                    }
                }
            }
            FrameKind::Event => {
                match FeedEntry::from_stream_event(room_id, frame.event_payload()) {
                    Some(entry) => self.merge_live(epoch, entry),
                    None => {
                        tracing::debug!("incomplete event frame; reloading room {room_id}");
                        let _ = self.load_initial(room_id, epoch).await;
                    }
                }
            }
            FrameKind::Connected | FrameKind::Pong => {}
            FrameKind::Error => match frame.error_message() {
                Some(message) => tracing::warn!("channel error frame: {message}"),
                None => tracing::warn!("channel error frame"),
            },
            FrameKind::Unknown => {
                tracing::debug!("dropping frame of unknown kind");
            }
        }
    }

    /// Merge one entry from the stream or a send acknowledgment.
    pub(crate) fn merge_live(&self, epoch: u64, entry: FeedEntry) {
        let mut st = self.state.lock();
        if st.epoch != epoch {
            return;
        }
        let mutation = st.store.merge_incoming(vec![entry]);
        drop(st);
        if let Some(mutation) = mutation {
            self.emit(SessionEvent::FeedChanged { mutation });
        }
    }
}

/// Consumer-facing handle for the feed core.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct RoomSession {
    shared: Arc<Shared>,
    channels: Arc<dyn ChannelFactory>,
}

impl RoomSession {
    pub fn new(
        backend: Arc<dyn Backend>,
        channels: Arc<dyn ChannelFactory>,
        config: SessionConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let hidden = config.hidden_senders.clone();
        Self {
            shared: Arc::new(Shared {
                backend,
                config,
                state: Mutex::new(SessionState::new(hidden)),
                event_tx,
            }),
            channels,
        }
    }

    /// Production wiring: REST backend and WebSocket channel over one client.
    pub fn with_http(api: ApiClient, config: SessionConfig) -> Self {
        Self::new(
            Arc::new(HttpBackend::new(api.clone())),
            Arc::new(WebSocketFactory::new(api)),
            config,
        )
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Currently active room id.
    pub fn active_room(&self) -> Option<String> {
        self.shared.state.lock().active_room.clone()
    }

    /// Immutable view of the current session state.
    pub fn snapshot(&self) -> FeedSnapshot {
        let st = self.shared.state.lock();
        FeedSnapshot {
            room_id: st.active_room.clone(),
            entries: st.store.snapshot(),
            participants: st.participants.clone(),
            connection: st.connection,
            reconnect_attempts: st.reconnect_attempts,
            last_heartbeat_at: st.last_heartbeat_at,
            is_initial_loading: st.is_initial_loading,
            is_loading_older: st.is_loading_older,
            has_more_history: st.store.has_more_history(),
            load_error: st.load_error,
        }
    }

    /// Switch the active room (or deselect with `None`).
    ///
    /// Tears down the previous room's connection and timers synchronously,
    /// discards its feed, and starts the new room's connection and initial
    /// load. Responses still in flight for the previous room are dropped when
    /// they complete.
    pub async fn select_room(&self, room_id: Option<&str>) -> Result<()> {
        let (epoch, cleared, was_connected, prev_guard) = {
            let mut st = self.shared.state.lock();
            st.epoch += 1;
            let prev_guard = st.guard.take();
            let cleared = st.store.remove_all();
            st.participants.clear();
            st.active_room = room_id.map(str::to_string);
            st.is_initial_loading = false;
            st.is_loading_older = false;
            st.load_error = None;
            let was_connected = st.connection != ConnectionState::Disconnected;
            st.connection = ConnectionState::Disconnected;
            st.reconnect_attempts = 0;
            st.last_heartbeat_at = None;
            (st.epoch, cleared, was_connected, prev_guard)
        };
        // Cancels the previous connection task and every timer it owns
        drop(prev_guard);

        if let Some(mutation) = cleared {
            self.shared.emit(SessionEvent::FeedChanged { mutation });
        }
        if was_connected {
            self.shared.emit(SessionEvent::ConnectionChanged {
                state: ConnectionState::Disconnected,
            });
        }

        let Some(room) = room_id else {
            return Ok(());
        };

        let guard = connection::spawn(
            Arc::clone(&self.shared),
            Arc::clone(&self.channels),
            room.to_string(),
            epoch,
        );
        {
            let mut st = self.shared.state.lock();
            if st.epoch == epoch {
                st.guard = Some(guard);
            }
            // Otherwise a newer select_room won the race and dropping the
            // guard tears this connection down again.
        }

        self.shared.load_initial(room, epoch).await
    }

    /// Load one page of older history above the current oldest message.
    ///
    /// No-op while a load is already running, when history is exhausted, or
    /// when there is nothing to anchor the cursor on.
    pub async fn load_older(&self) -> Result<()> {
        let (room, epoch, cursor) = {
            let mut st = self.shared.state.lock();
            let Some(room) = st.active_room.clone() else {
                return Ok(());
            };
            if st.is_loading_older || !st.store.has_more_history() {
                return Ok(());
            }
            let Some(cursor) = st.store.oldest_message_id().map(str::to_string) else {
                return Ok(());
            };
            st.is_loading_older = true;
            (room, st.epoch, cursor)
        };

        let result = self
            .shared
            .backend
            .fetch_older_messages(&room, &cursor, self.shared.config.page_size)
            .await;

        let mut st = self.shared.state.lock();
        if st.epoch != epoch {
            return Ok(());
        }
        st.is_loading_older = false;

        match result {
            Ok(page) => {
                let entries = page
                    .items
                    .into_iter()
                    .map(|item| FeedEntry::Message(ChatMessage::from_item(&room, item)))
                    .collect();
                let mutation = st.store.prepend_older(entries, page.has_more);
                drop(st);
                if let Some(mutation) = mutation {
                    self.shared.emit(SessionEvent::FeedChanged { mutation });
                }
                Ok(())
            }
            Err(err) => {
                // Treat errors as "stop trying" rather than retrying forever;
                // reselecting the room re-enables pagination
                st.store.set_has_more_history(false);
                st.load_error = Some(LoadKind::Older);
                drop(st);
                self.shared.emit(SessionEvent::LoadFailed {
                    kind: LoadKind::Older,
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                });
                Err(err.into())
            }
        }
    }

    /// Send a user message to the whole room and insert it optimistically.
    ///
    /// The inserted entry uses the id from the synchronous acknowledgment, so
    /// the later stream echo of the same message merges into a no-op.
    pub async fn send_room_message(&self, text: &str) -> Result<ChatMessage> {
        let (room, epoch) = self.active()?;
        let ack = self.shared.backend.send_room_message(&room, text).await?;
        let message = ChatMessage::from_ack(&room, ack);
        self.shared
            .merge_live(epoch, FeedEntry::Message(message.clone()));
        Ok(message)
    }

    /// Send a user message addressed to one agent.
    pub async fn send_agent_message(&self, agent_id: &str, text: &str) -> Result<ChatMessage> {
        let (room, epoch) = self.active()?;
        let ack = self
            .shared
            .backend
            .send_agent_message(&room, agent_id, text)
            .await?;
        let message = ChatMessage::from_ack(&room, ack);
        self.shared
            .merge_live(epoch, FeedEntry::Message(message.clone()));
        Ok(message)
    }

    /// Create a narrator event; an empty target list addresses every agent.
    pub async fn send_event(
        &self,
        description: &str,
        target_agent_ids: &[String],
    ) -> Result<NarratorEvent> {
        let (room, epoch) = self.active()?;
        let ack = self
            .shared
            .backend
            .send_event(&room, description, "user_event", target_agent_ids)
            .await?;
        let event = NarratorEvent::from_ack(&room, ack);
        self.shared
            .merge_live(epoch, FeedEntry::Event(event.clone()));
        Ok(event)
    }

    /// Tear down the active room, if any.
    pub async fn close(&self) -> Result<()> {
        self.select_room(None).await
    }

    fn active(&self) -> Result<(String, u64)> {
        let st = self.shared.state.lock();
        match &st.active_room {
            Some(room) => Ok((room.clone(), st.epoch)),
            None => Err(Error::NoActiveRoom),
        }
    }
}
