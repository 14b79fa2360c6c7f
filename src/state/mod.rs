pub mod game;
pub mod gate;
pub mod records;
pub mod scoring;
pub mod sequence;
pub mod session;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::{AppConfig, GameRules};

pub use self::sse::SseHub;
use self::{
    game::PlayerId,
    gate::AdminGate,
    records::PlayerRecordStore,
    sequence::{RandomSequence, SequenceSource},
    session::GameSession,
};

pub type SharedState = Arc<AppState>;

/// Capacity of the event hub; slow subscribers skip what they missed.
const EVENT_CAPACITY: usize = 256;

/// Central application state: player records, live sessions and the admin gate.
pub struct AppState {
    config: AppConfig,
    records: PlayerRecordStore,
    sessions: DashMap<PlayerId, GameSession>,
    gate: AdminGate,
    sequences: Arc<dyn SequenceSource>,
    events: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_sequence_source(config, Arc::new(RandomSequence))
    }

    /// Construct the state with a custom source of target sequences.
    pub fn with_sequence_source(
        config: AppConfig,
        sequences: Arc<dyn SequenceSource>,
    ) -> SharedState {
        let records = PlayerRecordStore::new(config.rules().max_attempts);
        Arc::new(Self {
            config,
            records,
            sessions: DashMap::new(),
            gate: AdminGate::new(),
            sequences,
            events: SseHub::new(EVENT_CAPACITY),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Gameplay parameters.
    pub fn rules(&self) -> &GameRules {
        self.config.rules()
    }

    /// Cumulative per-player statistics.
    pub fn records(&self) -> &PlayerRecordStore {
        &self.records
    }

    /// Live sessions keyed by their owner; at most one per player.
    pub fn sessions(&self) -> &DashMap<PlayerId, GameSession> {
        &self.sessions
    }

    /// Gate blocking new sessions once closed.
    pub fn gate(&self) -> &AdminGate {
        &self.gate
    }

    /// Source of target sequences.
    pub fn sequences(&self) -> &dyn SequenceSource {
        self.sequences.as_ref()
    }

    /// Hub carrying player effects and public notifications.
    pub fn events(&self) -> &SseHub {
        &self.events
    }
}
