//! Routes inbound frames to their decoders and keeps device state current.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::{debug, trace, warn};
use wristlink_metrics::{labels, metric_defs};

use crate::error::Result;
use crate::events::{EventBus, ProtocolEvent};
use crate::frame::ResponseFrame;
use crate::health::{self, HealthStore};
use crate::responses::{Decoder, DECODERS};
use crate::state::{DeviceState, StateStore};

/// Inbound side of the protocol.
///
/// One frame is handled at a time per call; calls may come from any thread.
/// Every handled frame produces exactly one event on the bus.
pub struct ResponseDispatcher {
    handlers: HashMap<u8, Decoder>,
    state: StateStore,
    events: EventBus<ProtocolEvent>,
    health: Option<Arc<dyn HealthStore>>,
}

impl Default for ResponseDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDispatcher {
    /// A dispatcher with every built-in decoder registered and empty state.
    pub fn new() -> Self {
        Self::with_state(DeviceState::default())
    }

    /// Start from previously persisted state.
    pub fn with_state(initial: DeviceState) -> Self {
        ResponseDispatcher {
            handlers: DECODERS.iter().copied().collect(),
            state: StateStore::new(initial),
            events: EventBus::new(),
            health: None,
        }
    }

    /// Forward health records to `store` after each state update.
    pub fn with_health_store(mut self, store: Arc<dyn HealthStore>) -> Self {
        self.health = Some(store);
        self
    }

    /// Replace or add the decoder for an identifier.
    pub fn register(&mut self, id: u8, decoder: Decoder) -> Option<Decoder> {
        self.handlers.insert(id, decoder)
    }

    pub fn is_registered(&self, id: u8) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Subscribe to decoded events.
    pub fn subscribe(&self) -> Receiver<ProtocolEvent> {
        self.events.subscribe()
    }

    /// The latest complete device state.
    pub fn snapshot(&self) -> Arc<DeviceState> {
        self.state.snapshot()
    }

    /// Handle one inbound frame.
    ///
    /// Unknown identifiers are not an error: they yield
    /// [`ProtocolEvent::Unrecognized`] and leave state alone. A malformed
    /// payload for a known identifier publishes
    /// [`ProtocolEvent::DecodeFailed`] and returns the error.
    pub fn handle_inbound(&self, bytes: &[u8]) -> Result<ProtocolEvent> {
        let frame = match ResponseFrame::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping inbound frame: {}", e);
                return Err(e);
            }
        };
        let id = frame.id();
        trace!("Inbound frame 0x{:02X}, {} payload bytes", id, frame.payload().len());

        let Some(decoder) = self.handlers.get(&id) else {
            debug!("No handler for frame 0x{:02X}, discarding", id);
            metrics::counter!(metric_defs::FRAMES_UNRECOGNIZED.name, &labels::command(id))
                .increment(1);
            let event = ProtocolEvent::Unrecognized {
                id,
                len: frame.payload().len(),
            };
            self.events.publish(event.clone());
            return Ok(event);
        };

        let event = match decoder(&mut frame.reader()) {
            Ok(event) => event,
            Err(error) => {
                warn!("Failed to decode frame 0x{:02X}: {}", id, error);
                metrics::counter!(metric_defs::DECODE_ERRORS.name, &labels::command(id))
                    .increment(1);
                self.events.publish(ProtocolEvent::DecodeFailed {
                    id,
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        self.apply(&event);
        metrics::counter!(metric_defs::FRAMES_DISPATCHED.name, &labels::command(id)).increment(1);
        Ok(event)
    }

    /// Record an MTU reported by the transport.
    pub fn set_mtu(&self, mtu: u16) -> ProtocolEvent {
        let event = ProtocolEvent::MtuUpdated(mtu);
        self.apply(&event);
        event
    }

    fn apply(&self, event: &ProtocolEvent) {
        let changed = self.state.update(|state| state.apply(event));
        if changed {
            debug!("Device state updated: {:?}", event);
        }
        if let Some(store) = &self.health {
            health::forward(store.as_ref(), event);
        }
        self.events.publish(event.clone());
    }
}

impl std::fmt::Debug for ResponseDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDispatcher")
            .field("handlers", &self.handlers.len())
            .field("events", &self.events)
            .field("health", &self.health.is_some())
            .finish()
    }
}
