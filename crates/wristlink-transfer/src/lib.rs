//! Chunked, acknowledged transfer of assets to the watch.
//!
//! A [`TransferEngine`] slices an encoded asset into MTU-sized packets,
//! announces it with a configuration frame, then streams one packet at a time,
//! waiting for each acknowledgement. Lost or rejected frames are resent up to
//! [`TransferConfig::max_retries`] times. Lifecycle and progress are published
//! as [`TransferEvent`]s to any number of subscribers.
//!
//! The engine never waits on its own. Whoever owns the link feeds it acks and
//! timeouts:
//!
//! ```ignore
//! let mut engine = TransferEngine::new(link, TransferConfig::default());
//! let events = engine.subscribe();
//! engine.start(&asset, TransferKind::MarketDial, TransferParams::market_dial(7))?;
//! // for each inbound frame:
//! let event = dispatcher.handle_inbound(&frame)?;
//! engine.handle_protocol_event(&event);
//! ```

mod config;
mod engine;
mod error;
mod events;
mod packet;
mod session;
mod transport;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use packet::*;
pub use session::*;
pub use transport::*;
