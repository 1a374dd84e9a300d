//! Watch Protocol
//!
//! Types and utilities for talking to a smart watch over a small-MTU wireless
//! link. Every frame is a single write or notification that starts with a
//! command identifier byte; the same identifier is used by the request and
//! the response that answers it.
//!
//! # Protocol Overview
//!
//! - **Commands** (phone -> watch): built from [`Command`] and encoded into a
//!   [`CommandFrame`].
//! - **Responses** (watch -> phone): handed to a [`ResponseDispatcher`], which
//!   decodes them, updates the [`DeviceState`] snapshot and publishes one
//!   [`ProtocolEvent`] per frame.
//! - **Switch words**: named flags packed into 2 or 4 byte bitmasks by the
//!   [`switches`] registry.
//!
//! # Example
//!
//! ```rust,ignore
//! use wristlink_protocol::{Command, ResponseDispatcher};
//!
//! let frame = Command::GetBatteryLevel.encode()?;
//! transport.send(&frame);
//!
//! let dispatcher = ResponseDispatcher::new();
//! let events = dispatcher.subscribe();
//! dispatcher.handle_inbound(&received)?;
//! ```

mod commands;
mod constants;
mod dispatcher;
mod error;
mod events;
mod frame;
mod health;
mod responses;
mod state;
pub mod switches;
mod types;

pub use commands::*;
pub use constants::*;
pub use dispatcher::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use health::*;
pub use responses::{Decoder, DECODERS};
pub use state::*;
pub use switches::{
    bytes_to_flags, flags_to_bytes, NotificationSwitch, NotificationSwitches, SettingSwitch,
    SettingSwitches, SwitchFlag, SwitchSet, SwitchWord,
};
pub use types::*;
