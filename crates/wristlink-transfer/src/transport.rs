//! Transport abstraction.

use std::sync::Arc;

/// The link to the watch, as seen by the transfer engine.
///
/// Discovery, connection and MTU negotiation belong to the implementation.
/// Inbound frames do not come through here; the caller feeds them to a
/// `ResponseDispatcher` and forwards the resulting events to the engine.
pub trait Transport: Send + Sync {
    /// Queue one frame for writing. `false` means the link rejected it.
    fn send(&self, frame: &[u8]) -> bool;

    /// Negotiated MTU, if any.
    fn current_mtu(&self) -> Option<u16>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, frame: &[u8]) -> bool {
        (**self).send(frame)
    }

    fn current_mtu(&self) -> Option<u16> {
        (**self).current_mtu()
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, frame: &[u8]) -> bool {
        (**self).send(frame)
    }

    fn current_mtu(&self) -> Option<u16> {
        (**self).current_mtu()
    }
}
