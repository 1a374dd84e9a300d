//! The transfer state machine.
//!
//! The engine owns at most one session. It never blocks or times out on its
//! own: the caller feeds it acknowledgements (usually by passing dispatcher
//! events to [`TransferEngine::handle_protocol_event`]) and reports lost acks
//! with [`TransferEngine::on_ack_missing`]. Exactly one frame is in flight at
//! any time, so packet `n + 1` is never sent before packet `n` resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_channel::Receiver;
use tracing::{debug, info, trace, warn};
use wristlink_asset::EncodedAsset;
use wristlink_metrics::{labels, metric_defs};
use wristlink_protocol::{
    Command, DialType, ErrorKind, EventBus, MarketConfig, MarketPacket, ProtocolError,
    ProtocolEvent, ResourceConfig, ResourcePacket, TransferAck,
};

use crate::config::TransferConfig;
use crate::error::{Result, TransferError};
use crate::events::{TransferEvent, TransferProgress};
use crate::packet::Packetizer;
use crate::session::{TransferKind, TransferParams, TransferState};
use crate::transport::Transport;

/// Cooperative cancellation flag, shareable across threads.
///
/// The engine checks it before sending the next packet and before acting on
/// the next ack.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Session {
    kind: TransferKind,
    params: TransferParams,
    asset: Bytes,
    mtu: u16,
    packets: Packetizer,
    wire_total: u16,
    wire_size: u32,
    /// Configuration frame acknowledged.
    configured: bool,
    /// First packet the watch has not acknowledged.
    next_index: usize,
    /// The frame for `next_index` (or the config frame) awaits resolution.
    in_flight: bool,
    /// Consecutive failures of the in-flight frame.
    retries: u32,
}

impl Session {
    fn current_command(&self) -> std::result::Result<Command, ProtocolError> {
        if !self.configured {
            return Ok(self.config_command());
        }
        let index = self.next_index;
        let range = self.packets.slice(index).ok_or_else(|| {
            ProtocolError::InvalidData(format!("packet {} past end of asset", index))
        })?;
        let wire_index = u16::try_from(index)
            .map_err(|_| ProtocolError::InvalidData(format!("packet index {} too large", index)))?;
        let data = self.asset[range].to_vec();
        let progress = self.packets.progress_byte(index);
        let last = self.packets.is_last(index);

        Ok(match self.kind {
            TransferKind::MarketDial => Command::DialMarketData(MarketPacket {
                index: wire_index,
                bin: self.params.bin,
                progress,
                last,
                data,
            }),
            TransferKind::ResourceUpgrade => Command::ResourceData(ResourcePacket {
                index: wire_index,
                progress,
                last,
                data,
            }),
        })
    }

    fn config_command(&self) -> Command {
        match self.kind {
            TransferKind::MarketDial => Command::DialMarketConfig(MarketConfig {
                total_packets: self.wire_total,
                total_size: self.wire_size,
                mtu: self.mtu,
                dial_type: self.params.dial_type,
                dial_num: self.params.dial_num,
                local: self.params.local,
                type_value: self.params.type_value,
                dial_type_value: self.params.dial_type_value,
            }),
            TransferKind::ResourceUpgrade => Command::ResourceConfig(ResourceConfig {
                total_packets: self.wire_total,
                total_size: self.wire_size,
                mtu: self.mtu,
            }),
        }
    }

    fn progress(&self, status: impl Into<String>) -> TransferProgress {
        TransferProgress::new(
            self.next_index,
            self.packets.total_packets(),
            self.packets.bytes_through(self.next_index),
            self.packets.total_bytes(),
            status,
        )
    }
}

/// Drives one chunked transfer at a time over a [`Transport`].
pub struct TransferEngine<T: Transport> {
    transport: T,
    config: TransferConfig,
    events: EventBus<TransferEvent>,
    cancel: CancelHandle,
    state: TransferState,
    session: Option<Session>,
}

impl<T: Transport> TransferEngine<T> {
    pub fn new(transport: T, config: TransferConfig) -> Self {
        TransferEngine {
            transport,
            config,
            events: EventBus::new(),
            cancel: CancelHandle::default(),
            state: TransferState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receive every [`TransferEvent`] from now on.
    pub fn subscribe(&self) -> Receiver<TransferEvent> {
        self.events.subscribe()
    }

    /// Handle for cancelling from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Position of the current (or last) session.
    pub fn progress(&self) -> Option<TransferProgress> {
        self.session
            .as_ref()
            .map(|s| s.progress(self.state.to_string()))
    }

    /// Consecutive failures of the in-flight frame.
    pub fn retry_count(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.retries)
    }

    /// Begin sending `asset`. Sends the configuration frame before returning.
    ///
    /// Configuration problems are reported here, before any state change or
    /// send. Everything after that arrives as events.
    pub fn start(
        &mut self,
        asset: &EncodedAsset,
        kind: TransferKind,
        params: TransferParams,
    ) -> Result<()> {
        if self.state.is_active() {
            return Err(TransferError::Busy(self.state));
        }
        let mtu = self.transport.current_mtu().ok_or(TransferError::NoMtu)?;
        if asset.is_empty() || asset.bytes.is_empty() {
            return Err(TransferError::EmptyAsset);
        }
        let len = asset.bytes.len();
        let packets = Packetizer::new(len, mtu, kind.overhead())?;
        let too_large = || TransferError::TooLarge {
            size: len,
            packets: packets.total_packets(),
        };
        let wire_total = u16::try_from(packets.total_packets()).map_err(|_| too_large())?;
        let wire_size = u32::try_from(len).map_err(|_| too_large())?;

        self.cancel.reset();
        self.session = Some(Session {
            kind,
            params,
            asset: asset.bytes.clone(),
            mtu,
            packets,
            wire_total,
            wire_size,
            configured: false,
            next_index: 0,
            in_flight: false,
            retries: 0,
        });
        self.state = TransferState::Preparing;

        info!(
            "TransferEngine[{}]: starting {} bytes in {} packets (mtu {})",
            kind,
            len,
            packets.total_packets(),
            mtu
        );
        metrics::histogram!(metric_defs::TRANSFER_BYTES.name, &labels::transfer(kind.label()))
            .record(len as f64);
        self.events.publish(TransferEvent::Started {
            kind,
            total_packets: packets.total_packets(),
            total_bytes: len,
        });

        self.state = TransferState::ConfiguringDevice;
        self.transmit();
        Ok(())
    }

    /// The watch answered the configuration frame.
    pub fn on_config_ack(&mut self, ok: bool) {
        if self.take_cancel() {
            return;
        }
        if self.state != TransferState::ConfiguringDevice {
            debug!("TransferEngine: ignoring config ack while {}", self.state);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if ok {
            session.configured = true;
            session.in_flight = false;
            session.retries = 0;
            debug!("TransferEngine[{}]: device configured, streaming", session.kind);
            self.state = TransferState::Streaming;
            self.transmit();
        } else {
            warn!("TransferEngine[{}]: watch rejected configuration", session.kind);
            if self.register_failure() {
                self.transmit();
            }
        }
    }

    /// The watch answered data packet `index`.
    ///
    /// Acks for anything but the in-flight packet are ignored.
    pub fn on_packet_ack(&mut self, index: usize, ok: bool) {
        if self.take_cancel() {
            return;
        }
        if !matches!(self.state, TransferState::Streaming | TransferState::Paused) {
            debug!("TransferEngine: ignoring ack for packet {} while {}", index, self.state);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.in_flight || index != session.next_index {
            debug!(
                "TransferEngine[{}]: stale ack for packet {} (expecting {})",
                session.kind, index, session.next_index
            );
            return;
        }

        if !ok {
            warn!("TransferEngine[{}]: watch rejected packet {}", session.kind, index);
            if self.register_failure() && self.state == TransferState::Streaming {
                self.transmit();
            }
            return;
        }

        session.in_flight = false;
        session.retries = 0;
        session.next_index += 1;
        trace!("TransferEngine[{}]: packet {} acknowledged", session.kind, index);

        if session.next_index >= session.packets.total_packets() {
            self.complete();
        } else if self.state == TransferState::Streaming {
            self.transmit();
        }
    }

    /// The caller's ack timer expired for the in-flight frame.
    pub fn on_ack_missing(&mut self) {
        if self.take_cancel() {
            return;
        }
        if !matches!(
            self.state,
            TransferState::ConfiguringDevice | TransferState::Streaming | TransferState::Paused
        ) {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.in_flight {
            return;
        }
        warn!(
            "TransferEngine[{}]: no ack for {}",
            session.kind,
            if session.configured {
                format!("packet {}", session.next_index)
            } else {
                "configuration".to_string()
            }
        );
        if self.register_failure() && self.state != TransferState::Paused {
            self.transmit();
        }
    }

    /// Stop sending after the in-flight packet. Only from `Streaming`.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != TransferState::Streaming {
            return Err(TransferError::InvalidState {
                operation: "pause",
                state: self.state,
            });
        }
        self.state = TransferState::Paused;
        if let Some(progress) = self.progress() {
            info!("TransferEngine: paused at packet {}", progress.current_packet);
            self.events.publish(TransferEvent::Paused(progress));
        }
        Ok(())
    }

    /// Continue at the next unsent packet. Only from `Paused`.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != TransferState::Paused {
            return Err(TransferError::InvalidState {
                operation: "resume",
                state: self.state,
            });
        }
        self.state = TransferState::Streaming;
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let waiting = session.in_flight;
        let progress = session.progress(self.state.to_string());
        info!("TransferEngine[{}]: resumed at packet {}", session.kind, session.next_index);
        self.events.publish(TransferEvent::Resumed(progress));
        if !waiting {
            self.transmit();
        }
        Ok(())
    }

    /// Abandon the session now. Allowed from any non-terminal state.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(TransferError::InvalidState {
                operation: "cancel",
                state: self.state,
            });
        }
        self.finish_cancel();
        Ok(())
    }

    /// Pick a failed session back up at its last unacknowledged frame.
    pub fn retry_transfer(&mut self) -> Result<()> {
        if self.state != TransferState::Failed {
            return Err(TransferError::InvalidState {
                operation: "retry",
                state: self.state,
            });
        }
        let Some(session) = self.session.as_mut() else {
            return Err(TransferError::InvalidState {
                operation: "retry",
                state: self.state,
            });
        };
        session.retries = 0;
        session.in_flight = false;
        let from_packet = session.next_index;
        self.state = if session.configured {
            TransferState::Streaming
        } else {
            TransferState::ConfiguringDevice
        };
        self.cancel.reset();
        info!("TransferEngine[{}]: retrying from packet {}", session.kind, from_packet);
        self.events.publish(TransferEvent::Retrying { from_packet });
        self.transmit();
        Ok(())
    }

    /// Route a dispatcher event to the session. Returns `true` if consumed.
    pub fn handle_protocol_event(&mut self, event: &ProtocolEvent) -> bool {
        match event {
            ProtocolEvent::TransferAck(ack) => {
                let Some(session) = self.session.as_ref() else {
                    return false;
                };
                if ack.channel() != session.kind.channel() {
                    return false;
                }
                match *ack {
                    TransferAck::Config { ok, .. } => self.on_config_ack(ok),
                    TransferAck::Packet { index, ok, .. } => {
                        self.on_packet_ack(usize::from(index), ok)
                    }
                    TransferAck::Query { .. } => return false,
                }
                true
            }
            ProtocolEvent::MtuUpdated(mtu) => {
                // Packet size is fixed for the life of a session.
                if self.state.is_active() {
                    debug!("TransferEngine: MTU now {}, applies to the next transfer", mtu);
                }
                false
            }
            _ => false,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Send the frame for the current position, resending on rejection until
    /// the retry budget runs out.
    fn transmit(&mut self) {
        loop {
            if self.take_cancel() {
                return;
            }
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let frame = match session.current_command().and_then(|c| c.encode()) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("TransferEngine[{}]: cannot build frame: {}", session.kind, e);
                    self.fail(e.kind());
                    return;
                }
            };

            if self.transport.send(&frame) {
                session.in_flight = true;
                if session.configured {
                    metrics::counter!(
                        metric_defs::PACKETS_SENT.name,
                        &labels::transfer(session.kind.label())
                    )
                    .increment(1);
                    let status = format!(
                        "sent packet {}/{}",
                        session.next_index + 1,
                        session.packets.total_packets()
                    );
                    trace!("TransferEngine[{}]: {}", session.kind, status);
                    let progress = session.progress(status);
                    self.events.publish(TransferEvent::Progress(progress));
                } else {
                    trace!("TransferEngine[{}]: sent configuration", session.kind);
                }
                return;
            }

            warn!("TransferEngine[{}]: transport rejected frame", session.kind);
            if !self.register_failure() {
                return;
            }
        }
    }

    /// Count one failure of the in-flight frame. Returns `true` if it should be
    /// resent, `false` once the session has failed.
    fn register_failure(&mut self) -> bool {
        let max = self.config.max_retries;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.in_flight = false;
        session.retries += 1;
        metrics::counter!(
            metric_defs::PACKET_RETRIES.name,
            &labels::transfer(session.kind.label())
        )
        .increment(1);

        if session.retries > max {
            warn!(
                "TransferEngine[{}]: giving up after {} retries",
                session.kind, max
            );
            self.fail(ErrorKind::TransferFailed);
            return false;
        }
        debug!(
            "TransferEngine[{}]: resend {}/{}",
            session.kind, session.retries, max
        );
        true
    }

    /// Cancel if the handle was tripped while a session is active.
    fn take_cancel(&mut self) -> bool {
        if self.cancel.is_cancelled() && self.state.is_active() {
            self.finish_cancel();
            return true;
        }
        false
    }

    fn finish_cancel(&mut self) {
        let session = self.session.take();
        self.state = TransferState::Cancelled;
        let Some(session) = session else {
            return;
        };
        let progress = session.progress("cancelled");
        info!(
            "TransferEngine[{}]: cancelled at packet {}/{}",
            session.kind,
            progress.current_packet,
            progress.total_packets
        );
        metrics::counter!(
            metric_defs::TRANSFERS_CANCELLED.name,
            &labels::transfer(session.kind.label())
        )
        .increment(1);
        self.events.publish(TransferEvent::Cancelled(progress));
    }

    fn fail(&mut self, kind: ErrorKind) {
        self.state = TransferState::Failed;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.in_flight = false;
        let progress = session.progress("failed");
        metrics::counter!(
            metric_defs::TRANSFERS_FAILED.name,
            &labels::transfer(session.kind.label())
        )
        .increment(1);
        self.events.publish(TransferEvent::Failed { kind, progress });
    }

    fn complete(&mut self) {
        self.state = TransferState::Completed;
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let total_bytes = session.packets.total_bytes();
        info!(
            "TransferEngine[{}]: completed {} bytes",
            session.kind, total_bytes
        );
        metrics::counter!(
            metric_defs::TRANSFERS_COMPLETED.name,
            &labels::transfer(session.kind.label())
        )
        .increment(1);
        self.events
            .publish(TransferEvent::Progress(session.progress("completed")));
        self.events.publish(TransferEvent::Completed {
            kind: session.kind,
            total_bytes,
        });

        if session.kind == TransferKind::MarketDial && session.params.dial_type == DialType::Custom
        {
            let style = session.params.custom_style;
            let command = Command::SetTimePositionAndColor {
                dial_type: DialType::Custom,
                position: style.position,
                color: style.color,
            };
            match command.encode() {
                Ok(frame) => {
                    if !self.transport.send(&frame) {
                        warn!("TransferEngine: transport rejected dial style command");
                    }
                }
                Err(e) => warn!("TransferEngine: cannot encode dial style: {}", e),
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for TransferEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("progress", &self.progress())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use wristlink_protocol::{
        DialColor, TimePosition, TransferChannel, CMD_DIAL_MARKET, CMD_RESOURCE_UPGRADE,
        CMD_TIME_POSITION_AND_COLOR, CONTROL_CONTINUE, CONTROL_FINAL, TRANSFER_OP_CONFIG,
        TRANSFER_OP_DATA,
    };

    use crate::session::CustomDialStyle;

    /// Records every frame; can be told to reject sends.
    #[derive(Default)]
    struct RecordingTransport {
        mtu: Option<u16>,
        sent: Mutex<Vec<Vec<u8>>>,
        reject: AtomicBool,
    }

    impl RecordingTransport {
        fn with_mtu(mtu: u16) -> Self {
            RecordingTransport {
                mtu: Some(mtu),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, frame: &[u8]) -> bool {
            if self.reject.load(Ordering::SeqCst) {
                return false;
            }
            self.sent.lock().push(frame.to_vec());
            true
        }

        fn current_mtu(&self) -> Option<u16> {
            self.mtu
        }
    }

    fn asset(len: usize) -> EncodedAsset {
        EncodedAsset::raw((0..len).map(|i| i as u8).collect::<Vec<u8>>())
    }

    fn drain(rx: &Receiver<TransferEvent>) -> Vec<TransferEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_start_without_mtu() {
        let mut engine = TransferEngine::new(RecordingTransport::default(), TransferConfig::default());
        let err = engine
            .start(&asset(10), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap_err();
        assert_eq!(err, TransferError::NoMtu);
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(engine.state(), TransferState::Idle);
        assert!(engine.transport().sent().is_empty());
    }

    #[test]
    fn test_start_with_empty_asset() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(20), TransferConfig::default());
        let err = engine
            .start(&asset(0), TransferKind::MarketDial, TransferParams::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(engine.state(), TransferState::Idle);
    }

    #[test]
    fn test_start_with_tiny_mtu() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(7), TransferConfig::default());
        let err = engine
            .start(&asset(10), TransferKind::MarketDial, TransferParams::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMtu);
        assert!(engine.transport().sent().is_empty());
    }

    #[test]
    fn test_config_frame_first() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        let rx = engine.subscribe();
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();

        assert_eq!(engine.state(), TransferState::ConfiguringDevice);
        let sent = engine.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            vec![CMD_RESOURCE_UPGRADE, TRANSFER_OP_CONFIG, 0, 7, 0, 0, 0, 100, 0, 21]
        );
        assert_eq!(
            drain(&rx),
            vec![TransferEvent::Started {
                kind: TransferKind::ResourceUpgrade,
                total_packets: 7,
                total_bytes: 100,
            }]
        );
    }

    #[test]
    fn test_busy_while_active() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        let err = engine
            .start(&asset(5), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap_err();
        assert_eq!(err, TransferError::Busy(TransferState::ConfiguringDevice));
    }

    #[test]
    fn test_market_data_frames() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(20), TransferConfig::default());
        let params = TransferParams {
            bin: 2,
            ..TransferParams::market_dial(42)
        };
        engine
            .start(&asset(20), TransferKind::MarketDial, params)
            .unwrap();
        engine.on_config_ack(true);
        engine.on_packet_ack(0, true);

        let sent = engine.transport().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(&sent[0][..2], &[CMD_DIAL_MARKET, TRANSFER_OP_CONFIG]);
        // 13 data bytes per packet at MTU 20.
        assert_eq!(&sent[1][..7], &[CMD_DIAL_MARKET, TRANSFER_OP_DATA, 0, 0, 2, 50, CONTROL_CONTINUE]);
        assert_eq!(sent[1].len(), 20);
        assert_eq!(&sent[2][..7], &[CMD_DIAL_MARKET, TRANSFER_OP_DATA, 0, 1, 2, 100, CONTROL_FINAL]);
        assert_eq!(&sent[2][7..], &(13u8..20).collect::<Vec<u8>>()[..]);
    }

    #[test]
    fn test_stale_ack_ignored() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        engine.on_config_ack(true);
        engine.on_packet_ack(3, true);
        assert_eq!(engine.transport().sent().len(), 2);
        assert_eq!(engine.progress().unwrap().current_packet, 0);
    }

    #[test]
    fn test_rejected_send_retries_then_fails() {
        let transport = RecordingTransport::with_mtu(21);
        transport.reject.store(true, Ordering::SeqCst);
        let mut engine = TransferEngine::new(transport, TransferConfig { max_retries: 2 });
        let rx = engine.subscribe();
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();

        assert_eq!(engine.state(), TransferState::Failed);
        let events = drain(&rx);
        match events.last() {
            Some(TransferEvent::Failed { kind, progress }) => {
                assert_eq!(*kind, ErrorKind::TransferFailed);
                assert_eq!(progress.current_packet, 0);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_pause_holds_next_packet() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        engine.on_config_ack(true);
        engine.pause().unwrap();
        assert_eq!(engine.state(), TransferState::Paused);

        // Ack for the in-flight packet is recorded, nothing new goes out.
        engine.on_packet_ack(0, true);
        assert_eq!(engine.transport().sent().len(), 2);
        assert_eq!(engine.progress().unwrap().current_packet, 1);

        engine.resume().unwrap();
        assert_eq!(engine.state(), TransferState::Streaming);
        let sent = engine.transport().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(&sent[2][2..4], &[0, 1]);
    }

    #[test]
    fn test_pause_only_while_streaming() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        assert!(engine.pause().is_err());
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        let err = engine.pause().unwrap_err();
        assert_eq!(
            err,
            TransferError::InvalidState {
                operation: "pause",
                state: TransferState::ConfiguringDevice,
            }
        );
        assert!(engine.resume().is_err());
    }

    #[test]
    fn test_cancel_releases_session() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        let rx = engine.subscribe();
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        engine.cancel().unwrap();
        assert_eq!(engine.state(), TransferState::Cancelled);
        assert!(engine.progress().is_none());
        assert!(matches!(drain(&rx).last(), Some(TransferEvent::Cancelled(_))));
        assert!(engine.cancel().is_err());
        assert!(engine.retry_transfer().is_err());
    }

    #[test]
    fn test_cancel_handle_checked_before_next_ack() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(21), TransferConfig::default());
        let handle = engine.cancel_handle();
        engine
            .start(&asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        engine.on_config_ack(true);
        handle.cancel();
        engine.on_packet_ack(0, true);
        assert_eq!(engine.state(), TransferState::Cancelled);
        assert_eq!(engine.transport().sent().len(), 2);
    }

    #[test]
    fn test_custom_dial_sends_style() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(20), TransferConfig::default());
        let params = TransferParams::custom_dial(CustomDialStyle {
            position: TimePosition::BottomRight,
            color: DialColor::Cyan,
        });
        engine.start(&asset(10), TransferKind::MarketDial, params).unwrap();
        engine.on_config_ack(true);
        engine.on_packet_ack(0, true);

        assert_eq!(engine.state(), TransferState::Completed);
        let sent = engine.transport().sent();
        assert_eq!(
            sent.last().unwrap(),
            &vec![CMD_TIME_POSITION_AND_COLOR, 1, 4, 7]
        );
    }

    #[test]
    fn test_market_dial_without_style() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(20), TransferConfig::default());
        engine
            .start(&asset(10), TransferKind::MarketDial, TransferParams::market_dial(3))
            .unwrap();
        engine.on_config_ack(true);
        engine.on_packet_ack(0, true);
        assert_eq!(engine.state(), TransferState::Completed);
        assert_eq!(engine.transport().sent().len(), 2);
    }

    #[test]
    fn test_acks_from_other_channel_ignored() {
        let mut engine = TransferEngine::new(RecordingTransport::with_mtu(20), TransferConfig::default());
        engine
            .start(&asset(10), TransferKind::MarketDial, TransferParams::default())
            .unwrap();
        let foreign = ProtocolEvent::TransferAck(TransferAck::Config {
            channel: TransferChannel::Resource,
            ok: true,
        });
        assert!(!engine.handle_protocol_event(&foreign));
        assert_eq!(engine.state(), TransferState::ConfiguringDevice);

        let ours = ProtocolEvent::TransferAck(TransferAck::Config {
            channel: TransferChannel::Market,
            ok: true,
        });
        assert!(engine.handle_protocol_event(&ours));
        assert_eq!(engine.state(), TransferState::Streaming);
    }
}
