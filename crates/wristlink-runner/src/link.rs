//! Phone side of a simulated session: dispatcher, transfer engine and watch
//! wired together.

use std::sync::Arc;

use tracing::{debug, info, warn};
use wristlink_asset::{AssetCodec, EncodedAsset, Geometry, SourceImage};
use wristlink_protocol::{Command, DeviceState, ErrorKind, ProtocolEvent, ResponseDispatcher};
use wristlink_transfer::{
    TransferEngine, TransferEvent, TransferKind, TransferParams, TransferProgress, TransferState,
    Transport,
};

use crate::config::RunnerConfig;
use crate::sim::{SimulatedWatch, WatchReport};
use crate::RunnerError;

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub state: TransferState,
    pub total_packets: usize,
    pub total_bytes: usize,
    pub progress_events: usize,
    pub last_progress: Option<TransferProgress>,
    pub failure: Option<ErrorKind>,
    pub watch: WatchReport,
}

pub struct Link {
    watch: Arc<SimulatedWatch>,
    dispatcher: ResponseDispatcher,
    engine: TransferEngine<Arc<SimulatedWatch>>,
}

impl Link {
    pub fn new(config: &RunnerConfig) -> Self {
        let watch = Arc::new(SimulatedWatch::new(config.device.clone()));
        let engine = TransferEngine::new(watch.clone(), config.transfer.clone());
        let dispatcher = ResponseDispatcher::new();
        if config.device.mtu > 0 {
            dispatcher.set_mtu(config.device.mtu);
        }
        Link {
            watch,
            dispatcher,
            engine,
        }
    }

    pub fn watch(&self) -> &SimulatedWatch {
        &self.watch
    }

    pub fn dispatcher(&self) -> &ResponseDispatcher {
        &self.dispatcher
    }

    pub fn engine(&self) -> &TransferEngine<Arc<SimulatedWatch>> {
        &self.engine
    }

    /// Send one command and deliver whatever the watch answers.
    pub fn send_command(&mut self, command: &Command) -> Result<Vec<ProtocolEvent>, RunnerError> {
        let frame = command.encode()?;
        if !self.watch.send(&frame) {
            warn!("Link: watch rejected 0x{:02X}", command.code());
        }
        Ok(self.pump())
    }

    /// Deliver queued replies to the dispatcher and then the engine.
    pub fn pump(&mut self) -> Vec<ProtocolEvent> {
        let mut events = Vec::new();
        for reply in self.watch.take_replies() {
            match self.dispatcher.handle_inbound(&reply) {
                Ok(event) => {
                    self.engine.handle_protocol_event(&event);
                    events.push(event);
                }
                Err(e) => warn!("Link: dropping reply: {}", e),
            }
        }
        events
    }

    /// Ask the watch who it is and how charged it is.
    pub fn query_device(&mut self) -> Result<Arc<DeviceState>, RunnerError> {
        self.send_command(&Command::GetDeviceInfo)?;
        self.send_command(&Command::GetBatteryLevel)?;
        Ok(self.dispatcher.snapshot())
    }

    /// Encode `image` for the connected screen.
    pub fn encode_for_device(
        &self,
        codec: &AssetCodec,
        image: &SourceImage,
        raw: bool,
    ) -> Result<EncodedAsset, RunnerError> {
        let (width, height) = self.dispatcher.snapshot().recommended_image_size()?;
        let target = Geometry::new(u32::from(width), u32::from(height));
        info!("Link: encoding {}x{} source for {}", image.width, image.height, target);
        let asset = if raw {
            codec.encode_raw(image, target)?
        } else {
            codec.encode_watch_face(image, target)?
        };
        Ok(asset)
    }

    /// Run a transfer to completion, failure or cancellation.
    ///
    /// Every round without a reply counts as a missing ack.
    pub fn run_transfer(
        &mut self,
        asset: &EncodedAsset,
        kind: TransferKind,
        params: TransferParams,
    ) -> Result<TransferSummary, RunnerError> {
        let events = self.engine.subscribe();
        self.engine.start(asset, kind, params)?;

        let total_packets = self
            .engine
            .progress()
            .map_or(0, |p| p.total_packets);
        let max_retries = self.engine.config().max_retries as usize;
        // Each round acknowledges a frame or spends a retry on it.
        let limit = (total_packets + 1) * (max_retries + 1) * 2 + 8;

        let mut rounds = 0;
        while self.engine.state().is_active() {
            rounds += 1;
            if rounds > limit {
                self.engine.cancel()?;
                return Err(RunnerError::Stalled(rounds));
            }
            if self.pump().is_empty() {
                debug!("Link: no reply, reporting missing ack");
                self.engine.on_ack_missing();
            }
        }

        let mut summary = TransferSummary {
            state: self.engine.state(),
            total_packets,
            total_bytes: asset.bytes.len(),
            progress_events: 0,
            last_progress: None,
            failure: None,
            watch: self.watch.report(),
        };
        for event in events.try_iter() {
            match event {
                TransferEvent::Progress(p) => {
                    summary.progress_events += 1;
                    summary.last_progress = Some(p);
                }
                TransferEvent::Failed { kind, progress } => {
                    summary.failure = Some(kind);
                    summary.last_progress = Some(progress);
                }
                TransferEvent::Cancelled(progress) => summary.last_progress = Some(progress),
                _ => {}
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wristlink_asset::{decode_container, ColorModel};
    use wristlink_protocol::{DialColor, ScreenShape, TimePosition};
    use wristlink_transfer::CustomDialStyle;

    fn gradient(width: u32, height: u32) -> SourceImage {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 128]);
            }
        }
        SourceImage::new(width, height, ColorModel::Rgb8, data)
    }

    #[test]
    fn test_query_device_fills_state() {
        let mut config = RunnerConfig::default();
        config.device.shape = ScreenShape::Round;
        config.device.screen_width = 360;
        config.device.screen_height = 390;
        let mut link = Link::new(&config);

        let state = link.query_device().unwrap();
        assert_eq!(state.screen.map(|s| s.shape), Some(ScreenShape::Round));
        assert_eq!(state.recommended_image_size().unwrap(), (360, 360));
        assert_eq!(state.mtu, Some(185));
        assert_eq!(state.battery.map(|b| b.level), Some(80));
    }

    #[test]
    fn test_custom_dial_end_to_end() {
        let mut config = RunnerConfig::default();
        config.device.mtu = 244;
        let mut link = Link::new(&config);
        link.query_device().unwrap();

        let codec = AssetCodec::new(config.codec.clone());
        let asset = link
            .encode_for_device(&codec, &gradient(480, 480), false)
            .unwrap();
        let style = CustomDialStyle {
            position: TimePosition::TopRight,
            color: DialColor::Orange,
        };
        let summary = link
            .run_transfer(&asset, TransferKind::MarketDial, TransferParams::custom_dial(style))
            .unwrap();

        assert_eq!(summary.state, TransferState::Completed);
        assert_eq!(summary.watch.asset, asset.bytes.to_vec());
        assert_eq!(summary.watch.dial_style, Some([1, 3, 3]));
        let (header, pixels) = decode_container(&summary.watch.asset).unwrap();
        assert_eq!((header.width, header.height), (240, 240));
        assert_eq!(pixels.len(), 240 * 240);
        let last = summary.last_progress.unwrap();
        assert_relative_eq!(last.percentage, 1.0);
    }

    #[test]
    fn test_dropped_acks_are_retried() {
        let mut config = RunnerConfig::default();
        config.device.mtu = 64;
        config.device.drop_every = 3;
        let mut link = Link::new(&config);

        let asset = EncodedAsset::raw((0..1000u32).map(|i| i as u8).collect::<Vec<u8>>());
        let summary = link
            .run_transfer(&asset, TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();

        assert_eq!(summary.state, TransferState::Completed);
        assert!(summary.watch.acks_dropped > 0);
        assert_eq!(summary.watch.asset, asset.bytes.to_vec());
        assert!(summary.progress_events > summary.total_packets);
    }

    #[test]
    fn test_every_ack_dropped_fails() {
        let mut config = RunnerConfig::default();
        config.device.drop_every = 1;
        config.transfer.max_retries = 2;
        let mut link = Link::new(&config);

        let asset = EncodedAsset::raw(vec![7u8; 50]);
        let summary = link
            .run_transfer(&asset, TransferKind::ResourceUpgrade, TransferParams::default())
            .unwrap();
        assert_eq!(summary.state, TransferState::Failed);
        assert_eq!(summary.failure, Some(ErrorKind::TransferFailed));
        assert_eq!(summary.watch.frames_received, 3);
    }

    #[test]
    fn test_no_mtu_is_configuration_error() {
        let mut config = RunnerConfig::default();
        config.device.mtu = 0;
        let mut link = Link::new(&config);
        let err = link
            .run_transfer(
                &EncodedAsset::raw(vec![1u8; 10]),
                TransferKind::ResourceUpgrade,
                TransferParams::default(),
            )
            .unwrap_err();
        assert!(matches!(err, RunnerError::Transfer(ref e) if e.kind() == ErrorKind::InvalidConfiguration));
    }
}
