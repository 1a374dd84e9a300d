//! End-to-end transfer sessions against an in-memory watch.

use std::collections::VecDeque;
use std::sync::Arc;

use approx::assert_relative_eq;
use parking_lot::Mutex;
use wristlink_asset::EncodedAsset;
use wristlink_protocol::{
    ErrorKind, ResponseDispatcher, CMD_RESOURCE_UPGRADE, STATUS_OK, TRANSFER_OP_CONFIG,
    TRANSFER_OP_DATA,
};
use wristlink_transfer::{
    TransferConfig, TransferEngine, TransferEvent, TransferKind, TransferParams, TransferState,
    Transport,
};

/// Resource-upgrade frame header: id, op, index:u16, progress, control.
const RESOURCE_DATA_HEADER: usize = 6;

struct FakeWatch {
    mtu: u16,
    /// Frames received and not yet answered.
    pending: Mutex<VecDeque<Vec<u8>>>,
    /// Every frame ever received.
    log: Mutex<Vec<Vec<u8>>>,
}

impl FakeWatch {
    fn new(mtu: u16) -> Arc<Self> {
        Arc::new(FakeWatch {
            mtu,
            pending: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
        })
    }

    fn next_frame(&self) -> Option<Vec<u8>> {
        self.pending.lock().pop_front()
    }

    fn data_frames(&self) -> Vec<Vec<u8>> {
        self.log
            .lock()
            .iter()
            .filter(|f| f[0] == CMD_RESOURCE_UPGRADE && f[1] == TRANSFER_OP_DATA)
            .cloned()
            .collect()
    }
}

impl Transport for FakeWatch {
    fn send(&self, frame: &[u8]) -> bool {
        self.pending.lock().push_back(frame.to_vec());
        self.log.lock().push(frame.to_vec());
        true
    }

    fn current_mtu(&self) -> Option<u16> {
        Some(self.mtu)
    }
}

/// What the watch would answer to `frame`.
fn reply_to(frame: &[u8], status: u8) -> Option<Vec<u8>> {
    match frame {
        [id, TRANSFER_OP_CONFIG, ..] => Some(vec![*id, TRANSFER_OP_CONFIG, status]),
        [id, TRANSFER_OP_DATA, hi, lo, ..] => Some(vec![*id, TRANSFER_OP_DATA, *hi, *lo, status]),
        _ => None,
    }
}

fn sample_asset(len: usize) -> EncodedAsset {
    EncodedAsset::raw((0..len).map(|i| (i * 7 % 251) as u8).collect::<Vec<u8>>())
}

/// Answer frames until the watch has nothing left to answer or `stop` says so.
fn pump(
    engine: &mut TransferEngine<Arc<FakeWatch>>,
    watch: &FakeWatch,
    dispatcher: &ResponseDispatcher,
    mut stop: impl FnMut(&TransferEngine<Arc<FakeWatch>>) -> bool,
) {
    while let Some(frame) = watch.next_frame() {
        if stop(engine) {
            return;
        }
        if let Some(reply) = reply_to(&frame, STATUS_OK) {
            let event = dispatcher.handle_inbound(&reply).unwrap();
            engine.handle_protocol_event(&event);
        }
    }
}

#[test]
fn test_full_transfer_delivers_asset() {
    // MTU 21 less the 6 byte envelope gives 15 data bytes, the same split as a
    // 20 byte MTU with a 5 byte envelope: 6 x 15 + 10.
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig::default());
    let events = engine.subscribe();
    let asset = sample_asset(100);

    engine
        .start(&asset, TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    pump(&mut engine, &watch, &dispatcher, |_| false);

    assert_eq!(engine.state(), TransferState::Completed);

    let frames = watch.data_frames();
    assert_eq!(frames.len(), 7);
    let lens: Vec<usize> = frames.iter().map(|f| f.len() - RESOURCE_DATA_HEADER).collect();
    assert_eq!(lens, vec![15, 15, 15, 15, 15, 15, 10]);
    let joined: Vec<u8> = frames
        .iter()
        .flat_map(|f| f[RESOURCE_DATA_HEADER..].to_vec())
        .collect();
    assert_eq!(&joined[..], &asset.bytes[..]);

    // Packet indices strictly increase, progress bytes too, only the last is final.
    let indices: Vec<u16> = frames.iter().map(|f| u16::from_be_bytes([f[2], f[3]])).collect();
    assert_eq!(indices, (0..7).collect::<Vec<u16>>());
    assert!(frames.windows(2).all(|w| w[0][4] < w[1][4]));
    let finals: Vec<u8> = frames.iter().map(|f| f[5]).collect();
    assert_eq!(finals, vec![0, 0, 0, 0, 0, 0, 1]);

    let events: Vec<TransferEvent> = events.try_iter().collect();
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            TransferEvent::Progress(p) => Some(p.clone()),
            _ => None,
        })
        .collect();
    assert!(progress
        .windows(2)
        .all(|w| w[0].current_packet <= w[1].current_packet
            && w[0].percentage <= w[1].percentage));
    assert_eq!(progress.iter().filter(|p| p.is_complete()).count(), 1);
    let last = progress.last().unwrap();
    assert_eq!(last.current_packet, last.total_packets);
    assert_relative_eq!(last.percentage, 1.0);

    assert!(matches!(events.first(), Some(TransferEvent::Started { total_packets: 7, .. })));
    assert_eq!(
        events.last(),
        Some(&TransferEvent::Completed {
            kind: TransferKind::ResourceUpgrade,
            total_bytes: 100,
        })
    );
}

#[test]
fn test_cancel_after_third_packet() {
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig::default());
    let events = engine.subscribe();

    engine
        .start(&sample_asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    pump(&mut engine, &watch, &dispatcher, |_| {
        watch.data_frames().len() == 3
    });
    assert_eq!(watch.data_frames().len(), 3);

    engine.cancel().unwrap();
    assert_eq!(engine.state(), TransferState::Cancelled);

    // A late ack for packet 2 changes nothing.
    let late = dispatcher
        .handle_inbound(&[CMD_RESOURCE_UPGRADE, TRANSFER_OP_DATA, 0, 2, STATUS_OK])
        .unwrap();
    assert!(!engine.handle_protocol_event(&late));
    engine.on_packet_ack(2, true);
    engine.on_ack_missing();

    assert_eq!(watch.data_frames().len(), 3);
    let events: Vec<TransferEvent> = events.try_iter().collect();
    match events.last() {
        Some(TransferEvent::Cancelled(progress)) => {
            assert_eq!(progress.current_packet, 2);
            assert_eq!(progress.total_packets, 7);
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[test]
fn test_cancel_handle_from_another_thread() {
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig::default());
    let handle = engine.cancel_handle();

    engine
        .start(&sample_asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    std::thread::spawn(move || handle.cancel()).join().unwrap();
    pump(&mut engine, &watch, &dispatcher, |_| false);

    assert_eq!(engine.state(), TransferState::Cancelled);
    assert!(watch.data_frames().is_empty());
}

#[test]
fn test_retry_bound_is_exact() {
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig { max_retries: 3 });
    let events = engine.subscribe();

    engine
        .start(&sample_asset(100), TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    let config = watch.next_frame().unwrap();
    let ack = dispatcher.handle_inbound(&reply_to(&config, STATUS_OK).unwrap()).unwrap();
    engine.handle_protocol_event(&ack);
    assert_eq!(watch.data_frames().len(), 1);

    for resend in 1..=3 {
        engine.on_ack_missing();
        assert_eq!(engine.state(), TransferState::Streaming);
        assert_eq!(engine.retry_count(), resend);
        assert_eq!(watch.data_frames().len(), 1 + resend as usize);
    }
    engine.on_ack_missing();
    assert_eq!(engine.state(), TransferState::Failed);
    assert_eq!(watch.data_frames().len(), 4);

    let frames = watch.data_frames();
    assert!(frames.iter().all(|f| f == &frames[0]));

    let failed = events
        .try_iter()
        .find_map(|e| match e {
            TransferEvent::Failed { kind, progress } => Some((kind, progress)),
            _ => None,
        })
        .unwrap();
    assert_eq!(failed.0, ErrorKind::TransferFailed);
    assert_eq!(failed.1.current_packet, 0);
}

#[test]
fn test_rejected_ack_resends_same_packet() {
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig::default());

    engine
        .start(&sample_asset(30), TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    let config = watch.next_frame().unwrap();
    engine.handle_protocol_event(
        &dispatcher
            .handle_inbound(&reply_to(&config, STATUS_OK).unwrap())
            .unwrap(),
    );
    let first = watch.next_frame().unwrap();
    engine.handle_protocol_event(&dispatcher.handle_inbound(&reply_to(&first, 1).unwrap()).unwrap());

    let again = watch.next_frame().unwrap();
    assert_eq!(again, first);
    assert_eq!(engine.retry_count(), 1);

    // A good ack clears the counter.
    engine.handle_protocol_event(
        &dispatcher
            .handle_inbound(&reply_to(&again, STATUS_OK).unwrap())
            .unwrap(),
    );
    assert_eq!(engine.retry_count(), 0);
    pump(&mut engine, &watch, &dispatcher, |_| false);
    assert_eq!(engine.state(), TransferState::Completed);
}

#[test]
fn test_retry_transfer_resumes_at_unacknowledged_packet() {
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig { max_retries: 1 });
    let events = engine.subscribe();
    let asset = sample_asset(100);

    engine
        .start(&asset, TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    pump(&mut engine, &watch, &dispatcher, |_| watch.data_frames().len() == 3);
    engine.on_ack_missing();
    engine.on_ack_missing();
    assert_eq!(engine.state(), TransferState::Failed);
    assert!(engine.pause().is_err());

    watch.pending.lock().clear();
    engine.retry_transfer().unwrap();
    assert_eq!(engine.state(), TransferState::Streaming);
    assert!(events
        .try_iter()
        .any(|e| e == TransferEvent::Retrying { from_packet: 2 }));

    let resent = watch.data_frames().last().cloned().unwrap();
    assert_eq!(u16::from_be_bytes([resent[2], resent[3]]), 2);

    pump(&mut engine, &watch, &dispatcher, |_| false);
    assert_eq!(engine.state(), TransferState::Completed);

    // Every packet index appears, the resent ones more than once.
    let mut seen: Vec<u16> = watch
        .data_frames()
        .iter()
        .map(|f| u16::from_be_bytes([f[2], f[3]]))
        .collect();
    seen.dedup();
    assert_eq!(seen, (0..7).collect::<Vec<u16>>());
}

#[test]
fn test_config_rejection_fails_before_data() {
    let watch = FakeWatch::new(21);
    let dispatcher = ResponseDispatcher::new();
    let mut engine = TransferEngine::new(watch.clone(), TransferConfig { max_retries: 0 });

    engine
        .start(&sample_asset(40), TransferKind::ResourceUpgrade, TransferParams::default())
        .unwrap();
    let config = watch.next_frame().unwrap();
    engine.handle_protocol_event(&dispatcher.handle_inbound(&reply_to(&config, 3).unwrap()).unwrap());

    assert_eq!(engine.state(), TransferState::Failed);
    assert!(watch.data_frames().is_empty());

    // Retrying a session that never configured starts with the config frame.
    engine.retry_transfer().unwrap();
    assert_eq!(engine.state(), TransferState::ConfiguringDevice);
    let resent = watch.next_frame().unwrap();
    assert_eq!(resent, config);
}
