//! 传输服务集成测试
//!
//! 验证序列计数盖戳、接收序列校验、空闲包旁路、监听者过滤扇出以及下层回环

use std::cell::RefCell;
use std::rc::Rc;

use spp_packet::{
    IdlePattern, PacketAssembly, PrimaryHeader, SecondaryHeader, SpBuilder, SpIdleBuilder,
};
use spp_transfer::{
    ApidFilter, Channel, LayerError, SpListener, TransferConfig, TransferDirection, TransferError,
    TransferService,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 记录收到的 (apid, seq, direction)
#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<(u16, u16, TransferDirection)>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.seen.borrow().len()
    }

    fn apids(&self) -> Vec<u16> {
        self.seen.borrow().iter().map(|(apid, _, _)| *apid).collect()
    }
}

impl SpListener for Recorder {
    fn on_packet(&self, header: &PrimaryHeader, bytes: &[u8], direction: TransferDirection) {
        assert_eq!(bytes.len(), 6 + header.length() as usize);
        self.seen
            .borrow_mut()
            .push((header.apid(), header.sequence_count(), direction));
    }
}

fn transmit(service: &mut TransferService, apid: u16) -> Result<(), TransferError> {
    let mut buf = [0u8; 16];
    let mut packet = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
    packet.primary_header_mut().set_apid(apid);
    packet.data().put_bytes(&[0xDE, 0xAD]).unwrap();
    service.transmit(&mut packet)
}

/// 组一个指定序列计数的原始包，用于模拟下层输入
fn raw_packet(apid: u16, sequence_count: u16) -> Vec<u8> {
    let mut buf = [0u8; 8];
    let mut packet = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
    packet.primary_header_mut().set_apid(apid);
    packet.primary_header_mut().set_sequence_count(sequence_count);
    packet.data().put(0x5Au16, 16, false).unwrap();
    packet.finalize().unwrap();
    packet.bytes().to_vec()
}

#[test]
fn test_sequence_advances_by_packet_count() {
    init_logger();
    println!("\n=== 测试序列计数推进 ===\n");

    let mut service = TransferService::default();
    let n = 16384 + 6;
    for _ in 0..n {
        transmit(&mut service, 33).unwrap();
    }

    let context = service.apid_context(33).copied().unwrap();
    println!("  APID 33: tx={} next={}", context.tx_count, context.next_sequence_count);
    assert_eq!(context.tx_count, n as u64);
    assert_eq!(context.next_sequence_count, 6);
    assert_eq!(service.telemetry().tx_count, n as u64);
    println!("✓ 序列计数按模16384推进");
}

#[test]
fn test_sequence_mismatch_is_dropped() {
    init_logger();
    println!("\n=== 测试接收序列不符 ===\n");

    let mut service = TransferService::default();
    let recorder = Rc::new(Recorder::default());
    assert!(service.register_listener_all(Some(recorder.clone())));

    service.receive_from_lower_layer(&raw_packet(5, 0)).unwrap();
    assert_eq!(service.apid_context(5).map(|c| c.next_sequence_count), Some(1));

    let result = service.receive_from_lower_layer(&raw_packet(5, 7));
    assert_eq!(
        result,
        Err(TransferError::SequenceMismatch {
            apid: 5,
            expected: 1,
            actual: 7
        })
    );

    let telemetry = service.telemetry();
    assert_eq!(telemetry.sequence_mismatches, 1);
    assert_eq!(telemetry.rx_errors, 1);
    assert_eq!(telemetry.rx_count, 1);
    assert_eq!(recorder.count(), 1);
    assert_eq!(service.apid_context(5).map(|c| c.next_sequence_count), Some(1));
    assert_eq!(service.apid_context(5).map(|c| c.rx_count), Some(1));
    println!("✓ 序列不符的包被丢弃且不通知");
}

#[test]
fn test_idle_packets_bypass_sequence_check() {
    init_logger();

    let mut service = TransferService::default();
    let recorder = Rc::new(Recorder::default());
    service.register_listener_all(Some(recorder.clone()));

    for sequence_count in [1234, 7, 7] {
        let mut buf = [0u8; 10];
        let mut idle = SpIdleBuilder::new(&mut buf[..], IdlePattern::octet(0x55)).unwrap();
        idle.primary_header_mut().set_sequence_count(sequence_count);
        idle.fill_remaining().unwrap();
        idle.finalize().unwrap();
        service.receive_from_lower_layer(idle.bytes()).unwrap();
    }

    assert_eq!(recorder.count(), 3);
    assert_eq!(service.telemetry().idle_count, 3);
    assert_eq!(service.telemetry().rx_errors, 0);
    assert_eq!(service.apid_context(0x7FF).map(|c| c.rx_count), Some(3));
}

#[test]
fn test_idle_transmit_counts() {
    let mut service = TransferService::default();
    let mut buf = [0u8; 12];
    let mut idle = SpIdleBuilder::new(&mut buf[..], IdlePattern::new(0xA, 4)).unwrap();
    idle.fill_remaining().unwrap();
    service.transmit(&mut idle).unwrap();

    assert_eq!(service.telemetry().idle_count, 1);
    assert_eq!(service.telemetry().tx_count, 1);
    assert_eq!(service.apid_context(0x7FF).map(|c| c.tx_count), Some(1));
}

#[test]
fn test_filter_fan_out() {
    init_logger();
    println!("\n=== 测试监听者过滤 ===\n");

    let mut service = TransferService::default();
    let exact = Rc::new(Recorder::default());
    let all = Rc::new(Recorder::default());
    service.register_listener(Some(exact.clone()), ApidFilter::Exact(100));
    service.register_listener(Some(all.clone()), ApidFilter::MatchAll);

    transmit(&mut service, 100).unwrap();
    transmit(&mut service, 200).unwrap();
    service.receive_from_lower_layer(&raw_packet(300, 0)).unwrap();
    service.receive_from_lower_layer(&raw_packet(100, 1)).unwrap();

    println!("  Exact(100): {:?}", exact.apids());
    println!("  MatchAll:   {:?}", all.apids());
    assert_eq!(exact.apids(), vec![100, 100]);
    assert_eq!(all.apids(), vec![100, 200, 300, 100]);
    assert_eq!(
        exact.seen.borrow().iter().map(|(_, _, d)| *d).collect::<Vec<_>>(),
        vec![TransferDirection::Transmit, TransferDirection::Receive]
    );
    println!("✓ 过滤扇出正确");
}

#[test]
fn test_registry_full_and_absent_listener() {
    let config = TransferConfig {
        listener_capacity: 2,
        ..TransferConfig::default()
    };
    let mut service = TransferService::new(config);
    let recorder = Rc::new(Recorder::default());

    assert!(!service.register_listener_all(None));
    assert!(service.register_listener_all(Some(recorder.clone())));
    assert!(service.register_listener(Some(recorder.clone()), ApidFilter::Exact(1)));
    assert!(!service.register_listener(Some(Rc::new(Recorder::default())), ApidFilter::MatchAll));
    assert_eq!(service.listener_count(), 2);

    // 同一句柄注册两次，注销一次只移除一个条目
    assert!(service.unregister_listener(&recorder));
    assert_eq!(service.listener_count(), 1);
    transmit(&mut service, 1).unwrap();
    assert_eq!(recorder.count(), 1);

    assert!(service.unregister_listener(&recorder));
    assert!(!service.unregister_listener(&recorder));
    transmit(&mut service, 1).unwrap();
    assert_eq!(recorder.count(), 1);
}

#[test]
fn test_loopback_through_lower_layer() {
    init_logger();
    println!("\n=== 测试下层回环 ===\n");

    // 发送端
    let mut sender = TransferService::default();
    sender.connect_lower_layer(Box::new(Channel::new("loopback", 16)));
    for _ in 0..3 {
        transmit(&mut sender, 42).unwrap();
    }
    let layer = sender.disconnect_lower_layer().unwrap();
    println!("【发送端】已发送3个包");

    // 接收端
    let mut receiver = TransferService::default();
    let recorder = Rc::new(Recorder::default());
    receiver.register_listener(Some(recorder.clone()), ApidFilter::Exact(42));
    receiver.connect_lower_layer(layer);
    assert_eq!(receiver.poll_lower_layer(), 3);
    assert_eq!(receiver.poll_lower_layer(), 0);

    assert_eq!(
        *recorder.seen.borrow(),
        vec![
            (42, 0, TransferDirection::Receive),
            (42, 1, TransferDirection::Receive),
            (42, 2, TransferDirection::Receive),
        ]
    );
    assert_eq!(receiver.apid_context(42).map(|c| c.rx_count), Some(3));
    println!("✓ 接收端按序接收3个包");
}

#[test]
fn test_forwarding_disabled() {
    let config = TransferConfig::from_json_str(r#"{ "forward_to_lower_layer": false }"#).unwrap();
    let mut sender = TransferService::new(config);
    sender.connect_lower_layer(Box::new(Channel::new("unused", 4)));
    transmit(&mut sender, 1).unwrap();

    let mut receiver = TransferService::default();
    if let Some(layer) = sender.disconnect_lower_layer() {
        receiver.connect_lower_layer(layer);
    }
    assert_eq!(receiver.poll_lower_layer(), 0);
}

#[test]
fn test_lower_layer_rejection() {
    let mut service = TransferService::default();
    service.connect_lower_layer(Box::new(Channel::new("narrow", 1)));
    transmit(&mut service, 8).unwrap();

    let result = transmit(&mut service, 8);
    assert_eq!(
        result,
        Err(TransferError::LowerLayer(LayerError::Full {
            id: "narrow".to_string(),
            capacity: 1
        }))
    );
    let telemetry = service.telemetry();
    assert_eq!(telemetry.lower_layer_errors, 1);
    assert_eq!(telemetry.tx_count, 2);
}

#[test]
fn test_telemetry_json_export() {
    let mut service = TransferService::default();
    transmit(&mut service, 3).unwrap();
    service.receive_from_lower_layer(&[0x00]).unwrap_err();

    let json = service.telemetry().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tx_count"], 1);
    assert_eq!(value["rx_errors"], 1);
    assert_eq!(value["sequence_mismatches"], 0);
}

#[test]
fn test_teardown_drops_listeners() {
    let mut service = TransferService::default();
    let recorder = Rc::new(Recorder::default());
    service.register_listener_all(Some(recorder.clone()));
    service.teardown();
    transmit(&mut service, 1).unwrap();
    assert_eq!(recorder.count(), 0);
    assert_eq!(Rc::strong_count(&recorder), 1);
}
