//! 组包 → 拆包集成测试
//!
//! 验证组包器生成的字节可被拆包器和全类型拆包器完整还原

use spp_core::{Field, FieldArray, FieldCollection, HeapAllocator};
use spp_packet::{
    IdlePattern, PacketAssembly, PacketType, PrimaryHeader, SecondaryHeader, SequenceFlags,
    SpBuilder, SpDissector, SpExtractor, SpIdleBuilder, SpacePacket, IDLE_APID,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn time_code_layout() -> SecondaryHeader {
    SecondaryHeader::new(Field::u32(), FieldCollection::new().with(Field::u8())).unwrap()
}

#[test]
fn test_builder_to_extractor_round_trip() {
    init_logger();
    println!("\n=== 测试组包到拆包的往返 ===\n");

    // ============================================
    // 1. 组包：遥控包，APID 100，未分段，序列计数5
    // ============================================
    println!("【组包】遥控包 APID=100 seq=5");
    let mut buf = [0u8; 64];
    let mut builder = SpBuilder::new(&mut buf[..], time_code_layout()).unwrap();
    {
        let header = builder.primary_header_mut();
        header.set_packet_type(PacketType::Telecommand);
        header.set_apid(100);
        header.set_sequence_flags(SequenceFlags::Unsegmented);
        header.set_sequence_count(5);
    }
    builder
        .secondary_header_mut()
        .time_code_mut()
        .set_value(0x6543_2100);
    builder
        .data()
        .write(&Field::u16().little_endian().with_value(0xABCD))
        .unwrap();
    builder.data().put_bytes(b"SPP").unwrap();
    builder.finalize().unwrap();

    let bytes = builder.bytes().to_vec();
    println!("  包字节: {bytes:02X?}");
    assert_eq!(bytes.len(), 6 + 5 + 5);
    assert!(builder.is_valid());
    println!("✓ 组包完成，共{}字节", bytes.len());

    // ============================================
    // 2. 拆包：头部字段与用户数据应完全一致
    // ============================================
    println!("\n【拆包】SpExtractor");
    let extractor = SpExtractor::new(&bytes, time_code_layout()).unwrap();
    let header = extractor.primary_header();
    assert_eq!(header.version(), 0);
    assert_eq!(header.packet_type(), PacketType::Telecommand);
    assert!(header.has_secondary_header());
    assert_eq!(header.apid(), 100);
    assert_eq!(header.sequence_flags(), SequenceFlags::Unsegmented);
    assert_eq!(header.sequence_count(), 5);
    assert_eq!(header.length(), 10);
    assert_eq!(
        extractor.secondary_header().time_code().value(),
        Some(0x6543_2100)
    );
    assert_eq!(extractor.user_data(), &[0xCD, 0xAB, b'S', b'P', b'P']);

    let mut payload = extractor.payload();
    let value: u16 = payload.get(16, true).unwrap();
    assert_eq!(value, 0xABCD);
    assert_eq!(payload.get_bytes(3).unwrap(), b"SPP".to_vec());
    assert!(extractor.is_valid());
    println!("✓ 头部与用户数据一致");

    // ============================================
    // 3. 全类型拆包：预先提供peek得到的主头部
    // ============================================
    println!("\n【拆包】SpDissector");
    let primary = PrimaryHeader::peek(&bytes).unwrap();
    let fields = FieldCollection::new()
        .with(Field::u16().little_endian())
        .with(FieldArray::try_new(3, Field::u8()).unwrap());
    let mut dissector = SpDissector::with_primary_header(primary, time_code_layout(), fields);
    dissector.dissect_bytes(&bytes[6..]).unwrap();
    assert_eq!(dissector.value_of(0), Some(0xABCD));
    let letters: Vec<u64> = dissector
        .field(1)
        .and_then(|f| f.as_array())
        .map(|a| a.values().collect())
        .unwrap_or_default();
    assert_eq!(letters, vec![0x53, 0x50, 0x50]);
    assert_eq!(dissector.size(), bytes.len());
    assert!(dissector.is_valid());
    println!("✓ 全部字段解码正确");
}

#[test]
fn test_idle_packet_round_trip() {
    init_logger();
    println!("\n=== 测试空闲包 ===\n");

    let mut idle =
        SpIdleBuilder::allocate(&HeapAllocator, 12, IdlePattern::new(0b1100, 4)).unwrap();
    idle.fill_remaining().unwrap();
    idle.finalize().unwrap();
    assert!(idle.is_valid());

    let extractor = SpExtractor::new(idle.bytes(), SecondaryHeader::empty()).unwrap();
    assert_eq!(extractor.primary_header().apid(), IDLE_APID);
    assert!(extractor.primary_header().is_idle());
    assert_eq!(extractor.user_data(), &[0xCC; 6]);
    assert!(extractor.is_valid());
    println!("✓ 空闲包填充正确");
}

#[test]
fn test_secondary_header_only_packet() {
    init_logger();

    let layout = SecondaryHeader::new(Field::u8().with_value(0x42), FieldCollection::new()).unwrap();
    let mut buf = [0u8; 7];
    let mut builder = SpBuilder::new(&mut buf[..], layout).unwrap();
    builder.primary_header_mut().set_apid(7);
    builder.finalize().unwrap();
    assert_eq!(builder.size(), 7);
    assert!(builder.is_valid());

    let extractor = SpExtractor::new(
        builder.bytes(),
        SecondaryHeader::new(Field::u8(), FieldCollection::new()).unwrap(),
    )
    .unwrap();
    assert!(extractor.user_data().is_empty());
    assert_eq!(extractor.secondary_header().time_code().value(), Some(0x42));
    assert!(extractor.is_valid());
}

#[test]
fn test_header_enums_serialize() {
    let json = serde_json::to_string(&SequenceFlags::FirstSegment).unwrap();
    assert_eq!(json, "\"FirstSegment\"");
    let parsed: PacketType = serde_json::from_str("\"Telemetry\"").unwrap();
    assert_eq!(parsed, PacketType::Telemetry);
}
