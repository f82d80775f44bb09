//! Space Packet主头部
//!
//! 粉皮书 4.1.2 规定的48位定长主头部，按以下顺序高位在前编码：
//! version(3) / type(1) / sec_hdr_flag(1) / apid(11) / seq_flags(2) / seq_count(14) / length(16)

use std::fmt;

use serde::{Deserialize, Serialize};
use spp_core::{BitField, BitReader, BitWriter, Field, Flag, StreamFault, WriteBuffer};

/// 主头部字节数
pub const PRIMARY_HEADER_SIZE: usize = 6;

/// 空闲包APID（全1，粉皮书 4.1.2.3.4.4）
pub const IDLE_APID: u16 = 0x7FF;

/// 14位序列计数的模数
pub const SEQUENCE_COUNT_MODULO: u16 = 0x4000;

const VERSION_WIDTH: usize = 3;
const APID_WIDTH: usize = 11;
const SEQUENCE_FLAGS_WIDTH: usize = 2;
const SEQUENCE_COUNT_WIDTH: usize = 14;
const PACKET_LENGTH_WIDTH: usize = 16;

/// 包类型（粉皮书 4.1.2.3.2.3）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    /// 遥测包，类型位为0
    Telemetry,
    /// 遥控包，类型位为1
    Telecommand,
}

/// 序列标志（粉皮书 4.1.2.4.2.2）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceFlags {
    /// 00：用户数据的后续分段
    Continuation,
    /// 01：用户数据的第一个分段
    FirstSegment,
    /// 10：用户数据的最后一个分段
    LastSegment,
    /// 11：未分段的用户数据
    Unsegmented,
}

impl SequenceFlags {
    pub fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0b00 => SequenceFlags::Continuation,
            0b01 => SequenceFlags::FirstSegment,
            0b10 => SequenceFlags::LastSegment,
            _ => SequenceFlags::Unsegmented,
        }
    }

    pub fn bits(self) -> u64 {
        match self {
            SequenceFlags::Continuation => 0b00,
            SequenceFlags::FirstSegment => 0b01,
            SequenceFlags::LastSegment => 0b10,
            SequenceFlags::Unsegmented => 0b11,
        }
    }
}

/// Space Packet主头部
///
/// # 示例
/// ```
/// use spp_packet::{PacketType, PrimaryHeader, SequenceFlags};
///
/// let mut header = PrimaryHeader::new();
/// header.set_packet_type(PacketType::Telecommand);
/// header.set_apid(100);
/// header.set_sequence_flags(SequenceFlags::Unsegmented);
/// header.set_length(10);
/// assert_eq!(header.length(), 10);
/// assert_eq!(header.raw_length(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryHeader {
    version: Field,
    packet_type: Flag,
    sec_hdr_flag: Flag,
    apid: Field,
    sequence_flags: Field,
    sequence_count: Field,
    length: Field,
}

impl Default for PrimaryHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimaryHeader {
    /// 全零主头部
    pub const fn new() -> Self {
        Self {
            version: Field::new(VERSION_WIDTH),
            packet_type: Flag::new(false),
            sec_hdr_flag: Flag::new(false),
            apid: Field::new(APID_WIDTH),
            sequence_flags: Field::new(SEQUENCE_FLAGS_WIDTH),
            sequence_count: Field::new(SEQUENCE_COUNT_WIDTH),
            length: Field::new(PACKET_LENGTH_WIDTH),
        }
    }

    /// 从字节数组开头解析主头部，不足6字节时返回故障
    pub fn peek(bytes: &[u8]) -> Result<Self, StreamFault> {
        let mut header = Self::new();
        header.decode(&mut BitReader::new(bytes))?;
        Ok(header)
    }

    pub fn version(&self) -> u8 {
        self.version.value() as u8
    }

    pub fn set_version(&mut self, version: u8) {
        self.version.set_value(u64::from(version));
    }

    pub fn packet_type(&self) -> PacketType {
        if self.packet_type.is_set() {
            PacketType::Telecommand
        } else {
            PacketType::Telemetry
        }
    }

    pub fn set_packet_type(&mut self, packet_type: PacketType) {
        self.packet_type
            .set_to(packet_type == PacketType::Telecommand);
    }

    pub fn is_telemetry(&self) -> bool {
        !self.packet_type.is_set()
    }

    pub fn is_telecommand(&self) -> bool {
        self.packet_type.is_set()
    }

    /// 二级头标志（粉皮书 4.1.2.3.3.2）
    pub fn has_secondary_header(&self) -> bool {
        self.sec_hdr_flag.is_set()
    }

    pub fn set_secondary_header_flag(&mut self, present: bool) {
        self.sec_hdr_flag.set_to(present);
    }

    pub fn apid(&self) -> u16 {
        self.apid.value() as u16
    }

    /// 设置APID，超过11位的部分被截断
    pub fn set_apid(&mut self, apid: u16) {
        self.apid.set_value(u64::from(apid));
    }

    pub fn is_idle(&self) -> bool {
        self.apid() == IDLE_APID
    }

    pub fn set_idle(&mut self) {
        self.set_apid(IDLE_APID);
    }

    pub fn sequence_flags(&self) -> SequenceFlags {
        SequenceFlags::from_bits(self.sequence_flags.value())
    }

    pub fn set_sequence_flags(&mut self, flags: SequenceFlags) {
        self.sequence_flags.set_value(flags.bits());
    }

    pub fn sequence_count(&self) -> u16 {
        self.sequence_count.value() as u16
    }

    /// 设置序列计数，按14位截断
    pub fn set_sequence_count(&mut self, count: u16) {
        self.sequence_count.set_value(u64::from(count));
    }

    /// 包数据域长度（字节）
    ///
    /// 长度字段存放的是实际长度减一（粉皮书 4.1.2.5.1.2），因此返回值范围为 1..=65536。
    pub fn length(&self) -> u32 {
        self.length.value() as u32 + 1
    }

    /// 设置包数据域长度（字节），存储值为 `length - 1`
    pub fn set_length(&mut self, length: u32) {
        self.length.set_value(u64::from(length.wrapping_sub(1)));
    }

    /// 长度字段的原始存储值
    pub fn raw_length(&self) -> u16 {
        self.length.value() as u16
    }

    /// 主头部自身的合法性：空闲包不得置二级头标志
    pub fn is_valid(&self) -> bool {
        !(self.is_idle() && self.has_secondary_header())
    }
}

impl BitField for PrimaryHeader {
    fn width(&self) -> usize {
        PRIMARY_HEADER_SIZE * 8
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        self.version.encode(out)?;
        self.packet_type.encode(out)?;
        self.sec_hdr_flag.encode(out)?;
        self.apid.encode(out)?;
        self.sequence_flags.encode(out)?;
        self.sequence_count.encode(out)?;
        self.length.encode(out)
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        self.version.decode(input)?;
        self.packet_type.decode(input)?;
        self.sec_hdr_flag.decode(input)?;
        self.apid.decode(input)?;
        self.sequence_flags.decode(input)?;
        self.sequence_count.decode(input)?;
        self.length.decode(input)
    }
}

impl fmt::Display for PrimaryHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version={} type={:?} sec_hdr={} apid={:#05x} seq_flags={:?} seq_count={} length={}",
            self.version(),
            self.packet_type(),
            self.has_secondary_header(),
            self.apid(),
            self.sequence_flags(),
            self.sequence_count(),
            self.length()
        )
    }
}
