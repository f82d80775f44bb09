//! 组包器
//!
//! 采用“预留-填充-回填”流程：构造时在缓冲区开头预留主头部与二级头的位置，
//! 用户数据从预留区之后顺序写入，`finalize` 时根据实际内容计算长度并回填头部。

use bytes::BytesMut;
use spp_core::utils::{bytes_to_hex, octets};
use spp_core::{
    Allocator, BitField, BitValue, BitWriter, FieldError, StreamFault, WriteBuffer,
    MAX_FIELD_WIDTH,
};

use crate::error::BuildError;
use crate::packet::{PacketAssembly, SpacePacket};
use crate::primary_header::{PrimaryHeader, PRIMARY_HEADER_SIZE};
use crate::secondary_header::SecondaryHeader;

/// Space Packet组包器
///
/// # 示例
/// ```
/// use spp_packet::{PacketAssembly, PacketType, SecondaryHeader, SpBuilder, SpacePacket};
///
/// let mut buf = [0u8; 16];
/// let mut builder = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
/// builder.primary_header_mut().set_packet_type(PacketType::Telecommand);
/// builder.primary_header_mut().set_apid(100);
/// builder.data().put(0xCAFEu16, 16, false).unwrap();
/// builder.finalize().unwrap();
/// assert!(builder.is_valid());
/// assert_eq!(builder.bytes(), &[0x10, 0x64, 0x00, 0x00, 0x00, 0x01, 0xCA, 0xFE]);
/// ```
#[derive(Debug)]
pub struct SpBuilder<B> {
    primary: PrimaryHeader,
    secondary: SecondaryHeader,
    header_width: usize,
    writer: BitWriter<B>,
}

impl<B: WriteBuffer> SpBuilder<B> {
    /// 在调用方提供的缓冲区上创建组包器
    ///
    /// # 参数
    /// - `buffer`: 目标缓冲区，至少容纳主头部与二级头
    /// - `secondary`: 二级头布局，`SecondaryHeader::empty()` 表示无二级头
    ///
    /// # 返回
    /// - `Ok(SpBuilder)`: 头部区域已预留，写入位置位于用户数据起点
    /// - `Err(BuildError::BufferTooSmall)`: 缓冲区放不下头部
    pub fn new(buffer: B, secondary: SecondaryHeader) -> Result<Self, BuildError> {
        let header_width = PRIMARY_HEADER_SIZE * 8 + secondary.width();
        let mut writer = BitWriter::new(buffer);
        let capacity = writer.capacity();
        if capacity * 8 < header_width {
            return Err(BuildError::BufferTooSmall {
                required: header_width / 8,
                capacity,
            });
        }
        writer.skip(header_width)?;

        Ok(Self {
            primary: PrimaryHeader::new(),
            secondary,
            header_width,
            writer,
        })
    }

    /// 用户数据写入口，只能从预留区之后向前写
    pub fn data(&mut self) -> PayloadSink<'_, B> {
        PayloadSink {
            writer: &mut self.writer,
            start: self.header_width,
        }
    }

    /// 用户数据区的字节容量
    pub fn payload_capacity(&self) -> usize {
        self.writer.capacity() - self.header_width / 8
    }

    pub fn secondary_header(&self) -> &SecondaryHeader {
        &self.secondary
    }

    /// 修改二级头字段值；布局宽度必须保持不变，否则 `finalize` 失败
    pub fn secondary_header_mut(&mut self) -> &mut SecondaryHeader {
        &mut self.secondary
    }

    /// 回填头部
    ///
    /// 二级头标志取决于二级头是否非空，长度取二级头与已写用户数据的实际大小。
    /// 回填后写入位置恢复到用户数据末尾，可继续写入后再次调用。
    pub fn finalize(&mut self) -> Result<(), BuildError> {
        if PRIMARY_HEADER_SIZE * 8 + self.secondary.width() != self.header_width {
            return Err(BuildError::HeaderLayoutChanged);
        }

        let end = self.writer.bit_offset();
        let user_width = end - self.header_width;
        self.primary
            .set_secondary_header_flag(!self.secondary.is_empty());
        self.primary
            .set_length((self.secondary.size() + octets(user_width)) as u32);

        self.writer.seek(0)?;
        self.primary.encode(&mut self.writer)?;
        self.secondary.encode(&mut self.writer)?;
        self.writer.seek(end)?;

        log::trace!(
            "finalized packet apid={:#05x} size={} [{}]",
            self.primary.apid(),
            self.size(),
            bytes_to_hex(self.writer.written())
        );
        Ok(())
    }

    /// 已组好的包字节，`finalize` 之前头部内容无意义
    pub fn bytes(&self) -> &[u8] {
        self.writer.written()
    }

    /// 取回缓冲区
    pub fn into_inner(self) -> Option<B> {
        self.writer.into_inner()
    }
}

impl SpBuilder<BytesMut> {
    /// 通过分配器获取 `capacity` 字节的缓冲区并创建组包器
    pub fn allocate(
        allocator: &dyn Allocator,
        capacity: usize,
        secondary: SecondaryHeader,
    ) -> Result<Self, BuildError> {
        Self::new(allocator.allocate(capacity), secondary)
    }
}

impl<B: WriteBuffer> SpacePacket for SpBuilder<B> {
    fn primary_header(&self) -> &PrimaryHeader {
        &self.primary
    }

    fn secondary_header_size(&self) -> usize {
        self.secondary.size()
    }

    fn user_data_width(&self) -> usize {
        self.writer.bit_offset().saturating_sub(self.header_width)
    }
}

impl<B: WriteBuffer> PacketAssembly for SpBuilder<B> {
    fn primary_header_mut(&mut self) -> &mut PrimaryHeader {
        &mut self.primary
    }

    fn finalize(&mut self) -> Result<(), BuildError> {
        SpBuilder::finalize(self)
    }

    fn bytes(&self) -> &[u8] {
        SpBuilder::bytes(self)
    }
}

/// 用户数据写入口
///
/// 只暴露顺序写操作，无法回退到头部区域。
#[derive(Debug)]
pub struct PayloadSink<'a, B> {
    writer: &'a mut BitWriter<B>,
    start: usize,
}

impl<B: WriteBuffer> PayloadSink<'_, B> {
    pub fn put<T: BitValue>(
        &mut self,
        value: T,
        width: usize,
        little_endian: bool,
    ) -> Result<(), StreamFault> {
        self.writer.put(value, width, little_endian)
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamFault> {
        self.writer.put_bytes(bytes)
    }

    /// 写入一个字段（或字段集合）
    pub fn write<F: BitField>(&mut self, field: &F) -> Result<(), StreamFault> {
        field.encode(&mut *self.writer)
    }

    pub fn append<C: WriteBuffer>(&mut self, other: &BitWriter<C>) -> Result<(), StreamFault> {
        self.writer.append(other)
    }

    pub fn append_bits(&mut self, bytes: &[u8], bit_len: usize) -> Result<(), StreamFault> {
        self.writer.append_bits(bytes, bit_len)
    }

    /// 已写入的用户数据bit数
    pub fn bit_offset(&self) -> usize {
        self.writer.bit_offset() - self.start
    }

    pub fn remaining_bits(&self) -> usize {
        self.writer.remaining_bits()
    }
}

/// 空闲包填充图样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePattern {
    value: u64,
    width: u8,
}

impl IdlePattern {
    /// # Panics
    /// `width` 不在 1..=64 范围内时panic
    pub const fn new(value: u64, width: usize) -> Self {
        assert!(
            width >= 1 && width <= MAX_FIELD_WIDTH,
            "idle pattern width must be within 1..=64"
        );
        Self {
            value: value & spp_core::utils::bitmask(width),
            width: width as u8,
        }
    }

    pub fn try_new(value: u64, width: usize) -> Result<Self, FieldError> {
        if width == 0 || width > MAX_FIELD_WIDTH {
            return Err(FieldError::InvalidWidth { width });
        }
        Ok(Self::new(value, width))
    }

    /// 单字节图样
    pub const fn octet(value: u8) -> Self {
        Self::new(value as u64, 8)
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }
}

/// 空闲包组包器
///
/// APID固定为空闲值，不带二级头，用户数据由重复的填充图样构成。
/// 区域大小不是图样宽度的整数倍时，最后一次重复只保留图样的高位部分。
#[derive(Debug)]
pub struct SpIdleBuilder<B> {
    inner: SpBuilder<B>,
    pattern: IdlePattern,
}

impl<B: WriteBuffer> SpIdleBuilder<B> {
    pub fn new(buffer: B, pattern: IdlePattern) -> Result<Self, BuildError> {
        let mut inner = SpBuilder::new(buffer, SecondaryHeader::empty())?;
        inner.primary.set_idle();
        Ok(Self { inner, pattern })
    }

    pub fn pattern(&self) -> IdlePattern {
        self.pattern
    }

    /// 追加 `nb_bytes` 字节的填充数据
    pub fn fill_idle_data(&mut self, nb_bytes: usize) -> Result<(), BuildError> {
        let remaining = self.inner.writer.remaining_bits();
        let bits = match nb_bytes.checked_mul(8) {
            Some(bits) if bits <= remaining => bits,
            bits => {
                return Err(StreamFault::WidthExceedsBuffer {
                    width: bits.unwrap_or(usize::MAX),
                    remaining,
                }
                .into())
            }
        };

        let width = self.pattern.width();
        let value = self.pattern.value();
        let mut sink = self.inner.data();
        for _ in 0..bits / width {
            sink.put(value, width, false)?;
        }
        let tail = bits % width;
        if tail > 0 {
            sink.put(value >> (width - tail), tail, false)?;
        }
        Ok(())
    }

    /// 用填充数据写满缓冲区剩余部分
    pub fn fill_remaining(&mut self) -> Result<(), BuildError> {
        self.fill_idle_data(self.inner.writer.remaining_bits() / 8)
    }

    /// 回填头部，APID重新强制为空闲值
    pub fn finalize(&mut self) -> Result<(), BuildError> {
        self.inner.primary.set_idle();
        self.inner.finalize()
    }

    pub fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }

    pub fn into_inner(self) -> Option<B> {
        self.inner.into_inner()
    }
}

impl SpIdleBuilder<BytesMut> {
    pub fn allocate(
        allocator: &dyn Allocator,
        capacity: usize,
        pattern: IdlePattern,
    ) -> Result<Self, BuildError> {
        Self::new(allocator.allocate(capacity), pattern)
    }
}

impl<B: WriteBuffer> SpacePacket for SpIdleBuilder<B> {
    fn primary_header(&self) -> &PrimaryHeader {
        self.inner.primary_header()
    }

    fn secondary_header_size(&self) -> usize {
        0
    }

    fn user_data_width(&self) -> usize {
        self.inner.user_data_width()
    }
}

impl<B: WriteBuffer> PacketAssembly for SpIdleBuilder<B> {
    fn primary_header_mut(&mut self) -> &mut PrimaryHeader {
        &mut self.inner.primary
    }

    fn finalize(&mut self) -> Result<(), BuildError> {
        SpIdleBuilder::finalize(self)
    }

    fn bytes(&self) -> &[u8] {
        SpIdleBuilder::bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidPacket;
    use crate::primary_header::{SequenceFlags, IDLE_APID};
    use spp_core::{Field, FieldCollection, HeapAllocator};

    #[test]
    fn test_buffer_too_small() {
        let mut buf = [0u8; 5];
        let result = SpBuilder::new(&mut buf[..], SecondaryHeader::empty());
        assert_eq!(
            result.err(),
            Some(BuildError::BufferTooSmall {
                required: 6,
                capacity: 5
            })
        );

        let mut buf = [0u8; 7];
        let secondary = SecondaryHeader::new(Field::u16(), FieldCollection::new()).unwrap();
        assert!(SpBuilder::new(&mut buf[..], secondary).is_err());
    }

    #[test]
    fn test_finalize_backfills_headers() {
        let mut buf = [0xAAu8; 16];
        let secondary = SecondaryHeader::new(Field::u16(), FieldCollection::new()).unwrap();
        let mut builder = SpBuilder::new(&mut buf[..], secondary).unwrap();
        builder.primary_header_mut().set_apid(0x245);
        builder
            .primary_header_mut()
            .set_sequence_flags(SequenceFlags::Unsegmented);
        builder.primary_header_mut().set_sequence_count(0x1234);
        builder.secondary_header_mut().time_code_mut().set_value(0xBEEF);
        builder.data().put_bytes(&[0x01, 0x02]).unwrap();
        builder.finalize().unwrap();

        assert_eq!(builder.size(), 10);
        assert_eq!(builder.validate(), Ok(()));
        assert_eq!(
            builder.bytes(),
            &[0x0A, 0x45, 0xD2, 0x34, 0x00, 0x03, 0xBE, 0xEF, 0x01, 0x02]
        );
    }

    #[test]
    fn test_refinalize_after_more_payload() {
        let mut buf = [0u8; 16];
        let mut builder = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
        builder.data().put(0x11u8, 8, false).unwrap();
        builder.finalize().unwrap();
        assert_eq!(builder.primary_header().length(), 1);

        builder.data().put(0x2233u16, 16, false).unwrap();
        builder.finalize().unwrap();
        assert_eq!(builder.primary_header().length(), 3);
        assert_eq!(&builder.bytes()[6..], &[0x11, 0x22, 0x33]);
        assert_eq!(builder.data().bit_offset(), 24);
    }

    #[test]
    fn test_header_layout_change_is_rejected() {
        let mut buf = [0u8; 16];
        let secondary = SecondaryHeader::new(Field::u8(), FieldCollection::new()).unwrap();
        let mut builder = SpBuilder::new(&mut buf[..], secondary).unwrap();
        *builder.secondary_header_mut() = SecondaryHeader::empty();
        assert_eq!(builder.finalize(), Err(BuildError::HeaderLayoutChanged));
    }

    #[test]
    fn test_unaligned_payload_is_invalid() {
        let mut buf = [0u8; 8];
        let mut builder = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
        builder.data().put(0b101u8, 3, false).unwrap();
        builder.finalize().unwrap();
        assert_eq!(
            builder.validate(),
            Err(InvalidPacket::UnalignedUserData { width: 3 })
        );
    }

    #[test]
    fn test_payload_overrun_faults() {
        let mut buf = [0u8; 7];
        let mut builder = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
        assert_eq!(builder.payload_capacity(), 1);
        assert!(builder.data().put(0u16, 16, false).is_err());
        assert!(builder.finalize().is_err());
    }

    #[test]
    fn test_allocate() {
        let mut builder =
            SpBuilder::allocate(&HeapAllocator, 32, SecondaryHeader::empty()).unwrap();
        builder.data().write(&Field::u32().with_value(7)).unwrap();
        builder.finalize().unwrap();
        assert!(builder.is_valid());
        assert_eq!(builder.into_inner().map(|b| b.len()), Some(32));
    }

    #[test]
    fn test_idle_pattern() {
        assert!(IdlePattern::try_new(0, 0).is_err());
        assert!(IdlePattern::try_new(0, 65).is_err());
        assert_eq!(IdlePattern::new(0x1FF, 4).value(), 0xF);
        assert_eq!(IdlePattern::octet(0x55).width(), 8);
    }

    #[test]
    fn test_idle_fill_with_truncated_repetition() {
        let mut buf = [0u8; 16];
        let mut idle = SpIdleBuilder::new(&mut buf[..], IdlePattern::new(0b101, 3)).unwrap();
        idle.fill_idle_data(2).unwrap();
        idle.finalize().unwrap();

        // 101 101 101 101 101 1
        assert_eq!(&idle.bytes()[6..], &[0xB6, 0xDB]);
        assert!(idle.primary_header().is_idle());
        assert!(idle.is_valid());
    }

    #[test]
    fn test_idle_fill_remaining() {
        let mut buf = [0u8; 10];
        let mut idle =
            SpIdleBuilder::new(&mut buf[..], IdlePattern::new(0xC0FFEE, 24)).unwrap();
        idle.fill_remaining().unwrap();
        idle.finalize().unwrap();

        assert_eq!(idle.size(), 10);
        assert_eq!(&idle.bytes()[6..], &[0xC0, 0xFF, 0xEE, 0xC0]);
        assert_eq!(idle.primary_header().length(), 4);
    }

    #[test]
    fn test_idle_finalize_forces_idle_apid() {
        let mut buf = [0u8; 8];
        let mut idle = SpIdleBuilder::new(&mut buf[..], IdlePattern::octet(0xFF)).unwrap();
        idle.primary_header_mut().set_apid(5);
        idle.fill_remaining().unwrap();
        PacketAssembly::finalize(&mut idle).unwrap();
        assert_eq!(idle.primary_header().apid(), IDLE_APID);
        assert!(!idle.primary_header().has_secondary_header());
    }

    #[test]
    fn test_idle_fill_overrun() {
        let mut buf = [0u8; 8];
        let mut idle = SpIdleBuilder::new(&mut buf[..], IdlePattern::octet(0xFF)).unwrap();
        assert!(idle.fill_idle_data(3).is_err());
        assert_eq!(idle.user_data_width(), 0);
    }

    #[test]
    fn test_idle_fill_huge_count() {
        let mut buf = [0u8; 8];
        let mut idle = SpIdleBuilder::new(&mut buf[..], IdlePattern::octet(0xFF)).unwrap();
        assert_eq!(
            idle.fill_idle_data(usize::MAX / 4),
            Err(BuildError::Stream(StreamFault::WidthExceedsBuffer {
                width: usize::MAX,
                remaining: 16
            }))
        );
        assert_eq!(idle.user_data_width(), 0);
        idle.fill_remaining().unwrap();
        assert_eq!(idle.user_data_width(), 16);
    }
}
