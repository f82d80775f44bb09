//! bit流读取器

use super::{order_bytes, BitValue};
use crate::utils::{bitmask, octets};
use crate::StreamFault;

/// bit流读取器
///
/// 与 `BitWriter` 对称，从挂接的缓冲区按bit顺序读取字段，从不修改缓冲区。
///
/// # 示例
/// ```
/// use spp_core::BitReader;
///
/// // CCSDS Space Packet主头部前两个字节
/// let frame = [0x0A, 0x45];
/// let mut input = BitReader::new(&frame[..]);
/// let version: u8 = input.get(3, false).unwrap();
/// let packet_type: bool = input.get(1, false).unwrap();
/// let sec_hdr_flag: bool = input.get(1, false).unwrap();
/// let apid: u16 = input.get(11, false).unwrap();
/// assert_eq!((version, packet_type, sec_hdr_flag, apid), (0, false, true, 0x245));
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<B> {
    buffer: Option<B>,
    bit_offset: usize,
    fault: Option<StreamFault>,
}

impl<B: AsRef<[u8]>> BitReader<B> {
    /// 创建挂接到 `buffer` 的读取器
    pub fn new(buffer: B) -> Self {
        Self {
            buffer: Some(buffer),
            bit_offset: 0,
            fault: None,
        }
    }

    /// 创建未挂接缓冲区的读取器，处于故障状态直到调用 `attach`
    pub fn detached() -> Self {
        Self {
            buffer: None,
            bit_offset: 0,
            fault: Some(StreamFault::Detached),
        }
    }

    /// 挂接新的缓冲区，偏移归零并清除故障，返回之前挂接的缓冲区
    pub fn attach(&mut self, buffer: B) -> Option<B> {
        self.bit_offset = 0;
        self.fault = None;
        self.buffer.replace(buffer)
    }

    /// 读取 `width` 位并转换为 `T`
    ///
    /// # 参数
    /// - `width`: 读取的bit数，不得超过 `T` 的位数和缓冲区剩余bit数
    /// - `little_endian`: 多字节字段是否按小端字节序解释
    ///
    /// # 返回
    /// - `Ok(T)`: 读取的值，偏移前进 `width` 位
    /// - `Err(StreamFault)`: 读取失败，流进入粘滞故障状态
    pub fn get<T: BitValue>(&mut self, width: usize, little_endian: bool) -> Result<T, StreamFault> {
        self.check()?;
        if width == 0 {
            return Ok(T::from_bits(0));
        }
        if width > T::BITS {
            return Err(self.raise(StreamFault::WidthExceedsType {
                width,
                capacity: T::BITS,
            }));
        }
        let remaining = self.remaining_bits();
        if width > remaining {
            return Err(self.raise(StreamFault::WidthExceedsBuffer { width, remaining }));
        }

        let start = self.bit_offset;
        let bits = self.get_unchecked(width);
        let bits = order_bytes(bits, width, little_endian).map_err(|fault| {
            self.bit_offset = start;
            self.raise(fault)
        })?;
        Ok(T::from_bits(bits))
    }

    /// 读取 `len` 个整字节
    pub fn get_bytes(&mut self, len: usize) -> Result<Vec<u8>, StreamFault> {
        self.check()?;
        let remaining = self.remaining_bits();
        match len.checked_mul(8) {
            Some(width) if width <= remaining => {}
            width => {
                return Err(self.raise(StreamFault::WidthExceedsBuffer {
                    width: width.unwrap_or(usize::MAX),
                    remaining,
                }))
            }
        }
        Ok((0..len).map(|_| self.get_unchecked(8) as u8).collect())
    }

    /// 跳过 `bits` 位
    pub fn skip(&mut self, bits: usize) -> Result<(), StreamFault> {
        self.check()?;
        let remaining = self.remaining_bits();
        if bits > remaining {
            return Err(self.raise(StreamFault::WidthExceedsBuffer {
                width: bits,
                remaining,
            }));
        }
        self.bit_offset += bits;
        Ok(())
    }

    /// 当前bit偏移
    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    /// 已读取的字节数（向上取整）
    pub fn byte_len(&self) -> usize {
        octets(self.bit_offset)
    }

    /// 挂接缓冲区的字节容量，未挂接时为0
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.as_ref().len())
    }

    /// 缓冲区剩余的可读bit数
    pub fn remaining_bits(&self) -> usize {
        (self.capacity() * 8).saturating_sub(self.bit_offset)
    }

    /// 从下一个整字节开始的剩余数据
    pub fn remaining_bytes(&self) -> &[u8] {
        match self.buffer.as_ref() {
            Some(buffer) => {
                let bytes = buffer.as_ref();
                &bytes[self.byte_len().min(bytes.len())..]
            }
            None => &[],
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fault(&self) -> Option<StreamFault> {
        self.fault
    }

    /// 取回挂接的缓冲区
    pub fn into_inner(self) -> Option<B> {
        self.buffer
    }

    fn check(&self) -> Result<(), StreamFault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn raise(&mut self, fault: StreamFault) -> StreamFault {
        log::trace!("bit reader faulted at bit {}: {fault}", self.bit_offset);
        self.fault = Some(fault);
        fault
    }

    /// 读取已校验过宽度和容量的bit
    fn get_unchecked(&mut self, width: usize) -> u64 {
        let Some(buffer) = self.buffer.as_ref() else {
            return 0;
        };
        let bytes = buffer.as_ref();
        let mut bits = 0u64;
        let mut left = width;
        while left > 0 {
            let byte_index = self.bit_offset / 8;
            let available = 8 - self.bit_offset % 8;
            let count = available.min(left);
            let chunk = u64::from(bytes[byte_index] >> (available - count)) & bitmask(count);
            bits = (bits << count) | chunk;

            left -= count;
            self.bit_offset += count;
        }
        bits
    }
}
