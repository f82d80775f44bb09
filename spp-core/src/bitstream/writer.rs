//! bit流写入器

use super::{order_bytes, BitValue, WriteBuffer};
use crate::utils::{bitmask, octets};
use crate::StreamFault;

/// bit流写入器
///
/// 在挂接的缓冲区上按bit顺序写入字段。写入从某个字节的第0位开始时会先清零该字节。
///
/// # 示例
/// ```
/// use spp_core::BitWriter;
///
/// let mut buf = [0u8; 2];
/// let mut out = BitWriter::new(&mut buf[..]);
/// out.put(0b000u8, 3, false).unwrap();
/// out.put(true, 1, false).unwrap();
/// out.put(0x245u16, 11, false).unwrap();
/// assert_eq!(out.bit_offset(), 15);
/// assert_eq!(out.written(), &[0x14, 0x8A]);
/// ```
#[derive(Debug)]
pub struct BitWriter<B> {
    buffer: Option<B>,
    bit_offset: usize,
    fault: Option<StreamFault>,
}

impl<B: WriteBuffer> BitWriter<B> {
    /// 创建挂接到 `buffer` 的写入器
    pub fn new(buffer: B) -> Self {
        Self {
            buffer: Some(buffer),
            bit_offset: 0,
            fault: None,
        }
    }

    /// 创建未挂接缓冲区的写入器，处于故障状态直到调用 `attach`
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

    /// 写入 `value` 的低 `width` 位
    ///
    /// # 参数
    /// - `value`: 待写入的值
    /// - `width`: 写入的bit数，不得超过值类型的位数和缓冲区剩余容量
    /// - `little_endian`: 多字节字段是否按小端字节序写入
    ///
    /// # 返回
    /// - `Ok(())`: 写入成功，偏移前进 `width` 位
    /// - `Err(StreamFault)`: 写入失败，流进入粘滞故障状态
    pub fn put<T: BitValue>(
        &mut self,
        value: T,
        width: usize,
        little_endian: bool,
    ) -> Result<(), StreamFault> {
        self.check()?;
        if width == 0 {
            return Ok(());
        }
        if width > T::BITS {
            return self.raise(StreamFault::WidthExceedsType {
                width,
                capacity: T::BITS,
            });
        }
        let remaining = self.remaining_bits();
        if width > remaining {
            return self.raise(StreamFault::WidthExceedsBuffer { width, remaining });
        }
        let bits = match order_bytes(value.to_bits() & bitmask(width), width, little_endian) {
            Ok(bits) => bits,
            Err(fault) => return self.raise(fault),
        };
        self.put_unchecked(bits, width);
        Ok(())
    }

    /// 写入整字节数据
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamFault> {
        self.append_bits(bytes, bytes.len() * 8)
    }

    /// 将另一个写入器中已提交的bit追加到本流
    ///
    /// 逐字节复制，最后补上不足一个字节的剩余bit。
    /// 被追加的流未挂接缓冲区时本流进入故障状态。
    pub fn append<C: WriteBuffer>(&mut self, other: &BitWriter<C>) -> Result<(), StreamFault> {
        self.check()?;
        let Some(source) = other.buffer.as_ref() else {
            return self.raise(StreamFault::Detached);
        };
        self.append_bits(source.as_ref(), other.bit_offset)
    }

    /// 追加 `bytes` 中的前 `bit_len` 位（高位在前）
    pub fn append_bits(&mut self, bytes: &[u8], bit_len: usize) -> Result<(), StreamFault> {
        self.check()?;
        let remaining = self.remaining_bits();
        if bit_len > remaining {
            return self.raise(StreamFault::WidthExceedsBuffer {
                width: bit_len,
                remaining,
            });
        }
        if bit_len > bytes.len() * 8 {
            return self.raise(StreamFault::WidthExceedsBuffer {
                width: bit_len,
                remaining: bytes.len() * 8,
            });
        }

        let full_bytes = bit_len / 8;
        let tail_bits = bit_len % 8;
        for byte in &bytes[..full_bytes] {
            self.put_unchecked(u64::from(*byte), 8);
        }
        if tail_bits > 0 {
            // 已提交的剩余bit位于该字节的高位
            let tail = u64::from(bytes[full_bytes] >> (8 - tail_bits));
            self.put_unchecked(tail, tail_bits);
        }
        Ok(())
    }

    /// 跳过 `bits` 位而不写入，用于预留稍后回填的区域
    pub fn skip(&mut self, bits: usize) -> Result<(), StreamFault> {
        self.check()?;
        let remaining = self.remaining_bits();
        if bits > remaining {
            return self.raise(StreamFault::WidthExceedsBuffer {
                width: bits,
                remaining,
            });
        }
        self.bit_offset += bits;
        Ok(())
    }

    /// 将写入位置移动到 `bit_offset`
    pub fn seek(&mut self, bit_offset: usize) -> Result<(), StreamFault> {
        self.check()?;
        let capacity = self.capacity() * 8;
        if bit_offset > capacity {
            return self.raise(StreamFault::SeekOutOfRange {
                offset: bit_offset,
                capacity,
            });
        }
        self.bit_offset = bit_offset;
        Ok(())
    }

    /// 已写入的字节（最后一个字节可能只写了一部分）
    pub fn written(&self) -> &[u8] {
        match self.buffer.as_ref() {
            Some(buffer) => &buffer.as_ref()[..self.byte_len()],
            None => &[],
        }
    }

    /// 当前bit偏移
    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    /// 已写入的字节数（向上取整）
    pub fn byte_len(&self) -> usize {
        octets(self.bit_offset)
    }

    /// 挂接缓冲区的字节容量，未挂接时为0
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.as_ref().len())
    }

    /// 缓冲区剩余的可写bit数
    pub fn remaining_bits(&self) -> usize {
        (self.capacity() * 8).saturating_sub(self.bit_offset)
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

    fn raise(&mut self, fault: StreamFault) -> Result<(), StreamFault> {
        log::trace!("bit writer faulted at bit {}: {fault}", self.bit_offset);
        self.fault = Some(fault);
        Err(fault)
    }

    /// 写入已校验过宽度和容量的bit
    fn put_unchecked(&mut self, bits: u64, width: usize) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let bytes = buffer.as_mut();
        let mut left = width;
        while left > 0 {
            let byte_index = self.bit_offset / 8;
            let used = self.bit_offset % 8;
            let free = 8 - used;
            if used == 0 {
                bytes[byte_index] = 0;
            }

            let count = free.min(left);
            let chunk = ((bits >> (left - count)) & bitmask(count)) as u8;
            bytes[byte_index] |= chunk << (free - count);

            left -= count;
            self.bit_offset += count;
        }
    }
}
