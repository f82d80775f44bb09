//! 定宽字段与标志位

use super::BitField;
use crate::bitstream::{BitReader, BitWriter, WriteBuffer};
use crate::utils::bitmask;
use crate::{FieldError, StreamFault};

/// 字段的最大bit宽度
pub const MAX_FIELD_WIDTH: usize = 64;

/// 定宽整数字段
///
/// 值始终被掩码到 `width` 位以内，赋值更宽的值时直接截断。
///
/// # 示例
/// ```
/// use spp_core::Field;
///
/// let mut apid = Field::new(11);
/// apid.set_value(0xFFFF);
/// assert_eq!(apid.value(), 0x7FF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    value: u64,
    width: u8,
    little_endian: bool,
}

impl Field {
    /// 创建宽度为 `width` 的字段
    ///
    /// # Panics
    /// `width` 不在 1..=64 范围内时panic；运行期构造的布局请使用 `try_new`。
    pub const fn new(width: usize) -> Self {
        assert!(
            width >= 1 && width <= MAX_FIELD_WIDTH,
            "field width must be within 1..=64"
        );
        Self {
            value: 0,
            width: width as u8,
            little_endian: false,
        }
    }

    /// 创建宽度为 `width` 的字段，宽度非法时返回错误
    pub fn try_new(width: usize) -> Result<Self, FieldError> {
        if width == 0 || width > MAX_FIELD_WIDTH {
            return Err(FieldError::InvalidWidth { width });
        }
        Ok(Self::new(width))
    }

    pub const fn u8() -> Self {
        Self::new(8)
    }

    pub const fn u16() -> Self {
        Self::new(16)
    }

    pub const fn u32() -> Self {
        Self::new(32)
    }

    pub const fn u64() -> Self {
        Self::new(64)
    }

    /// 按小端字节序编解码（宽度须为整字节）
    pub const fn little_endian(mut self) -> Self {
        self.little_endian = true;
        self
    }

    /// 带初始值构造
    pub const fn with_value(mut self, value: u64) -> Self {
        self.value = value & bitmask(self.width as usize);
        self
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn set_value(&mut self, value: u64) {
        self.value = value & bitmask(self.width as usize);
    }

    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    /// 第 `n` 位的值，超出宽度时返回false
    pub fn get_bit(&self, n: usize) -> bool {
        n < self.width as usize && (self.value >> n) & 1 == 1
    }

    /// 设置第 `n` 位，超出宽度时忽略
    pub fn set_bit(&mut self, n: usize, bit: bool) {
        if n >= self.width as usize {
            return;
        }
        if bit {
            self.value |= 1 << n;
        } else {
            self.value &= !(1 << n);
        }
    }
}

impl BitField for Field {
    fn width(&self) -> usize {
        self.width as usize
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        out.put(self.value, self.width as usize, self.little_endian)
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        self.value = input.get::<u64>(self.width as usize, self.little_endian)?;
        Ok(())
    }
}

/// 1位标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flag {
    set: bool,
}

impl Flag {
    pub const fn new(set: bool) -> Self {
        Self { set }
    }

    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn set(&mut self) {
        self.set = true;
    }

    pub fn reset(&mut self) {
        self.set = false;
    }

    pub fn set_to(&mut self, set: bool) {
        self.set = set;
    }
}

impl BitField for Flag {
    fn width(&self) -> usize {
        1
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        out.put(self.set, 1, false)
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        self.set = input.get::<bool>(1, false)?;
        Ok(())
    }
}
