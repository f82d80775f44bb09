//! 编解码错误定义

use thiserror::Error;

/// bit流故障
///
/// 故障具有粘滞性：一旦某个流进入故障状态，后续所有读写操作都不再生效并返回
/// 同一个故障，直到重新挂接缓冲区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamFault {
    /// 流未挂接任何缓冲区
    #[error("stream is not attached to a buffer")]
    Detached,
    /// 字段宽度超过值类型的存储位数
    #[error("width of {width} bits exceeds the {capacity}-bit value type")]
    WidthExceedsType { width: usize, capacity: usize },
    /// 字段宽度超过缓冲区剩余容量
    #[error("width of {width} bits exceeds the {remaining} bits left in the buffer")]
    WidthExceedsBuffer { width: usize, remaining: usize },
    /// 小端字段的宽度不是整字节
    #[error("little-endian field of {width} bits is not a whole number of octets")]
    UnalignedLittleEndian { width: usize },
    /// 定位超出缓冲区
    #[error("bit offset {offset} lies outside the {capacity}-bit buffer")]
    SeekOutOfRange { offset: usize, capacity: usize },
}

/// 字段定义错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// 字段宽度不在 1..=64 范围内
    #[error("invalid field width: {width} (expected 1..=64)")]
    InvalidWidth { width: usize },
    /// 字段数组至少需要一个元素
    #[error("field array must contain at least one element")]
    EmptyArray,
    /// 要求整字节的字段宽度不是8的倍数
    #[error("{part} must consist of an integral number of octets, got {width} bits")]
    NotOctetAligned { part: &'static str, width: usize },
}
