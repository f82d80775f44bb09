//! 包错误定义

use spp_core::StreamFault;
use thiserror::Error;

/// 不满足粉皮书结构约束的包，每个变体对应一条合法性规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidPacket {
    /// 空闲包的二级头标志必须为0
    #[error("idle packet must not set the secondary header flag")]
    IdleWithSecondaryHeaderFlag,
    /// 二级头和用户数据至少存在其一
    #[error("packet has neither a secondary header nor user data")]
    EmptyDataField,
    /// 用户数据必须是整字节
    #[error("user data of {width} bits is not a whole number of octets")]
    UnalignedUserData { width: usize },
    /// 包总长度超出 [7, 65542] 字节
    #[error("packet size {size} is outside 7..=65542 bytes")]
    SizeOutOfRange { size: usize },
    /// 二级头标志与二级头实际大小不一致
    #[error("secondary header flag {flag} disagrees with a {size}-byte secondary header")]
    SecondaryHeaderFlagMismatch { flag: bool, size: usize },
    /// 空闲包不得携带二级头
    #[error("idle packet carries a {size}-byte secondary header")]
    IdleWithSecondaryHeader { size: usize },
    /// 长度字段与包数据域实际长度不一致
    #[error("declared packet data length {declared} differs from actual {actual}")]
    LengthMismatch { declared: u32, actual: usize },
}

/// 组包错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// 目标缓冲区放不下头部
    #[error("buffer of {capacity} bytes cannot hold {required} header bytes")]
    BufferTooSmall { required: usize, capacity: usize },
    /// 二级头布局在构造后发生了变化，预留区域不再匹配
    #[error("secondary header layout changed after the header region was reserved")]
    HeaderLayoutChanged,
    #[error(transparent)]
    Stream(#[from] StreamFault),
}
