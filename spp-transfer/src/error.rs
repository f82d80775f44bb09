//! 传输服务错误定义

use spp_core::StreamFault;
use spp_packet::{BuildError, InvalidPacket};
use thiserror::Error;

/// 传输错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("invalid packet: {0}")]
    InvalidPacket(#[from] InvalidPacket),
    #[error("packet assembly failed: {0}")]
    Build(#[from] BuildError),
    #[error(transparent)]
    Stream(#[from] StreamFault),
    /// 收到的数据不足一个主头部
    #[error("received {len} bytes, too short for a primary header")]
    TruncatedHeader { len: usize },
    /// 收到的序列计数与期望值不符
    #[error("sequence mismatch on apid {apid:#05x}: expected {expected}, got {actual}")]
    SequenceMismatch { apid: u16, expected: u16, actual: u16 },
    #[error(transparent)]
    LowerLayer(#[from] LayerError),
}

/// 下层通信错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// 信道缓冲已满
    #[error("channel {id} is full (capacity {capacity})")]
    Full { id: String, capacity: usize },
    /// 下层不可用
    #[error("lower layer unavailable: {0}")]
    Unavailable(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse transfer configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read transfer configuration: {0}")]
    Io(#[from] std::io::Error),
}
