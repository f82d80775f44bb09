//! 传输遥测

use serde::{Deserialize, Serialize};

/// 传输服务的全局计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telemetry {
    /// 成功发送的包数
    pub tx_count: u64,
    /// 因组包失败或不合法而被拒绝发送的包数
    pub tx_errors: u64,
    /// 成功接收的包数
    pub rx_count: u64,
    /// 被丢弃的接收包数（头部截断或序列不符）
    pub rx_errors: u64,
    /// 收发方向上分发的空闲包数
    pub idle_count: u64,
    /// 序列计数不符的接收包数
    pub sequence_mismatches: u64,
    /// 下层拒收的包数
    pub lower_layer_errors: u64,
}

impl Telemetry {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
