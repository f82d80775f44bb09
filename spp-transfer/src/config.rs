//! 传输服务配置

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 传输服务配置
///
/// 缺省字段取默认值，因此空JSON对象即为默认配置。
///
/// # 示例
/// ```
/// use spp_transfer::TransferConfig;
///
/// let config = TransferConfig::from_json_str(r#"{ "listener_capacity": 8 }"#).unwrap();
/// assert_eq!(config.listener_capacity, 8);
/// assert!(config.forward_to_lower_layer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// 监听者注册表容量
    pub listener_capacity: usize,
    /// 发送成功的包是否转交下层
    pub forward_to_lower_layer: bool,
}

impl TransferConfig {
    pub const DEFAULT_LISTENER_CAPACITY: usize = 1000;

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            listener_capacity: Self::DEFAULT_LISTENER_CAPACITY,
            forward_to_lower_layer: true,
        }
    }
}
