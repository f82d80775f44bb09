//! SPP Transfer Library
//!
//! Space Packet传输服务：按APID盖戳序列计数、发送前合法性检查、接收时序列校验，
//! 以及向注册监听者的扇出分发和遥测统计。

pub mod config;
pub mod context;
pub mod error;
pub mod layer;
pub mod listener;
pub mod service;
pub mod telemetry;

pub use config::TransferConfig;
pub use context::{ApidContext, ApidContextTable, APID_COUNT};
pub use error::{ConfigError, LayerError, TransferError};
pub use layer::{Channel, LowerLayer};
pub use listener::{ApidFilter, ListenerEntry, ListenerRegistry, SpListener, TransferDirection};
pub use service::TransferService;
pub use telemetry::Telemetry;
