//! APID上下文
//!
//! 每个11位APID值对应一个上下文，记录收发计数和下一个期望的序列计数。

use serde::Serialize;
use spp_packet::SEQUENCE_COUNT_MODULO;

/// APID取值个数（11位）
pub const APID_COUNT: usize = 2048;

/// 单个APID的收发状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApidContext {
    /// 成功发送的包数
    pub tx_count: u64,
    /// 成功接收的包数
    pub rx_count: u64,
    /// 下一个序列计数，发送时盖戳、接收时作为期望值
    pub next_sequence_count: u16,
}

impl ApidContext {
    /// 序列计数前进1，模16384回绕
    pub fn advance_sequence(&mut self) {
        self.next_sequence_count = (self.next_sequence_count + 1) % SEQUENCE_COUNT_MODULO;
    }
}

/// 全部APID的上下文表
#[derive(Debug, Clone)]
pub struct ApidContextTable {
    contexts: Vec<ApidContext>,
}

impl Default for ApidContextTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ApidContextTable {
    pub fn new() -> Self {
        Self {
            contexts: vec![ApidContext::default(); APID_COUNT],
        }
    }

    /// APID超出11位时返回None
    pub fn get(&self, apid: u16) -> Option<&ApidContext> {
        self.contexts.get(usize::from(apid))
    }

    pub fn get_mut(&mut self, apid: u16) -> Option<&mut ApidContext> {
        self.contexts.get_mut(usize::from(apid))
    }

    /// 按APID低11位取上下文
    pub fn entry(&self, apid: u16) -> &ApidContext {
        &self.contexts[usize::from(apid) % APID_COUNT]
    }

    pub fn entry_mut(&mut self, apid: u16) -> &mut ApidContext {
        &mut self.contexts[usize::from(apid) % APID_COUNT]
    }

    pub fn reset(&mut self) {
        self.contexts.fill(ApidContext::default());
    }
}
