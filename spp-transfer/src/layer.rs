//! 下层通信接口
//!
//! 传输服务把发送成功的包交给下层，并可从下层取回待接收的包。
//! `Channel` 是基于有界队列的下层实现，可用于回环和仿真。

use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::LayerError;

/// 下层通信接口
pub trait LowerLayer {
    /// 发送一个已组好并通过合法性检查的包
    fn send(&mut self, packet: Bytes) -> Result<(), LayerError>;

    /// 取出一个待接收的包，没有时返回None
    fn receive(&mut self) -> Option<Bytes> {
        None
    }
}

/// 有界队列信道
#[derive(Debug, Clone)]
pub struct Channel {
    id: String,
    buffer: VecDeque<Bytes>,
    capacity: usize,
}

impl Channel {
    pub fn new(id: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            buffer: VecDeque::new(),
            capacity,
        }
    }

    pub fn peek(&self) -> Option<&Bytes> {
        self.buffer.front()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// 获取信道ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 获取信道容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl LowerLayer for Channel {
    fn send(&mut self, packet: Bytes) -> Result<(), LayerError> {
        if self.buffer.len() >= self.capacity {
            return Err(LayerError::Full {
                id: self.id.clone(),
                capacity: self.capacity,
            });
        }
        self.buffer.push_back(packet);
        Ok(())
    }

    fn receive(&mut self) -> Option<Bytes> {
        self.buffer.pop_front()
    }
}
