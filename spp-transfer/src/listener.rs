//! 监听者注册表
//!
//! 监听者以 `Rc<dyn SpListener>` 句柄注册，按句柄身份注销。
//! 注册表容量有限，注销时用末尾条目填补空位，不保持注册顺序。

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use spp_packet::PrimaryHeader;

/// 分发方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferDirection {
    Transmit,
    Receive,
}

/// Space Packet监听者
pub trait SpListener {
    /// 收到一个已分发的包
    ///
    /// # 参数
    /// - `header`: 包的主头部
    /// - `bytes`: 完整的包字节
    /// - `direction`: 发送或接收
    fn on_packet(&self, header: &PrimaryHeader, bytes: &[u8], direction: TransferDirection);
}

/// APID匹配条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApidFilter {
    /// 只匹配指定APID
    Exact(u16),
    /// 匹配所有APID
    MatchAll,
}

impl ApidFilter {
    pub fn matches(&self, apid: u16) -> bool {
        match self {
            ApidFilter::Exact(expected) => *expected == apid,
            ApidFilter::MatchAll => true,
        }
    }
}

/// 注册表条目
#[derive(Clone)]
pub struct ListenerEntry {
    pub listener: Rc<dyn SpListener>,
    pub filter: ApidFilter,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("listener", &Rc::as_ptr(&self.listener))
            .field("filter", &self.filter)
            .finish()
    }
}

/// 有界监听者注册表
#[derive(Debug, Clone)]
pub struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
    capacity: usize,
}

impl ListenerRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// 注册监听者
    ///
    /// # 返回
    /// - `true`: 注册成功
    /// - `false`: 注册表已满或句柄为空，注册被忽略
    pub fn register(&mut self, listener: Option<Rc<dyn SpListener>>, filter: ApidFilter) -> bool {
        let Some(listener) = listener else {
            log::debug!("ignoring registration of an absent listener");
            return false;
        };
        if self.is_full() {
            log::debug!(
                "listener registry is full ({} entries), registration ignored",
                self.capacity
            );
            return false;
        }
        self.entries.push(ListenerEntry { listener, filter });
        true
    }

    /// 按句柄身份注销第一个匹配的条目
    pub fn unregister<L: SpListener + ?Sized>(&mut self, listener: &Rc<L>) -> bool {
        let target = Rc::as_ptr(listener) as *const ();
        let position = self
            .entries
            .iter()
            .position(|entry| Rc::as_ptr(&entry.listener) as *const () == target);
        match position {
            Some(index) => {
                self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// 过滤条件与 `apid` 匹配的监听者
    pub fn matching(&self, apid: u16) -> impl Iterator<Item = &Rc<dyn SpListener>> {
        self.entries
            .iter()
            .filter(move |entry| entry.filter.matches(apid))
            .map(|entry| &entry.listener)
    }

    pub fn entries(&self) -> &[ListenerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
