//! 缓冲区分配器
//!
//! 为需要自有输出空间的组包器提供可插拔的分配策略。

use bytes::BytesMut;

/// 缓冲区分配器接口
pub trait Allocator {
    /// 分配 `nb_bytes` 字节的清零缓冲区
    fn allocate(&self, nb_bytes: usize) -> BytesMut;

    /// 归还缓冲区
    fn deallocate(&self, bytes: BytesMut) {
        drop(bytes);
    }
}

/// 基于通用堆分配的默认分配器
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn allocate(&self, nb_bytes: usize) -> BytesMut {
        BytesMut::zeroed(nb_bytes)
    }
}
