//! SPP Core Library
//!
//! 提供CCSDS Space Packet协议栈的底层能力：bit级编解码流、定宽字段组合、
//! 以及缓冲区分配器等外部协作接口。

pub mod allocator;
pub mod bitstream;
pub mod error;
pub mod field;
pub mod utils;

// 导出错误类型
pub use error::{FieldError, StreamFault};

// 导出常用类型，便于上层crate使用
pub use allocator::{Allocator, HeapAllocator};
pub use bitstream::{BitReader, BitValue, BitWriter, WriteBuffer};
pub use field::{BitField, DataField, Field, FieldArray, FieldCollection, Flag, MAX_FIELD_WIDTH};
