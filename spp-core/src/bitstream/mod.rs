//! bit流模块
//!
//! 在调用方持有的字节区域上进行bit粒度的读写，支持跨字节、非字节对齐的字段。
//! 默认采用高位在前（MSB first）的位序与字节序。

pub mod reader;
pub mod value;
pub mod writer;

pub use reader::BitReader;
pub use value::BitValue;
pub use writer::BitWriter;

/// 可写缓冲区
///
/// 同时可读可写的连续字节区域，例如 `&mut [u8]`、`Vec<u8>` 或 `bytes::BytesMut`。
pub trait WriteBuffer: AsRef<[u8]> + AsMut<[u8]> {}

impl<T: AsRef<[u8]> + AsMut<[u8]> + ?Sized> WriteBuffer for T {}

/// 按字段的字节序规则转换值
///
/// 单字节及以下的字段不受影响；多字节小端字段必须是整字节宽度。
pub(crate) fn order_bytes(
    bits: u64,
    width: usize,
    little_endian: bool,
) -> Result<u64, crate::StreamFault> {
    if !little_endian || width <= 8 {
        return Ok(bits);
    }
    if width % 8 != 0 {
        return Err(crate::StreamFault::UnalignedLittleEndian { width });
    }
    Ok(crate::utils::swap_bytes(bits, width / 8))
}
