//! 拆包器
//!
//! 构造时解码主头部和调用方描述的二级头，用户数据以只读bit流交给调用方解释。

use spp_core::{BitField, BitReader, StreamFault};

use crate::packet::SpacePacket;
use crate::primary_header::{PrimaryHeader, PRIMARY_HEADER_SIZE};
use crate::secondary_header::SecondaryHeader;

/// Space Packet拆包器
///
/// 用户数据的长度取声明长度与缓冲区实际剩余长度中的较小者，不会越界读取。
#[derive(Debug, Clone)]
pub struct SpExtractor<'a> {
    primary: PrimaryHeader,
    secondary: SecondaryHeader,
    user_data: &'a [u8],
}

impl<'a> SpExtractor<'a> {
    /// 解析收到的包
    ///
    /// # 参数
    /// - `buffer`: 收到的包字节
    /// - `secondary_layout`: 二级头布局，无二级头时传入 `SecondaryHeader::empty()`
    ///
    /// # 返回
    /// - `Ok(SpExtractor)`: 头部解码成功
    /// - `Err(StreamFault)`: 缓冲区放不下头部
    pub fn new(buffer: &'a [u8], secondary_layout: SecondaryHeader) -> Result<Self, StreamFault> {
        let mut input = BitReader::new(buffer);
        let mut primary = PrimaryHeader::new();
        let mut secondary = secondary_layout;
        primary.decode(&mut input)?;
        secondary.decode(&mut input)?;

        let start = PRIMARY_HEADER_SIZE + secondary.size();
        let declared = (primary.length() as usize).saturating_sub(secondary.size());
        let available = buffer.len() - start;
        let user_data = &buffer[start..start + declared.min(available)];

        log::trace!(
            "extracted packet apid={:#05x} user_data={} bytes",
            primary.apid(),
            user_data.len()
        );
        Ok(Self {
            primary,
            secondary,
            user_data,
        })
    }

    pub fn secondary_header(&self) -> &SecondaryHeader {
        &self.secondary
    }

    /// 用户数据字节
    pub fn user_data(&self) -> &'a [u8] {
        self.user_data
    }

    /// 用户数据的只读bit流
    pub fn payload(&self) -> BitReader<&'a [u8]> {
        BitReader::new(self.user_data)
    }
}

impl SpacePacket for SpExtractor<'_> {
    fn primary_header(&self) -> &PrimaryHeader {
        &self.primary
    }

    fn secondary_header_size(&self) -> usize {
        self.secondary.size()
    }

    fn user_data_width(&self) -> usize {
        self.user_data.len() * 8
    }
}
