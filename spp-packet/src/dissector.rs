//! 全类型拆包器
//!
//! 用固定顺序的字段集合描述整个用户数据布局，一次性解码头部与所有字段。

use spp_core::{BitField, BitReader, DataField, FieldCollection, StreamFault};

use crate::packet::SpacePacket;
use crate::primary_header::PrimaryHeader;
use crate::secondary_header::SecondaryHeader;

/// Space Packet全类型拆包器
///
/// 可预先提供已解码的主头部（以及二级头），此时 `dissect` 不再从流中读取这些部分，
/// 适用于上游已通过 `PrimaryHeader::peek` 读过头部的情形。
///
/// # 示例
/// ```
/// use spp_core::{Field, FieldCollection};
/// use spp_packet::{SecondaryHeader, SpDissector};
///
/// let bytes = [0x00, 0x64, 0xC0, 0x00, 0x00, 0x01, 0x12, 0x34];
/// let fields = FieldCollection::new().with(Field::u16());
/// let mut dissector = SpDissector::new(SecondaryHeader::empty(), fields);
/// dissector.dissect_bytes(&bytes).unwrap();
/// assert_eq!(dissector.value_of(0), Some(0x1234));
/// ```
#[derive(Debug, Clone)]
pub struct SpDissector {
    primary: PrimaryHeader,
    secondary: SecondaryHeader,
    fields: FieldCollection,
    primary_provided: bool,
    secondary_provided: bool,
}

impl SpDissector {
    /// 从流中读取全部头部
    pub fn new(secondary_layout: SecondaryHeader, fields: FieldCollection) -> Self {
        Self {
            primary: PrimaryHeader::new(),
            secondary: secondary_layout,
            fields,
            primary_provided: false,
            secondary_provided: false,
        }
    }

    /// 主头部已解码，流从二级头开始
    pub fn with_primary_header(
        primary: PrimaryHeader,
        secondary_layout: SecondaryHeader,
        fields: FieldCollection,
    ) -> Self {
        Self {
            primary_provided: true,
            primary,
            ..Self::new(secondary_layout, fields)
        }
    }

    /// 主头部与二级头均已解码，流从用户数据开始
    pub fn with_headers(
        primary: PrimaryHeader,
        secondary: SecondaryHeader,
        fields: FieldCollection,
    ) -> Self {
        Self {
            primary,
            secondary,
            fields,
            primary_provided: true,
            secondary_provided: true,
        }
    }

    /// 按顺序解码未预先提供的头部和全部用户数据字段
    pub fn dissect<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        if !self.primary_provided {
            self.primary.decode(input)?;
        }
        if !self.secondary_provided {
            self.secondary.decode(input)?;
        }
        self.fields.decode(input)?;
        log::trace!(
            "dissected packet apid={:#05x} fields={}",
            self.primary.apid(),
            self.fields.len()
        );
        Ok(())
    }

    pub fn dissect_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamFault> {
        self.dissect(&mut BitReader::new(bytes))
    }

    pub fn secondary_header(&self) -> &SecondaryHeader {
        &self.secondary
    }

    pub fn fields(&self) -> &FieldCollection {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&DataField> {
        self.fields.field(index)
    }

    pub fn value_of(&self, index: usize) -> Option<u64> {
        self.fields.value_of(index)
    }
}

impl SpacePacket for SpDissector {
    fn primary_header(&self) -> &PrimaryHeader {
        &self.primary
    }

    fn secondary_header_size(&self) -> usize {
        self.secondary.size()
    }

    fn user_data_width(&self) -> usize {
        self.fields.width()
    }
}
