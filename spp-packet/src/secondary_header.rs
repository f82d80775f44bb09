//! Space Packet二级头部
//!
//! 二级头由可选的时间码字段和辅助数据字段组成（粉皮书 4.1.3.2），
//! 两部分各自必须是整字节。两部分都为空时二级头不存在。

use spp_core::{
    BitField, BitReader, BitWriter, DataField, FieldCollection, FieldError, StreamFault,
    WriteBuffer,
};

/// Space Packet二级头部
///
/// # 示例
/// ```
/// use spp_core::{BitField, Field};
/// use spp_packet::SecondaryHeader;
///
/// let header = SecondaryHeader::new(Field::u32(), Field::u16()).unwrap();
/// assert_eq!(header.size(), 6);
/// assert!(SecondaryHeader::empty().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryHeader {
    time_code: DataField,
    ancillary: DataField,
}

impl Default for SecondaryHeader {
    fn default() -> Self {
        Self::empty()
    }
}

impl SecondaryHeader {
    /// 由时间码与辅助数据两部分构造二级头
    ///
    /// # 参数
    /// - `time_code`: 时间码字段，不存在时传入空的 `FieldCollection`
    /// - `ancillary`: 辅助数据字段，不存在时传入空的 `FieldCollection`
    ///
    /// # 返回
    /// - `Ok(SecondaryHeader)`: 两部分宽度均为8的倍数
    /// - `Err(FieldError::NotOctetAligned)`: 某部分不是整字节
    pub fn new(
        time_code: impl Into<DataField>,
        ancillary: impl Into<DataField>,
    ) -> Result<Self, FieldError> {
        let time_code = time_code.into();
        let ancillary = ancillary.into();
        check_octet_aligned("time code", &time_code)?;
        check_octet_aligned("ancillary data", &ancillary)?;
        Ok(Self {
            time_code,
            ancillary,
        })
    }

    /// 不存在的二级头（大小为0）
    pub fn empty() -> Self {
        Self {
            time_code: FieldCollection::new().into(),
            ancillary: FieldCollection::new().into(),
        }
    }

    /// 二级头字节数
    pub fn size(&self) -> usize {
        self.width() / 8
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    pub fn time_code(&self) -> &DataField {
        &self.time_code
    }

    pub fn time_code_mut(&mut self) -> &mut DataField {
        &mut self.time_code
    }

    pub fn ancillary(&self) -> &DataField {
        &self.ancillary
    }

    pub fn ancillary_mut(&mut self) -> &mut DataField {
        &mut self.ancillary
    }
}

fn check_octet_aligned(part: &'static str, field: &DataField) -> Result<(), FieldError> {
    let width = field.width();
    if width % 8 != 0 {
        return Err(FieldError::NotOctetAligned { part, width });
    }
    Ok(())
}

impl BitField for SecondaryHeader {
    fn width(&self) -> usize {
        self.time_code.width() + self.ancillary.width()
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        self.time_code.encode(out)?;
        self.ancillary.encode(out)
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        self.time_code.decode(input)?;
        self.ancillary.decode(input)
    }
}
