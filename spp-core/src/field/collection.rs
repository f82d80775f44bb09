//! 异构字段集合

use super::{BitField, DataField};
use crate::bitstream::{BitReader, BitWriter, WriteBuffer};
use crate::StreamFault;

/// 按声明顺序排列的异构字段集合
///
/// 允许为空（宽度为0），用于表示不存在的二级头部分。
///
/// # 示例
/// ```
/// use spp_core::{BitField, Field, FieldCollection, Flag};
///
/// let content = FieldCollection::new()
///     .with(Field::u32().with_value(0xBDDDDDDB))
///     .with(Flag::new(true))
///     .with(Field::new(7));
/// assert_eq!(content.width(), 40);
/// assert_eq!(content.value_of(0), Some(0xBDDDDDDB));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldCollection {
    members: Vec<DataField>,
}

impl FieldCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加成员（构造器风格）
    pub fn with(mut self, member: impl Into<DataField>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn push(&mut self, member: impl Into<DataField>) {
        self.members.push(member.into());
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&DataField> {
        self.members.get(index)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut DataField> {
        self.members.get_mut(index)
    }

    /// 第 `index` 个标量成员的值
    pub fn value_of(&self, index: usize) -> Option<u64> {
        self.members.get(index).and_then(DataField::value)
    }

    /// 设置第 `index` 个标量成员的值，越界或成员不是标量时返回false
    pub fn set_value_of(&mut self, index: usize, value: u64) -> bool {
        self.members
            .get_mut(index)
            .is_some_and(|member| member.set_value(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataField> {
        self.members.iter()
    }
}

impl BitField for FieldCollection {
    fn width(&self) -> usize {
        self.members.iter().map(BitField::width).sum()
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        self.members.iter().try_for_each(|member| member.encode(out))
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        self.members
            .iter_mut()
            .try_for_each(|member| member.decode(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, FieldArray, Flag};

    #[test]
    fn test_empty_collection() {
        let empty = FieldCollection::new();
        assert_eq!(empty.width(), 0);
        assert!(empty.is_empty());

        let mut buf = [0u8; 1];
        let mut out = BitWriter::new(&mut buf[..]);
        empty.encode(&mut out).unwrap();
        assert_eq!(out.bit_offset(), 0);
    }

    #[test]
    fn test_nested_collection_round_trip() {
        let inner = FieldCollection::new()
            .with(Field::new(3).with_value(0b101))
            .with(Flag::new(true));
        let mut array = FieldArray::try_new(2, Field::new(6)).unwrap();
        array.fill_from(&[0x3F, 0x01]);
        let outer = FieldCollection::new()
            .with(Field::u8().with_value(0x7E))
            .with(inner)
            .with(array);
        assert_eq!(outer.width(), 8 + 4 + 12);

        let mut buf = [0u8; 3];
        let mut out = BitWriter::new(&mut buf[..]);
        outer.encode(&mut out).unwrap();
        // 0111_1110 | 101 1 | 111111 000001
        assert_eq!(out.written(), &[0x7E, 0xBF, 0xC1]);

        let mut decoded = FieldCollection::new()
            .with(Field::u8())
            .with(FieldCollection::new().with(Field::new(3)).with(Flag::default()))
            .with(FieldArray::try_new(2, Field::new(6)).unwrap());
        decoded.decode(&mut BitReader::new(&buf[..])).unwrap();
        assert_eq!(decoded, outer);
    }

    #[test]
    fn test_value_accessors() {
        let mut collection = FieldCollection::new()
            .with(Field::new(4))
            .with(Flag::default())
            .with(FieldArray::try_new(1, Field::u8()).unwrap());

        assert!(collection.set_value_of(0, 0x1F));
        assert_eq!(collection.value_of(0), Some(0xF));
        assert!(collection.set_value_of(1, 1));
        assert_eq!(collection.value_of(1), Some(1));
        assert!(!collection.set_value_of(2, 1));
        assert!(!collection.set_value_of(9, 1));
        assert!(collection.field(2).and_then(DataField::as_array).is_some());
    }

    #[test]
    fn test_decode_short_buffer_faults() {
        let mut collection = FieldCollection::new().with(Field::u16()).with(Field::u16());
        let data = [0x01, 0x02, 0x03];
        let mut input = BitReader::new(&data[..]);
        assert!(collection.decode(&mut input).is_err());
        assert!(input.is_faulted());
        assert_eq!(collection.value_of(0), Some(0x0102));
    }
}
