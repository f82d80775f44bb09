//! 数据字段模块
//!
//! 定宽字段、标志位、字段数组与异构字段集合，均构建在bit流之上。
//! 字段集合的成员是一个封闭的标签枚举 `DataField`，按声明顺序编解码。

pub mod array;
pub mod collection;
pub mod scalar;

pub use array::FieldArray;
pub use collection::FieldCollection;
pub use scalar::{Field, Flag, MAX_FIELD_WIDTH};

use crate::bitstream::{BitReader, BitWriter, WriteBuffer};
use crate::StreamFault;

/// 可在bit流上编解码的字段
pub trait BitField {
    /// 字段的bit宽度
    fn width(&self) -> usize;

    /// 将字段写入bit流
    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault>;

    /// 从bit流读取字段
    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault>;
}

/// 字段集合的成员
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataField {
    /// 定宽整数字段
    Value(Field),
    /// 1位标志
    Flag(Flag),
    /// 同构字段数组
    Array(FieldArray),
    /// 嵌套字段集合
    Collection(FieldCollection),
}

impl DataField {
    /// 定宽字段或标志的当前值
    pub fn value(&self) -> Option<u64> {
        match self {
            DataField::Value(field) => Some(field.value()),
            DataField::Flag(flag) => Some(u64::from(flag.is_set())),
            _ => None,
        }
    }

    /// 设置定宽字段或标志的值，成员不是标量时返回false
    pub fn set_value(&mut self, value: u64) -> bool {
        match self {
            DataField::Value(field) => field.set_value(value),
            DataField::Flag(flag) => flag.set_to(value & 1 == 1),
            _ => return false,
        }
        true
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            DataField::Value(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut Field> {
        match self {
            DataField::Value(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<&Flag> {
        match self {
            DataField::Flag(flag) => Some(flag),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&FieldArray> {
        match self {
            DataField::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut FieldArray> {
        match self {
            DataField::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&FieldCollection> {
        match self {
            DataField::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut FieldCollection> {
        match self {
            DataField::Collection(collection) => Some(collection),
            _ => None,
        }
    }
}

impl BitField for DataField {
    fn width(&self) -> usize {
        match self {
            DataField::Value(field) => field.width(),
            DataField::Flag(flag) => flag.width(),
            DataField::Array(array) => array.width(),
            DataField::Collection(collection) => collection.width(),
        }
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        match self {
            DataField::Value(field) => field.encode(out),
            DataField::Flag(flag) => flag.encode(out),
            DataField::Array(array) => array.encode(out),
            DataField::Collection(collection) => collection.encode(out),
        }
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        match self {
            DataField::Value(field) => field.decode(input),
            DataField::Flag(flag) => flag.decode(input),
            DataField::Array(array) => array.decode(input),
            DataField::Collection(collection) => collection.decode(input),
        }
    }
}

impl From<Field> for DataField {
    fn from(field: Field) -> Self {
        DataField::Value(field)
    }
}

impl From<Flag> for DataField {
    fn from(flag: Flag) -> Self {
        DataField::Flag(flag)
    }
}

impl From<FieldArray> for DataField {
    fn from(array: FieldArray) -> Self {
        DataField::Array(array)
    }
}

impl From<FieldCollection> for DataField {
    fn from(collection: FieldCollection) -> Self {
        DataField::Collection(collection)
    }
}
