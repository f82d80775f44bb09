//! 同构字段数组

use super::{BitField, Field};
use crate::bitstream::{BitReader, BitWriter, WriteBuffer};
use crate::{FieldError, StreamFault};

/// N个相同定义的字段首尾相接，总宽度为 N·W
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArray {
    elements: Vec<Field>,
}

impl FieldArray {
    /// 以 `element` 为元素模板创建长度为 `len` 的数组
    pub fn try_new(len: usize, element: Field) -> Result<Self, FieldError> {
        if len == 0 {
            return Err(FieldError::EmptyArray);
        }
        Ok(Self {
            elements: vec![element; len],
        })
    }

    /// 依次用 `values` 初始化元素，多余的值被忽略
    pub fn fill_from(&mut self, values: &[u64]) {
        for (element, value) in self.elements.iter_mut().zip(values) {
            element.set_value(*value);
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<u64> {
        self.elements.get(index).map(Field::value)
    }

    /// 设置第 `index` 个元素，越界时返回false
    pub fn set_value(&mut self, index: usize, value: u64) -> bool {
        match self.elements.get_mut(index) {
            Some(element) => {
                element.set_value(value);
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.elements.iter().map(Field::value)
    }
}

impl BitField for FieldArray {
    fn width(&self) -> usize {
        self.elements.iter().map(Field::width).sum()
    }

    fn encode<B: WriteBuffer>(&self, out: &mut BitWriter<B>) -> Result<(), StreamFault> {
        self.elements.iter().try_for_each(|element| element.encode(out))
    }

    fn decode<B: AsRef<[u8]>>(&mut self, input: &mut BitReader<B>) -> Result<(), StreamFault> {
        self.elements
            .iter_mut()
            .try_for_each(|element| element.decode(input))
    }
}
