//! 可写入bit流的整数类型

/// bit流中可存取的值类型
///
/// `BITS` 是该类型的存储位数，写入或读取的宽度不得超过它。
pub trait BitValue: Copy {
    const BITS: usize;

    fn to_bits(self) -> u64;

    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_bit_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl BitValue for $t {
                const BITS: usize = <$t>::BITS as usize;

                #[inline]
                fn to_bits(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as $t
                }
            }
        )*
    };
}

impl_bit_value!(u8, u16, u32, u64, i8, i16, i32, i64);

impl BitValue for bool {
    const BITS: usize = 1;

    #[inline]
    fn to_bits(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits & 1 == 1
    }
}
