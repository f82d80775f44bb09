//! 工具模块
//!
//! 提供掩码、字节序转换和十六进制输出等常用工具函数

/// 生成低 `ones` 位全为1的掩码
///
/// `ones` 为0时返回0，大于等于64时返回全1。
pub const fn bitmask(ones: usize) -> u64 {
    if ones == 0 {
        0
    } else if ones >= 64 {
        u64::MAX
    } else {
        u64::MAX >> (64 - ones)
    }
}

/// 翻转 `value` 低 `nb_bytes` 个字节的字节序
pub const fn swap_bytes(value: u64, nb_bytes: usize) -> u64 {
    let mut swapped = 0u64;
    let mut i = 0;
    while i < nb_bytes && i < 8 {
        let byte = (value >> (8 * i)) & 0xFF;
        swapped |= byte << (8 * (nb_bytes - 1 - i));
        i += 1;
    }
    swapped
}

/// 容纳 `bits` 位所需的字节数
pub const fn octets(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// 将字节数组转换为十六进制字符串（字节之间以空格分隔）
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}
