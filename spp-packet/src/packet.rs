//! 包尺寸与合法性判定
//!
//! 所有包形态（组包器、提取器、解析器）共享同一套尺寸计算和合法性规则，
//! 规则顺序与粉皮书 4.1 的结构约束一致，判定时返回第一条不满足的规则。

use bytes::Bytes;
use spp_core::utils::octets;

use crate::error::{BuildError, InvalidPacket};
use crate::primary_header::{PrimaryHeader, PRIMARY_HEADER_SIZE};

/// 最小合法包长度（字节）：主头部加至少一个字节的包数据域
pub const MIN_PACKET_SIZE: usize = PRIMARY_HEADER_SIZE + 1;

/// 最大合法包长度（字节）：主头部加65536字节的包数据域
pub const MAX_PACKET_SIZE: usize = PRIMARY_HEADER_SIZE + 65536;

/// 计算包的总字节数
///
/// # 参数
/// - `secondary_header_size`: 二级头字节数
/// - `user_data_width`: 用户数据bit宽度，按字节向上取整
pub fn packet_size(secondary_header_size: usize, user_data_width: usize) -> usize {
    PRIMARY_HEADER_SIZE + secondary_header_size + octets(user_data_width)
}

/// 按顺序检查全部合法性规则
///
/// # 参数
/// - `primary`: 主头部
/// - `secondary_header_size`: 二级头字节数
/// - `user_data_width`: 用户数据bit宽度
///
/// # 返回
/// - `Ok(())`: 所有规则均满足
/// - `Err(InvalidPacket)`: 第一条不满足的规则
pub fn validate_packet(
    primary: &PrimaryHeader,
    secondary_header_size: usize,
    user_data_width: usize,
) -> Result<(), InvalidPacket> {
    if !primary.is_valid() {
        return Err(InvalidPacket::IdleWithSecondaryHeaderFlag);
    }
    if secondary_header_size == 0 && user_data_width == 0 {
        return Err(InvalidPacket::EmptyDataField);
    }
    if user_data_width % 8 != 0 {
        return Err(InvalidPacket::UnalignedUserData {
            width: user_data_width,
        });
    }
    let size = packet_size(secondary_header_size, user_data_width);
    if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&size) {
        return Err(InvalidPacket::SizeOutOfRange { size });
    }
    let flag = primary.has_secondary_header();
    if flag != (secondary_header_size > 0) {
        return Err(InvalidPacket::SecondaryHeaderFlagMismatch {
            flag,
            size: secondary_header_size,
        });
    }
    if primary.is_idle() && secondary_header_size > 0 {
        return Err(InvalidPacket::IdleWithSecondaryHeader {
            size: secondary_header_size,
        });
    }
    let actual = secondary_header_size + user_data_width / 8;
    if primary.length() as usize != actual {
        return Err(InvalidPacket::LengthMismatch {
            declared: primary.length(),
            actual,
        });
    }
    Ok(())
}

/// 合法性谓词
pub fn is_valid_packet(
    primary: &PrimaryHeader,
    secondary_header_size: usize,
    user_data_width: usize,
) -> bool {
    validate_packet(primary, secondary_header_size, user_data_width).is_ok()
}

/// 包的尺寸与合法性能力
pub trait SpacePacket {
    fn primary_header(&self) -> &PrimaryHeader;

    /// 二级头字节数
    fn secondary_header_size(&self) -> usize;

    /// 用户数据bit宽度
    fn user_data_width(&self) -> usize;

    /// 包总字节数
    fn size(&self) -> usize {
        packet_size(self.secondary_header_size(), self.user_data_width())
    }

    fn validate(&self) -> Result<(), InvalidPacket> {
        validate_packet(
            self.primary_header(),
            self.secondary_header_size(),
            self.user_data_width(),
        )
    }

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// 可由传输服务盖戳、封包并发送的包
pub trait PacketAssembly: SpacePacket {
    fn primary_header_mut(&mut self) -> &mut PrimaryHeader;

    /// 回填头部，使长度与二级头标志反映当前内容
    fn finalize(&mut self) -> Result<(), BuildError>;

    /// 已组好的包字节
    fn bytes(&self) -> &[u8];

    /// 复制为独立的 `Bytes`，用于交给下层
    fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.bytes())
    }
}
