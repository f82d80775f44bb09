//! SPP Packet Library
//!
//! 实现CCSDS 133.0-B Space Packet（"粉皮书"）的主/二级头部模型、包合法性判定，
//! 以及组包（SpBuilder / SpIdleBuilder）与拆包（SpExtractor / SpDissector）流程。

pub mod builder;
pub mod dissector;
pub mod error;
pub mod extractor;
pub mod packet;
pub mod primary_header;
pub mod secondary_header;

pub use builder::{IdlePattern, PayloadSink, SpBuilder, SpIdleBuilder};
pub use dissector::SpDissector;
pub use error::{BuildError, InvalidPacket};
pub use extractor::SpExtractor;
pub use packet::{
    is_valid_packet, packet_size, validate_packet, PacketAssembly, SpacePacket, MAX_PACKET_SIZE,
    MIN_PACKET_SIZE,
};
pub use primary_header::{
    PacketType, PrimaryHeader, SequenceFlags, IDLE_APID, PRIMARY_HEADER_SIZE,
    SEQUENCE_COUNT_MODULO,
};
pub use secondary_header::SecondaryHeader;
