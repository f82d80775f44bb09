//! Space Packet传输服务
//!
//! 发送：按APID盖戳序列计数 → 封包 → 合法性检查 → 分发给监听者 → 转交下层。
//! 接收：解码主头部 → 非空闲包校验序列计数 → 分发给监听者。
//! 只有成功的收发才会推进APID上下文。

use std::rc::Rc;

use spp_packet::{PacketAssembly, PrimaryHeader, PRIMARY_HEADER_SIZE};

use crate::config::TransferConfig;
use crate::context::{ApidContext, ApidContextTable};
use crate::error::TransferError;
use crate::layer::LowerLayer;
use crate::listener::{ApidFilter, ListenerRegistry, SpListener, TransferDirection};
use crate::telemetry::Telemetry;

/// Space Packet传输服务
///
/// 单线程使用，监听者句柄为 `Rc`，因此服务本身不是 `Send`。
///
/// # 示例
/// ```
/// use spp_packet::{PacketAssembly, SecondaryHeader, SpBuilder};
/// use spp_transfer::{TransferConfig, TransferService};
///
/// let mut service = TransferService::new(TransferConfig::default());
/// let mut buf = [0u8; 16];
/// let mut packet = SpBuilder::new(&mut buf[..], SecondaryHeader::empty()).unwrap();
/// packet.primary_header_mut().set_apid(100);
/// packet.data().put(0x42u8, 8, false).unwrap();
///
/// service.transmit(&mut packet).unwrap();
/// assert_eq!(service.apid_context(100).map(|c| c.next_sequence_count), Some(1));
/// assert_eq!(service.telemetry().tx_count, 1);
/// ```
pub struct TransferService {
    config: TransferConfig,
    listeners: ListenerRegistry,
    contexts: ApidContextTable,
    telemetry: Telemetry,
    lower_layer: Option<Box<dyn LowerLayer>>,
}

impl Default for TransferService {
    fn default() -> Self {
        Self::new(TransferConfig::default())
    }
}

impl TransferService {
    pub fn new(config: TransferConfig) -> Self {
        Self {
            listeners: ListenerRegistry::new(config.listener_capacity),
            contexts: ApidContextTable::new(),
            telemetry: Telemetry::default(),
            lower_layer: None,
            config,
        }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// 发送一个包
    ///
    /// # 参数
    /// - `packet`: 待发送的包，序列计数由服务盖戳，随后调用其 `finalize`
    ///
    /// # 返回
    /// - `Ok(())`: 包已分发，APID上下文已推进
    /// - `Err(TransferError)`: 封包失败或包不合法时不分发、不推进计数
    /// - `Err(TransferError::LowerLayer)`: 下层拒收。此时包已分发给监听者，
    ///   收发计数和序列计数均已推进，不会回滚；调用方不应重发同一个包，
    ///   否则监听者会收到重复的包、序列计数也会多前进一次
    pub fn transmit<P: PacketAssembly + ?Sized>(
        &mut self,
        packet: &mut P,
    ) -> Result<(), TransferError> {
        let apid = packet.primary_header().apid();
        let next = self.contexts.entry(apid).next_sequence_count;
        packet.primary_header_mut().set_sequence_count(next);

        if let Err(error) = packet.finalize() {
            self.telemetry.tx_errors += 1;
            log::warn!("apid {apid:#05x}: packet assembly failed, not transmitted: {error}");
            return Err(error.into());
        }
        if let Err(error) = packet.validate() {
            self.telemetry.tx_errors += 1;
            log::warn!("apid {apid:#05x}: invalid packet not transmitted: {error}");
            return Err(error.into());
        }

        let header = *packet.primary_header();
        self.dispatch(&header, packet.bytes(), TransferDirection::Transmit);

        let context = self.contexts.entry_mut(apid);
        context.tx_count += 1;
        context.advance_sequence();
        self.telemetry.tx_count += 1;
        if header.is_idle() {
            self.telemetry.idle_count += 1;
        }

        if !self.config.forward_to_lower_layer {
            return Ok(());
        }
        let Some(layer) = self.lower_layer.as_mut() else {
            return Ok(());
        };
        if let Err(error) = layer.send(packet.to_bytes()) {
            self.telemetry.lower_layer_errors += 1;
            log::warn!("apid {apid:#05x}: lower layer rejected packet: {error}");
            return Err(error.into());
        }
        Ok(())
    }

    /// 接收下层交来的包
    ///
    /// 只解码主头部。非空闲包的序列计数必须等于该APID的期望值，否则丢弃；
    /// 空闲包不做序列校验。
    pub fn receive_from_lower_layer(&mut self, buffer: &[u8]) -> Result<(), TransferError> {
        if buffer.len() < PRIMARY_HEADER_SIZE {
            self.telemetry.rx_errors += 1;
            log::warn!("dropping {}-byte fragment without a primary header", buffer.len());
            return Err(TransferError::TruncatedHeader { len: buffer.len() });
        }
        let header = PrimaryHeader::peek(buffer)?;
        let apid = header.apid();

        if !header.is_idle() {
            let expected = self.contexts.entry(apid).next_sequence_count;
            let actual = header.sequence_count();
            if actual != expected {
                self.telemetry.rx_errors += 1;
                self.telemetry.sequence_mismatches += 1;
                log::warn!(
                    "apid {apid:#05x}: sequence count {actual} does not match expected {expected}, packet dropped"
                );
                return Err(TransferError::SequenceMismatch {
                    apid,
                    expected,
                    actual,
                });
            }
        }

        self.dispatch(&header, buffer, TransferDirection::Receive);

        let context = self.contexts.entry_mut(apid);
        context.rx_count += 1;
        context.advance_sequence();
        self.telemetry.rx_count += 1;
        if header.is_idle() {
            self.telemetry.idle_count += 1;
        }
        Ok(())
    }

    /// 从下层取出所有待接收的包并逐个接收
    ///
    /// # 返回
    /// 被接受的包数
    pub fn poll_lower_layer(&mut self) -> usize {
        let mut accepted = 0;
        while let Some(packet) = self.lower_layer.as_mut().and_then(|layer| layer.receive()) {
            if self.receive_from_lower_layer(&packet).is_ok() {
                accepted += 1;
            }
        }
        accepted
    }

    /// 注册监听者，注册表已满或句柄为空时忽略并返回false
    pub fn register_listener(
        &mut self,
        listener: Option<Rc<dyn SpListener>>,
        filter: ApidFilter,
    ) -> bool {
        self.listeners.register(listener, filter)
    }

    /// 注册匹配所有APID的监听者
    pub fn register_listener_all(&mut self, listener: Option<Rc<dyn SpListener>>) -> bool {
        self.register_listener(listener, ApidFilter::MatchAll)
    }

    pub fn unregister_listener<L: SpListener + ?Sized>(&mut self, listener: &Rc<L>) -> bool {
        self.listeners.unregister(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// 连接下层，返回之前连接的下层
    pub fn connect_lower_layer(
        &mut self,
        layer: Box<dyn LowerLayer>,
    ) -> Option<Box<dyn LowerLayer>> {
        self.lower_layer.replace(layer)
    }

    pub fn disconnect_lower_layer(&mut self) -> Option<Box<dyn LowerLayer>> {
        self.lower_layer.take()
    }

    pub fn has_lower_layer(&self) -> bool {
        self.lower_layer.is_some()
    }

    /// APID超出11位时返回None
    pub fn apid_context(&self, apid: u16) -> Option<&ApidContext> {
        self.contexts.get(apid)
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// 清零遥测和所有APID上下文
    pub fn reset_counters(&mut self) {
        self.telemetry = Telemetry::default();
        self.contexts.reset();
    }

    /// 注销所有监听者并断开下层
    pub fn teardown(&mut self) {
        log::debug!(
            "tearing down transfer service with {} listeners",
            self.listeners.len()
        );
        self.listeners.clear();
        self.lower_layer = None;
    }

    fn dispatch(&self, header: &PrimaryHeader, bytes: &[u8], direction: TransferDirection) {
        let mut notified = 0usize;
        for listener in self.listeners.matching(header.apid()) {
            listener.on_packet(header, bytes, direction);
            notified += 1;
        }
        log::debug!(
            "{direction:?} apid={:#05x} seq={} notified={notified} [{}]",
            header.apid(),
            header.sequence_count(),
            hex::encode(bytes)
        );
    }
}
