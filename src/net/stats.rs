//! 统计信息
//!
//! 定义链路与虚拟网卡的统计数据结构。

use serde::Serialize;

/// 单向链路统计
#[derive(Debug, Default, Clone, Serialize)]
pub struct LinkStats {
    pub sent_msgs: u64,
    pub sent_bytes: u64,
    pub dropped_msgs: u64,
}

/// 虚拟网卡向上交付的统计
#[derive(Debug, Default, Clone, Serialize)]
pub struct DeviceStats {
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
}
