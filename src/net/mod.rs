//! 仿真网络模块
//!
//! 客户端与网关之间的点对点信道、两侧的虚拟网卡，以及把它们组装起来的世界。

// 子模块声明
mod api;
mod channel;
mod deliver;
mod id;
mod link;
mod net_world;
mod proto_bridge;
mod stats;
mod vnd;

// 重新导出公共接口
pub use api::Face;
pub use channel::Channel;
pub use deliver::{DeliverData, DeliverInterest};
pub use id::Side;
pub use link::Link;
pub use net_world::TunnelWorld;
pub use proto_bridge::LinkFace;
pub(crate) use proto_bridge::{with_client, with_gateway};
pub use stats::{DeviceStats, LinkStats};
pub use vnd::VirtualNetDevice;
