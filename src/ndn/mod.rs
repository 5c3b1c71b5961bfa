//! 请求/响应网络的报文模型
//!
//! 只实现隧道需要的部分：名字、Interest、Data 以及它们的 TLV 编码。
//! 签名为不透明占位字段。

mod data;
mod interest;
mod name;

pub use data::{Data, PLACEHOLDER_SIGNATURE_TYPE};
pub use interest::{Interest, DEFAULT_INTEREST_LIFETIME};
pub use name::{Component, Name, NameError};
