//! 事件 trait
//!
//! 报文到达、定时器到期、流量注入都以事件形式调度。

use super::simulator::Simulator;
use super::world::World;

/// 可被调度执行的事件。使用 `self: Box<Self>` 以便执行时取走所有权。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);

    /// 日志中使用的事件名
    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
