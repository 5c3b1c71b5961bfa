//! 世界 trait
//!
//! 事件执行时通过它访问业务状态（例如隧道两端与信道）。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：事件按具体类型向下转换后再操作。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// 每执行完一个事件调用一次
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
