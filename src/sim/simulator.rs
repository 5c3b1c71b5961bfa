//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间、事件队列以及可取消的定时器。

use super::event::Event;
use super::scheduled_event::{EventId, ScheduledEvent};
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    // 仍在队列中且未被取消的事件
    live: HashSet<EventId>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行，返回可用于取消的句柄
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventId {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        let item = ScheduledEvent {
            at: at.max(self.now),
            seq,
            ev: Box::new(ev),
        };
        let id = item.id();
        self.live.insert(id);
        self.q.push(item);

        debug!(queue_size = self.q.len(), "事件已加入队列");
        id
    }

    /// 在当前时间之后 `delay` 调度事件
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventId {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev)
    }

    /// 取消事件。事件已执行或已取消时为无害的空操作，返回 false。
    pub fn cancel(&mut self, id: EventId) -> bool {
        let removed = self.live.remove(&id);
        trace!(?id, removed, "取消事件");
        removed
    }

    /// 事件是否仍待执行
    pub fn is_pending(&self, id: EventId) -> bool {
        self.live.contains(&id)
    }

    /// 仍待执行（未取消）的事件数
    pub fn pending_events(&self) -> usize {
        self.live.len()
    }

    /// 弹出下一个未被取消的事件
    fn pop_live(&mut self) -> Option<ScheduledEvent> {
        while let Some(item) = self.q.pop() {
            if self.live.remove(&item.id()) {
                return Some(item);
            }
            trace!(seq = item.seq, "跳过已取消事件");
        }
        None
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        loop {
            // 先丢弃队首已取消的事件，避免其时间阻挡判断
            while let Some(top) = self.q.peek() {
                if self.live.contains(&top.id()) {
                    break;
                }
                self.q.pop();
            }
            let Some(top) = self.q.peek() else {
                break;
            };
            if top.at > until {
                break;
            }
            let item = self.pop_live().expect("peek then pop");
            self.now = item.at;
            trace!(seq = item.seq, event = item.ev.label(), now = %self.now, "执行事件");
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0;
        while let Some(item) = self.pop_live() {
            event_count += 1;
            self.now = item.at;

            debug!(
                event_num = event_count,
                event = item.ev.label(),
                now = ?self.now,
                scheduled_at = ?item.at,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
