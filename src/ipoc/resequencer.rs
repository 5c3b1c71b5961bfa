//! 通用重排序器
//!
//! 客户端用它对到达的 Data 排序，网关用它对到达的 Interest 排序。
//! 条目的序列号通过构造时注入的函数提取，因此同一实现可服务任意载荷类型。
//!
//! 出现序列号空洞时，条目进入按序列号排序的最小堆，并启动一个 gap 定时器；
//! 定时器到期后强制放行不超过该序列号的所有缓存条目，从而把丢包/乱序
//! 带来的额外时延限制在一个 `wait_for_gap` 之内。

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use serde::Serialize;
use tracing::{debug, trace};

use crate::sim::{Event, EventId, SimTime, Simulator};

/// gap 定时器的调度接口，由各端点基于仿真器实现。
pub trait GapTimers {
    /// 在 `after` 之后触发 `on_gap_timeout(seq)`
    fn arm(&mut self, after: SimTime, seq: u64) -> EventId;
    /// 取消定时器；已触发或已取消时为空操作
    fn cancel(&mut self, id: EventId);
}

/// 基于仿真器的 gap 定时器：到期时执行 `make(seq)` 构造的事件。
pub struct SimGapTimers<'a, E> {
    sim: &'a mut Simulator,
    make: fn(u64) -> E,
}

impl<'a, E: Event> SimGapTimers<'a, E> {
    pub fn new(sim: &'a mut Simulator, make: fn(u64) -> E) -> Self {
        Self { sim, make }
    }
}

impl<E: Event> GapTimers for SimGapTimers<'_, E> {
    fn arm(&mut self, after: SimTime, seq: u64) -> EventId {
        self.sim.schedule_in(after, (self.make)(seq))
    }

    fn cancel(&mut self, id: EventId) {
        self.sim.cancel(id);
    }
}

/// 已启动的 gap 定时器集合，按启动它的序列号有序。
#[derive(Debug, Default)]
pub struct ArmedGapTimers {
    set: BTreeSet<(u64, EventId)>,
}

impl ArmedGapTimers {
    pub fn insert(&mut self, seq: u64, id: EventId) {
        self.set.insert((seq, id));
    }

    /// 移除并返回所有启动序列号小于 `bound` 的定时器
    pub fn evict_below(&mut self, bound: u64) -> Vec<EventId> {
        let keep = self.set.split_off(&(bound, EventId(0)));
        let evicted = std::mem::replace(&mut self.set, keep);
        evicted.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// 最小的启动序列号
    pub fn first_seq(&self) -> Option<u64> {
        self.set.first().map(|(seq, _)| *seq)
    }
}

/// 缓存槽：按 (seq, 到达顺序) 比较。
struct Slot<T> {
    seq: u64,
    arrival: u64,
    item: T,
}

// BinaryHeap 是 max-heap；这里需要最小序列号优先，因此反向比较。
impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.seq.cmp(&other.seq) {
            Ordering::Equal => self.arrival.cmp(&other.arrival),
            ord => ord,
        }
        .reverse()
    }
}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.arrival == other.arrival
    }
}

impl<T> Eq for Slot<T> {}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ResequencerStats {
    pub submitted: u64,
    pub delivered: u64,
    pub dropped_stale: u64,
    pub buffered: u64,
    pub gap_timeouts: u64,
}

pub struct Resequencer<T> {
    seq_of: fn(&T) -> u64,
    wait_for_gap: SimTime,
    last_delivered: u64,
    delivered_any: bool,
    max_seen: u64,
    buffer: BinaryHeap<Slot<T>>,
    next_arrival: u64,
    armed: ArmedGapTimers,
    stats: ResequencerStats,
}

impl<T> Resequencer<T> {
    pub fn new(wait_for_gap: SimTime, seq_of: fn(&T) -> u64) -> Self {
        Self {
            seq_of,
            wait_for_gap,
            last_delivered: 0,
            delivered_any: false,
            max_seen: 0,
            buffer: BinaryHeap::new(),
            next_arrival: 0,
            armed: ArmedGapTimers::default(),
            stats: ResequencerStats::default(),
        }
    }

    pub fn wait_for_gap(&self) -> SimTime {
        self.wait_for_gap
    }

    pub fn last_delivered(&self) -> u64 {
        self.last_delivered
    }

    pub fn max_seen(&self) -> u64 {
        self.max_seen
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn armed_timers(&self) -> usize {
        self.armed.len()
    }

    pub fn stats(&self) -> &ResequencerStats {
        &self.stats
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.delivered_any && seq <= self.last_delivered
    }

    // 启动阶段 last_delivered == 0：seq 0 与 seq 1 都视为下一个
    fn is_next(&self, seq: u64) -> bool {
        seq == self.last_delivered.wrapping_add(1) || (!self.delivered_any && seq == 0)
    }

    fn mark_delivered(&mut self, seq: u64) {
        self.last_delivered = seq;
        self.delivered_any = true;
        self.stats.delivered += 1;
    }

    fn min_seq(&self) -> Option<u64> {
        self.buffer.peek().map(|slot| slot.seq)
    }

    /// 取出最小序列号的条目；缓存为空说明记账出错。
    fn pop_min(&mut self) -> Slot<T> {
        self.buffer.pop().expect("pop from empty resequencer buffer")
    }

    /// 从缓存中连续放行 `last_delivered + 1`，顺带丢弃已过期的重复条目
    fn drain_consecutive(&mut self, batch: &mut Vec<T>) {
        while let Some(seq) = self.min_seq() {
            if self.is_stale(seq) {
                self.pop_min();
                self.stats.dropped_stale += 1;
            } else if self.is_next(seq) {
                let slot = self.pop_min();
                self.mark_delivered(seq);
                batch.push(slot.item);
            } else {
                break;
            }
        }
    }

    fn cancel_timers_below(&mut self, bound: u64, timers: &mut dyn GapTimers) {
        for id in self.armed.evict_below(bound) {
            timers.cancel(id);
        }
    }

    /// 提交一个条目，返回现在可以按序交付的批次（可能为空）。
    pub fn submit(&mut self, item: T, timers: &mut dyn GapTimers) -> Vec<T> {
        let seq = (self.seq_of)(&item);
        self.stats.submitted += 1;

        if self.is_stale(seq) {
            trace!(seq, last_delivered = self.last_delivered, "迟到或重复，丢弃");
            self.stats.dropped_stale += 1;
            return Vec::new();
        }

        let new_max = seq > self.max_seen;
        if new_max {
            self.max_seen = seq;
        }

        if self.is_next(seq) {
            let mut batch = vec![item];
            self.mark_delivered(seq);
            if !new_max {
                self.drain_consecutive(&mut batch);
            }
            self.cancel_timers_below(self.last_delivered.saturating_add(1), timers);
            trace!(seq, delivered = batch.len(), "按序到达，直接交付");
            return batch;
        }

        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.buffer.push(Slot { seq, arrival, item });
        self.stats.buffered += 1;
        let id = timers.arm(self.wait_for_gap, seq);
        self.armed.insert(seq, id);
        debug!(
            seq,
            last_delivered = self.last_delivered,
            buffered = self.buffer.len(),
            "出现空洞，缓存并启动 gap 定时器"
        );
        Vec::new()
    }

    /// gap 定时器到期：放行所有序列号不超过 `seq` 的条目以及其后连续的条目。
    pub fn on_gap_timeout(&mut self, seq: u64, timers: &mut dyn GapTimers) -> Vec<T> {
        self.stats.gap_timeouts += 1;
        let mut batch = Vec::new();
        while let Some(min) = self.min_seq() {
            if self.is_stale(min) {
                self.pop_min();
                self.stats.dropped_stale += 1;
            } else if min <= seq || self.is_next(min) {
                let slot = self.pop_min();
                self.mark_delivered(min);
                batch.push(slot.item);
            } else {
                break;
            }
        }

        let flush_point = seq.max(self.last_delivered);
        self.cancel_timers_below(flush_point.saturating_add(1), timers);
        debug!(
            seq,
            flushed = batch.len(),
            last_delivered = self.last_delivered,
            remaining = self.buffer.len(),
            "gap 定时器到期"
        );
        batch
    }
}

impl<T> std::fmt::Debug for Resequencer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resequencer")
            .field("wait_for_gap", &self.wait_for_gap)
            .field("last_delivered", &self.last_delivered)
            .field("max_seen", &self.max_seen)
            .field("buffered", &self.buffer.len())
            .field("armed_timers", &self.armed.len())
            .finish()
    }
}
