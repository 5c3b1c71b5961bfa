use crate::ipoc::{ArmedGapTimers, GapTimers, Resequencer};
use crate::sim::{EventId, SimTime};

/// 只记录启动/取消的定时器
#[derive(Default)]
struct FakeTimers {
    next: u64,
    armed: Vec<(u64, EventId)>,
    cancelled: Vec<EventId>,
}

impl FakeTimers {
    fn live(&self) -> Vec<u64> {
        self.armed
            .iter()
            .filter(|(_, id)| !self.cancelled.contains(id))
            .map(|(seq, _)| *seq)
            .collect()
    }
}

impl GapTimers for FakeTimers {
    fn arm(&mut self, _after: SimTime, seq: u64) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        self.armed.push((seq, id));
        id
    }

    fn cancel(&mut self, id: EventId) {
        self.cancelled.push(id);
    }
}

fn reseq() -> Resequencer<u64> {
    Resequencer::new(SimTime::from_millis(2), |seq: &u64| *seq)
}

#[test]
fn in_order_items_are_delivered_immediately() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    for seq in 0..5 {
        assert_eq!(r.submit(seq, &mut t), vec![seq]);
    }
    assert_eq!(r.last_delivered(), 4);
    assert!(t.armed.is_empty());
}

#[test]
fn gap_is_filled_by_late_item() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    assert_eq!(r.submit(0, &mut t), vec![0]);
    assert_eq!(r.submit(1, &mut t), vec![1]);
    assert!(r.submit(3, &mut t).is_empty());
    assert_eq!(r.buffered_len(), 1);
    assert_eq!(t.live(), vec![3]);

    assert_eq!(r.submit(2, &mut t), vec![2, 3]);
    assert_eq!(r.last_delivered(), 3);
    assert_eq!(r.buffered_len(), 0);
    assert!(t.live().is_empty());
    assert_eq!(r.armed_timers(), 0);
}

#[test]
fn bootstrap_accepts_zero_or_one_first() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    assert_eq!(r.submit(1, &mut t), vec![1]);
    // 1 已交付后，0 是迟到条目
    assert!(r.submit(0, &mut t).is_empty());
    assert_eq!(r.stats().dropped_stale, 1);
}

#[test]
fn duplicates_and_late_items_are_dropped() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    r.submit(0, &mut t);
    r.submit(1, &mut t);
    assert!(r.submit(1, &mut t).is_empty());
    assert!(r.submit(0, &mut t).is_empty());
    assert_eq!(r.last_delivered(), 1);
    assert_eq!(r.stats().dropped_stale, 2);
}

#[test]
fn gap_timeout_flushes_everything_up_to_the_timed_out_seq() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    r.submit(0, &mut t);
    assert!(r.submit(3, &mut t).is_empty());
    assert!(r.submit(5, &mut t).is_empty());
    assert!(r.submit(6, &mut t).is_empty());
    assert_eq!(t.live(), vec![3, 5, 6]);

    // seq 3 的定时器到期：放行 3，4 仍缺失所以停下
    assert_eq!(r.on_gap_timeout(3, &mut t), vec![3]);
    assert_eq!(r.last_delivered(), 3);
    assert_eq!(t.live(), vec![5, 6]);

    // seq 6 的定时器到期：放行 5、6，取消 5 的定时器
    assert_eq!(r.on_gap_timeout(6, &mut t), vec![5, 6]);
    assert!(t.live().is_empty());
    assert_eq!(r.buffered_len(), 0);
}

#[test]
fn gap_timeout_also_drains_consecutive_successors() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    r.submit(0, &mut t);
    r.submit(2, &mut t);
    r.submit(3, &mut t);
    r.submit(5, &mut t);
    assert_eq!(r.on_gap_timeout(2, &mut t), vec![2, 3]);
    assert_eq!(r.last_delivered(), 3);
    assert_eq!(t.live(), vec![5]);
}

#[test]
fn stale_gap_timer_is_a_noop() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    r.submit(0, &mut t);
    r.submit(2, &mut t);
    assert_eq!(r.submit(1, &mut t), vec![1, 2]);
    assert!(r.on_gap_timeout(2, &mut t).is_empty());
    assert_eq!(r.last_delivered(), 2);
}

#[test]
fn duplicate_buffered_item_is_never_delivered_twice() {
    let mut r = reseq();
    let mut t = FakeTimers::default();
    r.submit(0, &mut t);
    r.submit(3, &mut t);
    r.submit(3, &mut t);
    assert_eq!(r.buffered_len(), 2);
    assert_eq!(r.on_gap_timeout(3, &mut t), vec![3]);
    assert_eq!(r.buffered_len(), 0);
    assert_eq!(r.stats().dropped_stale, 1);
}

#[test]
fn delivery_is_monotonic_under_arbitrary_arrival_order() {
    let arrivals = [4u64, 0, 2, 9, 1, 3, 7, 5, 6, 8, 2, 11, 10];
    let mut r = reseq();
    let mut t = FakeTimers::default();
    let mut delivered = Vec::new();
    for (i, seq) in arrivals.iter().enumerate() {
        delivered.extend(r.submit(*seq, &mut t));
        if i % 4 == 3 {
            if let Some(&(seq, _)) = t.armed.iter().find(|(_, id)| !t.cancelled.contains(id)) {
                delivered.extend(r.on_gap_timeout(seq, &mut t));
            }
        }
    }
    assert!(delivered.windows(2).all(|w| w[0] < w[1]), "{delivered:?}");
    assert_eq!(delivered.last(), Some(&11));
}

#[test]
fn armed_set_evicts_below_bound() {
    let mut armed = ArmedGapTimers::default();
    armed.insert(7, EventId(1));
    armed.insert(3, EventId(2));
    armed.insert(5, EventId(3));
    assert_eq!(armed.first_seq(), Some(3));

    let mut evicted = armed.evict_below(6);
    evicted.sort();
    assert_eq!(evicted, vec![EventId(2), EventId(3)]);
    assert_eq!(armed.len(), 1);
    assert_eq!(armed.first_seq(), Some(7));
    assert!(armed.evict_below(7).is_empty());
    assert!(!armed.is_empty());
}
