//! 网关侧待决请求表（CIT）
//!
//! 每个客户端地址一个条目：按到达顺序保存尚未应答的 Interest 记录，
//! 以及尚未发出的 IP 包缓冲区。

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use tracing::debug;

use crate::ndn::Name;
use crate::sim::EventId;

/// 一个尚未应答的 Interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestRecord {
    seq: u64,
    timeout: Option<EventId>,
}

impl InterestRecord {
    pub fn new(seq: u64) -> Self {
        Self { seq, timeout: None }
    }

    pub fn with_timeout(mut self, id: EventId) -> Self {
        self.timeout = Some(id);
        self
    }

    /// Interest 名字中携带的段号
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn timeout(&self) -> Option<EventId> {
        self.timeout
    }
}

/// 单个客户端地址的条目
#[derive(Debug)]
pub struct CitEntry {
    client_addr: Name,
    records: VecDeque<InterestRecord>,
    ip_buf: VecDeque<Bytes>,
    buffered_bytes: u64,
    next_seq: u64,
    min: usize,
    max: usize,
}

impl CitEntry {
    pub fn new(client_addr: Name, min: usize, max: usize) -> Self {
        Self {
            client_addr,
            records: VecDeque::new(),
            ip_buf: VecDeque::new(),
            buffered_bytes: 0,
            next_seq: 0,
            min,
            max,
        }
    }

    pub fn client_addr(&self) -> &Name {
        &self.client_addr
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// 待决 Interest 记录数
    pub fn pending(&self) -> usize {
        self.records.len()
    }

    pub fn push_record(&mut self, record: InterestRecord) {
        self.records.push_back(record);
    }

    pub fn peek_record(&self) -> Option<&InterestRecord> {
        self.records.front()
    }

    /// 弹出最早的记录。队列为空说明调用方记账出错。
    pub fn pop_record(&mut self) -> InterestRecord {
        self.records
            .pop_front()
            .expect("pop from empty pending-interest queue")
    }

    pub fn push_ip_packet(&mut self, pkt: Bytes) {
        self.buffered_bytes = self.buffered_bytes.saturating_add(pkt.len() as u64);
        self.ip_buf.push_back(pkt);
    }

    pub fn is_ip_buffer_empty(&self) -> bool {
        self.ip_buf.is_empty()
    }

    pub fn ip_buffer_len(&self) -> usize {
        self.ip_buf.len()
    }

    pub fn ip_buffer_bytes(&self) -> u64 {
        self.buffered_bytes
    }

    /// 按先进先出顺序查看缓冲的 IP 包
    pub fn buffered_packets(&self) -> impl Iterator<Item = &Bytes> + '_ {
        self.ip_buf.iter()
    }

    /// 取出最多 `n` 个缓冲的 IP 包
    pub fn take_ip_packets(&mut self, n: usize) -> Vec<Bytes> {
        let n = n.min(self.ip_buf.len());
        let pkts: Vec<Bytes> = self.ip_buf.drain(..n).collect();
        let taken: u64 = pkts.iter().map(|p| p.len() as u64).sum();
        self.buffered_bytes = self.buffered_bytes.saturating_sub(taken);
        debug!(taken = pkts.len(), left = self.ip_buf.len(), "取出缓冲 IP 包");
        pkts
    }

    /// 分配下一个响应序列号（每次发送响应恰好调用一次）
    pub fn next_sequence_number(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }
}

/// 客户端地址 -> 条目
#[derive(Debug)]
pub struct Cit {
    entries: HashMap<Name, CitEntry>,
    min: usize,
    max: usize,
}

impl Cit {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            entries: HashMap::new(),
            min,
            max,
        }
    }

    /// 查找或创建条目；对同一地址总是返回同一个条目。
    pub fn find_or_insert(&mut self, client_addr: &Name) -> &mut CitEntry {
        let (min, max) = (self.min, self.max);
        self.entries.entry(client_addr.clone()).or_insert_with(|| {
            debug!(client_addr = %client_addr, "新建 CIT 条目");
            CitEntry::new(client_addr.clone(), min, max)
        })
    }

    pub fn get(&self, client_addr: &Name) -> Option<&CitEntry> {
        self.entries.get(client_addr)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CitEntry> + '_ {
        self.entries.values()
    }
}
