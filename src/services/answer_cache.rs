//! 标准答案缓存 - 业务能力层
//!
//! 进程内、带 TTL 的键值缓存：题目文本 → 已生成的标准答案。
//! - 键为去空白、小写后的题目文本
//! - 过期条目在下次查询时惰性删除，不做后台清理
//! - 可选容量上限，超出时淘汰最久未使用的条目
//! - 时钟可注入，测试里不需要真的等待

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tracing::debug;

use crate::models::question_key;

/// 默认 TTL：24 小时
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// 时间前进
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += ChronoDuration::from_std(by).unwrap_or(ChronoDuration::zero());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// 答案存储接口
pub trait AnswerStore: Send + Sync {
    /// 读取未过期的答案
    fn get(&self, question: &str) -> Option<String>;
    /// 写入答案（覆盖旧值）
    fn put(&self, question: &str, answer: &str);
}

/// 缓存条目，写入后不再修改，只整体替换
#[derive(Debug)]
struct CacheEntry {
    value: String,
    timestamp: DateTime<Utc>,
    /// 最近一次访问的序号，用于 LRU 淘汰
    last_used: AtomicU64,
}

/// 带 TTL 的答案缓存
pub struct AnswerCache<C: Clock = SystemClock> {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: Option<usize>,
    clock: C,
    tick: AtomicU64,
}

impl AnswerCache<SystemClock> {
    /// 默认 24 小时 TTL、不限容量
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_TTL, None, SystemClock)
    }
}

impl Default for AnswerCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> AnswerCache<C> {
    pub fn with_clock(ttl: Duration, capacity: Option<usize>, clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.filter(|c| *c > 0),
            clock,
            tick: AtomicU64::new(0),
        }
    }

    /// 当前条目数（含尚未惰性删除的过期条目）
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // 时钟回拨时视为未过期
        now.signed_duration_since(timestamp)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.ttl)
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 容量已满时淘汰：先清过期条目，仍然满则淘汰最久未使用的
    fn evict_if_full(&self, entries: &mut HashMap<String, CacheEntry>, incoming: &str) {
        let Some(capacity) = self.capacity else {
            return;
        };
        if entries.len() < capacity || entries.contains_key(incoming) {
            return;
        }

        let now = self.clock.now();
        entries.retain(|_, entry| !self.is_expired(entry.timestamp, now));

        while entries.len() >= capacity {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            match lru_key {
                Some(key) => {
                    debug!("缓存已满，淘汰: {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<C: Clock> AnswerStore for AnswerCache<C> {
    fn get(&self, question: &str) -> Option<String> {
        let key = question_key(question);
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            let entry = entries.get(&key)?;
            if !self.is_expired(entry.timestamp, now) {
                entry.last_used.store(self.next_tick(), Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }

        // 过期：拿写锁后再确认一次，避免删掉并发写入的新值
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries
            .get(&key)
            .is_some_and(|entry| self.is_expired(entry.timestamp, now))
        {
            debug!("缓存过期，删除: {}", key);
            entries.remove(&key);
        }
        None
    }

    fn put(&self, question: &str, answer: &str) {
        let key = question_key(question);
        let entry = CacheEntry {
            value: answer.to_string(),
            timestamp: self.clock.now(),
            last_used: AtomicU64::new(self.next_tick()),
        };

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.evict_if_full(&mut entries, &key);
        entries.insert(key, entry);
    }
}
