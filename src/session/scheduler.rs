// src/session/scheduler.rs

use log::trace;
use std::{collections::HashMap, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};

/// 会话内的定时器种类，每种同一时刻最多只有一个在等待
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    ReadinessPoll,
    InitFallback,
    AutoSync,
    Reorder,
    ProgressHold,
    StatsRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub kind: TimerKind,
    generation: u64,
}

struct Slot {
    generation: u64,
    repeating: bool,
    handle: JoinHandle<()>,
}

/// 单槽定时器：新的请求会取消并替换同类的旧定时器。
///
/// 定时器到期后只往通道里发送一个 `Tick`，真正的处理由会话循环完成。
/// 已经发出但被取消的 `Tick` 通过 generation 识别并丢弃。
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Tick>,
    slots: HashMap<TimerKind, Slot>,
    next_generation: u64,
}

impl Scheduler {
    pub fn new(tx: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            tx,
            slots: HashMap::new(),
            next_generation: 0,
        }
    }

    /// `delay` 之后触发一次
    pub fn once(&mut self, kind: TimerKind, delay: Duration) {
        let tick = self.prepare(kind);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(tick);
        });
        self.insert(tick, false, handle);
    }

    /// 每隔 `period` 触发一次，直到被取消
    pub fn every(&mut self, kind: TimerKind, period: Duration) {
        let tick = self.prepare(kind);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(tick).is_err() {
                    break;
                }
            }
        });
        self.insert(tick, true, handle);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(slot) = self.slots.remove(&kind) {
            trace!("取消定时器 {:?}", kind);
            slot.handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            slot.handle.abort();
        }
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// 判断收到的 `Tick` 是否仍然有效；一次性定时器在此时释放槽位
    pub fn accept(&mut self, tick: Tick) -> bool {
        let Some(slot) = self.slots.get(&tick.kind) else {
            return false;
        };
        if slot.generation != tick.generation {
            return false;
        }
        if !slot.repeating {
            self.slots.remove(&tick.kind);
        }
        true
    }

    fn prepare(&mut self, kind: TimerKind) -> Tick {
        self.cancel(kind);
        self.next_generation += 1;
        Tick {
            kind,
            generation: self.next_generation,
        }
    }

    fn insert(&mut self, tick: Tick, repeating: bool, handle: JoinHandle<()>) {
        self.slots.insert(
            tick.kind,
            Slot {
                generation: tick.generation,
                repeating,
                handle,
            },
        );
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx);

        scheduler.once(TimerKind::Reorder, Duration::from_millis(800));
        time::sleep(Duration::from_millis(500)).await;
        scheduler.once(TimerKind::Reorder, Duration::from_millis(800));

        // 第一个定时器原本应在 800ms 触发，已被替换
        time::sleep(Duration::from_millis(400)).await;
        assert!(rx.try_recv().is_err());

        time::sleep(Duration::from_millis(500)).await;
        let tick = rx.try_recv().unwrap();
        assert_eq!(tick.kind, TimerKind::Reorder);
        assert!(scheduler.accept(tick));
        assert!(!scheduler.is_pending(TimerKind::Reorder));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx);

        scheduler.once(TimerKind::ProgressHold, Duration::from_millis(10));
        time::sleep(Duration::from_millis(20)).await;
        let stale = rx.try_recv().unwrap();

        // Tick 已经在通道里，但定时器随后被重新安排
        scheduler.once(TimerKind::ProgressHold, Duration::from_millis(2000));
        assert!(!scheduler.accept(stale));
        assert!(scheduler.is_pending(TimerKind::ProgressHold));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_timer_keeps_slot_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx);

        scheduler.every(TimerKind::StatsRefresh, Duration::from_millis(3000));
        time::sleep(Duration::from_millis(6500)).await;

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(scheduler.accept(first));
        assert!(scheduler.accept(second));

        scheduler.cancel(TimerKind::StatsRefresh);
        time::sleep(Duration::from_millis(5000)).await;
        assert!(rx.try_recv().is_err());
    }
}
