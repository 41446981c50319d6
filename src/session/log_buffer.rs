// src/session/log_buffer.rs

use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// 客户端收到日志时的本地时间，仅用于显示
    pub timestamp: String,
    pub message: String,
}

/// 定长日志缓冲，超出容量时丢弃最旧的记录
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, message: impl Into<String>) {
        self.entries.push_back(LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_only_most_recent_entries_oldest_first() {
        let mut buffer = LogBuffer::new(100);
        for i in 0..130 {
            buffer.append(format!("line {}", i));
        }
        let messages: Vec<_> = buffer.to_vec().into_iter().map(|e| e.message).collect();
        assert_eq!(messages.len(), 100);
        assert_eq!(messages.first().unwrap(), "line 30");
        assert_eq!(messages.last().unwrap(), "line 129");
    }

    #[test]
    fn test_clear_and_timestamp_format() {
        let mut buffer = LogBuffer::new(3);
        buffer.append("开始同步");
        let entry = buffer.to_vec().remove(0);
        assert_eq!(entry.timestamp.len(), 8);
        assert_eq!(entry.timestamp.matches(':').count(), 2);

        buffer.clear();
        assert!(buffer.to_vec().is_empty());
    }
}
