// ==========================================
// 供应排程系统 - 引擎层通知发布
// ==========================================
// 职责: 定义用户可见通知的发布 trait, 实现依赖倒置
// 说明: Engine 层定义 trait, 外层界面实现适配器
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

// ==========================================
// Notification - 用户可见通知
// ==========================================
// 对应外部界面的短时提示条 (message + 展示时长)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub duration_ms: u64,
}

impl Notification {
    pub fn new(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            message: message.into(),
            duration_ms,
        }
    }
}

// ==========================================
// 通知发布 Trait
// ==========================================

/// 通知发布者 Trait
///
/// Engine 层定义, 界面层实现; 重定位被拒、加载失败等
/// 用户可见消息统一经此通道发出
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification);
}

/// 空操作通知发布者 (无界面环境)
#[derive(Debug, Default)]
pub struct NoOpNotificationPublisher;

impl NotificationPublisher for NoOpNotificationPublisher {
    fn publish(&self, _notification: Notification) {}
}

/// 日志通知发布者: 经 tracing 输出
#[derive(Debug, Default)]
pub struct TracingNotificationPublisher;

impl NotificationPublisher for TracingNotificationPublisher {
    fn publish(&self, notification: Notification) {
        tracing::info!(
            duration_ms = notification.duration_ms,
            "用户通知: {}",
            notification.message
        );
    }
}

/// 缓冲通知发布者: 测试用, 收集全部通知供断言
#[derive(Debug, Default)]
pub struct BufferedNotificationPublisher {
    buffer: Mutex<Vec<Notification>>,
}

impl BufferedNotificationPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取走已收集的通知
    pub fn drain(&self) -> Vec<Notification> {
        match self.buffer.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl NotificationPublisher for BufferedNotificationPublisher {
    fn publish(&self, notification: Notification) {
        if let Ok(mut guard) = self.buffer.lock() {
            guard.push(notification);
        }
    }
}
