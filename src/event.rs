//! 事件接收器与提交后回调登记表。
//!
//! 登记表属于外层事务，由它派生的内层句柄共享；接收器只声明是否接受回调。

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

/// 提交后回调。
pub type Callback = Box<dyn FnOnce()>;

/// 只追加的回调列表。
#[derive(Default)]
pub struct CommitCallbacks {
    callbacks: RefCell<Vec<Callback>>,
}

impl CommitCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }

    pub fn add(&self, cb: Callback) {
        self.callbacks.borrow_mut().push(cb);
    }

    /// 按登记顺序执行并清空。
    pub fn run(&self) {
        // 先取出再执行，回调里再次登记不会借用冲突
        let callbacks = std::mem::take(&mut *self.callbacks.borrow_mut());
        for cb in callbacks {
            cb();
        }
    }

    /// 回滚时丢弃。
    pub fn discard(&self) {
        self.callbacks.borrow_mut().clear();
    }
}

impl fmt::Debug for CommitCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitCallbacks")
            .field("len", &self.len())
            .finish()
    }
}

/// 会话与事务的事件通道。
pub trait EventReceiver {
    fn event(&self, name: &str);

    fn event_err(&self, name: &str, err: &dyn std::error::Error);

    fn timing(&self, name: &str, elapsed: Duration);

    /// 是否允许在事务上登记提交后回调。
    fn accepts_commit_callbacks(&self) -> bool {
        false
    }
}

/// 什么都不做，也不接受回调。
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventReceiver;

impl EventReceiver for NullEventReceiver {
    fn event(&self, _name: &str) {}

    fn event_err(&self, _name: &str, _err: &dyn std::error::Error) {}

    fn timing(&self, _name: &str, _elapsed: Duration) {}
}

/// 默认接收器：事件写入 `tracing`，接受提交后回调。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventReceiver;

impl TracingEventReceiver {
    pub fn new() -> Self {
        Self
    }
}

impl EventReceiver for TracingEventReceiver {
    fn event(&self, name: &str) {
        tracing::debug!(target: "dbx.event", event = name);
    }

    fn event_err(&self, name: &str, err: &dyn std::error::Error) {
        tracing::error!(target: "dbx.event", event = name, error = %err);
    }

    fn timing(&self, name: &str, elapsed: Duration) {
        tracing::trace!(target: "dbx.event", event = name, elapsed_us = elapsed.as_micros() as u64);
    }

    fn accepts_commit_callbacks(&self) -> bool {
        true
    }
}
