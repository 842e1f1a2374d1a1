//! 记录型 mock 连接：统计 begin/commit/rollback，记录执行过的 SQL，并可注入失败。

use crate::driver::{Connection, ExecResult, TxResource};
use crate::error::DriverError;
use crate::scan::Rows;
use crate::value::SqlValue;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Default)]
pub(crate) struct Recorder {
    pub begins: Cell<usize>,
    pub commits: Cell<usize>,
    pub rollbacks: Cell<usize>,
    /// `(sql, args)`，按执行顺序。
    pub statements: RefCell<Vec<(String, Vec<SqlValue>)>>,

    pub fail_begin: Cell<bool>,
    pub fail_commit: Cell<bool>,
    pub fail_exec: Cell<bool>,
    /// `query` 依次返回的结果；为空时返回空结果集。
    pub canned_rows: RefCell<VecDeque<Rows>>,
}

impl Recorder {
    pub fn sqls(&self) -> Vec<String> {
        self.statements
            .borrow()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn push_rows(&self, rows: Rows) {
        self.canned_rows.borrow_mut().push_back(rows);
    }

    fn record(&self, sql: &str, args: &[SqlValue]) -> Result<(), DriverError> {
        self.statements
            .borrow_mut()
            .push((sql.to_string(), args.to_vec()));
        if self.fail_exec.get() {
            return Err("mock exec failure".into());
        }
        Ok(())
    }

    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError> {
        self.record(sql, args)?;
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError> {
        self.record(sql, args)?;
        Ok(self.canned_rows.borrow_mut().pop_front().unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockConnection {
    pub recorder: Rc<Recorder>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connection for MockConnection {
    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError> {
        self.recorder.exec(sql, args)
    }

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError> {
        self.recorder.query(sql, args)
    }

    fn begin(&self) -> Result<Box<dyn TxResource>, DriverError> {
        if self.recorder.fail_begin.get() {
            return Err("mock begin failure".into());
        }
        self.recorder.begins.set(self.recorder.begins.get() + 1);
        Ok(Box::new(MockTx {
            recorder: self.recorder.clone(),
        }))
    }
}

struct MockTx {
    recorder: Rc<Recorder>,
}

impl TxResource for MockTx {
    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError> {
        self.recorder.exec(sql, args)
    }

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError> {
        self.recorder.query(sql, args)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        if self.recorder.fail_commit.get() {
            return Err("mock commit failure".into());
        }
        self.recorder.commits.set(self.recorder.commits.get() + 1);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.recorder.rollbacks.set(self.recorder.rollbacks.get() + 1);
        Ok(())
    }
}
