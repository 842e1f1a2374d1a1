//! 会话与嵌套事务。
//!
//! `Session::begin` 打开真实事务并返回外层 `Tx`；在任意 `Tx` 上再 `begin` 只得到共享同一资源的
//! 内层 `Tx`。只有外层可以提交、回滚，内层的 commit/rollback 都是空操作。
//!
//! 所有句柄都基于 `Rc`/`RefCell`，不是 `Send`：一棵事务树只能由一个线程驱动。

use crate::cte::WithClause;
use crate::dialect::Dialect;
use crate::driver::{Connection, ExecResult, TxResource};
use crate::error::{DbError, DbResult};
use crate::event::{CommitCallbacks, EventReceiver, TracingEventReceiver};
use crate::flavor::Flavor;
use crate::modifiers::{Arg, FlattenIntoArgs};
use crate::builder::expr;
use crate::scan::Rows;
use crate::stmt::{DeleteStmt, InsertStmt, Runner, SelectStmt, Target, UpdateStmt};
use crate::string_builder::{IntoStrings, collect_into_strings};
use crate::union::UnionStmt;
use crate::value::SqlValue;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxStatus {
    Open,
    Committed,
    RolledBack,
}

/// 外层事务持有的真实资源与提交后回调，内层事务只共享引用。
pub(crate) struct TxState {
    resource: RefCell<Option<Box<dyn TxResource>>>,
    status: Cell<TxStatus>,
    callbacks: CommitCallbacks,
}

impl TxState {
    fn new(resource: Box<dyn TxResource>) -> Self {
        Self {
            resource: RefCell::new(Some(resource)),
            status: Cell::new(TxStatus::Open),
            callbacks: CommitCallbacks::new(),
        }
    }

    fn is_open(&self) -> bool {
        self.status.get() == TxStatus::Open
    }

    pub(crate) fn exec(&self, sql: &str, args: &[SqlValue]) -> DbResult<ExecResult> {
        let slot = self.resource.borrow();
        let res = slot.as_ref().ok_or(DbError::TxDone)?;
        res.exec(sql, args).map_err(DbError::DriverExec)
    }

    pub(crate) fn query(&self, sql: &str, args: &[SqlValue]) -> DbResult<Rows> {
        let slot = self.resource.borrow();
        let res = slot.as_ref().ok_or(DbError::TxDone)?;
        res.query(sql, args).map_err(DbError::DriverExec)
    }
}

/// 句柄自身的执行通道与待消费的 WITH 列表。
#[doc(hidden)]
pub struct Scope {
    runner: Runner,
    pending_with: RefCell<WithClause>,
}

impl Scope {
    fn new(runner: Runner) -> Self {
        Self {
            runner,
            pending_with: RefCell::new(WithClause::new()),
        }
    }

    fn take_with(&self) -> WithClause {
        std::mem::take(&mut *self.pending_with.borrow_mut())
    }
}

/// 构建语句、开启（嵌套）事务的能力；`Session` 与 `Tx` 都实现它。
pub trait Dml {
    #[doc(hidden)]
    fn scope(&self) -> &Scope;

    /// 在 Session 上打开真实事务；在 Tx 上返回内层事务。
    fn begin(&self) -> DbResult<Tx>;

    fn dialect(&self) -> &dyn Dialect {
        self.scope().runner.dialect()
    }

    /// 声明一个 CTE，由紧随其后的 `select`/`update` 消费。
    fn with(&self, name: &str, query: impl Into<Arg>) -> &Self
    where
        Self: Sized,
    {
        self.scope().pending_with.borrow_mut().push(name, query);
        self
    }

    fn select(&self, cols: impl IntoStrings) -> SelectStmt
    where
        Self: Sized,
    {
        let scope = self.scope();
        SelectStmt::new(scope.runner.clone(), scope.take_with(), collect_into_strings(cols))
    }

    fn update(&self, table: impl Into<String>) -> UpdateStmt
    where
        Self: Sized,
    {
        let scope = self.scope();
        UpdateStmt::new(scope.runner.clone(), scope.take_with(), table.into())
    }

    /// 未被消费的 WITH 列表会被丢弃。
    fn insert_into(&self, table: impl Into<String>) -> InsertStmt
    where
        Self: Sized,
    {
        let scope = self.scope();
        scope.take_with();
        InsertStmt::new(scope.runner.clone(), table.into())
    }

    /// 未被消费的 WITH 列表会被丢弃。
    fn delete_from(&self, table: impl Into<String>) -> DeleteStmt
    where
        Self: Sized,
    {
        let scope = self.scope();
        scope.take_with();
        DeleteStmt::new(scope.runner.clone(), table.into())
    }

    fn union(&self, builders: impl FlattenIntoArgs) -> UnionStmt
    where
        Self: Sized,
    {
        UnionStmt::new(self.scope().runner.clone(), false, builders)
    }

    fn union_all(&self, builders: impl FlattenIntoArgs) -> UnionStmt
    where
        Self: Sized,
    {
        UnionStmt::new(self.scope().runner.clone(), true, builders)
    }

    /// 执行 `?` 风格的原始 SQL。
    fn exec(&self, sql: &str, values: impl FlattenIntoArgs) -> DbResult<ExecResult>
    where
        Self: Sized,
    {
        self.scope().runner.exec_builder(expr(sql, values).as_ref())
    }

    fn query(&self, sql: &str, values: impl FlattenIntoArgs) -> DbResult<Rows>
    where
        Self: Sized,
    {
        self.scope().runner.query_builder(expr(sql, values).as_ref())
    }
}

/// 绑定到一个连接的根句柄。
pub struct Session {
    conn: Rc<dyn Connection>,
    scope: Scope,
}

/// Session 的配置入口。
pub struct SessionBuilder {
    conn: Rc<dyn Connection>,
    dialect: Rc<dyn Dialect>,
    events: Rc<dyn EventReceiver>,
}

impl SessionBuilder {
    /// 默认 `Flavor::default()`（MySQL）。
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Rc::new(dialect);
        self
    }

    /// 默认 `TracingEventReceiver`，它接受提交后回调。
    pub fn event_receiver(mut self, events: impl EventReceiver + 'static) -> Self {
        self.events = Rc::new(events);
        self
    }

    pub fn build(self) -> Session {
        let runner = Runner {
            target: Target::Conn(self.conn.clone()),
            dialect: self.dialect,
            events: self.events,
        };
        Session {
            conn: self.conn,
            scope: Scope::new(runner),
        }
    }
}

impl Session {
    pub fn builder(conn: impl Connection + 'static) -> SessionBuilder {
        SessionBuilder {
            conn: Rc::new(conn),
            dialect: Rc::new(Flavor::default()),
            events: Rc::new(TracingEventReceiver::new()),
        }
    }

    /// 使用默认配置。
    pub fn new(conn: impl Connection + 'static) -> Self {
        Self::builder(conn).build()
    }

    pub fn event_receiver(&self) -> &dyn EventReceiver {
        self.scope.runner.events.as_ref()
    }
}

impl Dml for Session {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn begin(&self) -> DbResult<Tx> {
        let events = self.scope.runner.events.clone();
        let resource = self.conn.begin().map_err(|e| {
            events.event_err("dbx.begin", &*e);
            DbError::TransactionStart(e)
        })?;
        tracing::debug!(target: "dbx.tx", role = "outer", "begin");
        events.event("dbx.begin");

        let state = Rc::new(TxState::new(resource));
        Ok(Tx::new(TxRole::Outer, state, &self.scope.runner))
    }
}

/// 事务角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxRole {
    /// 持有真实事务，拥有提交/回滚权。
    Outer,
    /// 共享外层资源的别名，提交/回滚都是空操作。
    Inner,
}

/// 事务句柄。外层句柄 drop 时若尚未提交会自动回滚。
pub struct Tx {
    role: TxRole,
    state: Rc<TxState>,
    scope: Scope,
}

impl Tx {
    fn new(role: TxRole, state: Rc<TxState>, parent: &Runner) -> Self {
        let runner = Runner {
            target: Target::Tx(state.clone()),
            dialect: parent.dialect.clone(),
            events: parent.events.clone(),
        };
        Self {
            role,
            state,
            scope: Scope::new(runner),
        }
    }

    pub fn role(&self) -> TxRole {
        self.role
    }

    pub fn is_outer(&self) -> bool {
        self.role == TxRole::Outer
    }

    fn events(&self) -> &dyn EventReceiver {
        self.scope.runner.events.as_ref()
    }

    /// 外层：真实提交，成功后按登记顺序执行提交后回调。失败时资源保留，
    /// 之后仍可 `rollback_unless_committed`。内层：空操作。
    pub fn commit(&self) -> DbResult<()> {
        if self.role == TxRole::Inner {
            return Ok(());
        }

        {
            let mut slot = self.state.resource.borrow_mut();
            let res = slot.as_mut().ok_or(DbError::TxDone)?;
            if let Err(e) = res.commit() {
                self.events().event_err("dbx.commit", &*e);
                return Err(DbError::DriverExec(e));
            }
            *slot = None;
        }
        self.state.status.set(TxStatus::Committed);
        tracing::debug!(target: "dbx.tx", role = "outer", "commit");
        self.events().event("dbx.commit");

        self.state.callbacks.run();
        Ok(())
    }

    /// 外层：真实回滚并丢弃提交后回调；事务已结束时返回 `TxDone`。内层：空操作。
    pub fn rollback(&self) -> DbResult<()> {
        if self.role == TxRole::Inner {
            return Ok(());
        }

        let mut res = self.state.resource.borrow_mut().take().ok_or(DbError::TxDone)?;
        self.state.status.set(TxStatus::RolledBack);
        self.state.callbacks.discard();

        if let Err(e) = res.rollback() {
            self.events().event_err("dbx.rollback", &*e);
            return Err(DbError::DriverExec(e));
        }
        tracing::debug!(target: "dbx.tx", role = "outer", "rollback");
        self.events().event("dbx.rollback");
        Ok(())
    }

    /// 幂等的清理：外层事务仍未结束时回滚，错误只记录不返回。
    pub fn rollback_unless_committed(&self) {
        if self.role == TxRole::Inner || self.state.resource.borrow().is_none() {
            return;
        }
        if let Err(e) = self.rollback() {
            tracing::warn!(target: "dbx.tx", error = %e, "rollback unless committed failed");
        }
    }

    /// 登记提交后回调。事件接收器不支持回调，或事务已结束时返回 `CallbackRegistration`。
    pub fn run_after_commit(&self, cb: impl FnOnce() + 'static) -> DbResult<()> {
        if !self.state.is_open() {
            return Err(DbError::CallbackRegistration(
                "transaction is already closed".to_string(),
            ));
        }
        if !self.events().accepts_commit_callbacks() {
            return Err(DbError::CallbackRegistration(
                "event receiver does not accept commit callbacks".to_string(),
            ));
        }
        self.state.callbacks.add(Box::new(cb));
        Ok(())
    }
}

impl Dml for Tx {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn begin(&self) -> DbResult<Tx> {
        tracing::debug!(target: "dbx.tx", role = "inner", "begin");
        Ok(Tx::new(TxRole::Inner, self.state.clone(), &self.scope.runner))
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        self.rollback_unless_committed();
    }
}

/// 在事务中执行 `f`：`f` 成功则提交，否则回滚并原样返回错误。
///
/// `handle` 本身是事务时，这里得到的是内层事务，提交与回滚都交给外层。
/// 提交失败会作为错误返回。
pub fn run_in_transaction<D, T, E, F>(handle: &D, f: F) -> Result<T, E>
where
    D: Dml + ?Sized,
    E: From<DbError>,
    F: FnOnce(&Tx) -> Result<T, E>,
{
    let tx = handle.begin()?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}
