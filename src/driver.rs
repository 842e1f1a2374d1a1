//! 驱动能力：由外部连接层实现，本 crate 只通过这两个 trait 执行 SQL。

use crate::error::DriverError;
use crate::scan::Rows;
use crate::value::SqlValue;

/// 一次写操作的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// 驱动提供的自增 id；Postgres 单列 RETURNING 时为返回的值。
    pub last_insert_id: Option<i64>,
}

/// 一个物理连接（或会话）。执行是阻塞的。
pub trait Connection {
    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError>;

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError>;

    /// 打开一个真实事务。
    fn begin(&self) -> Result<Box<dyn TxResource>, DriverError>;
}

/// 真实事务资源，只由外层事务持有。
pub trait TxResource {
    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError>;

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError>;

    fn commit(&mut self) -> Result<(), DriverError>;

    fn rollback(&mut self) -> Result<(), DriverError>;
}
