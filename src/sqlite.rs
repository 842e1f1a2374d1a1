//! 基于 rusqlite 的 `Connection` 实现，事务用 `BEGIN`/`COMMIT`/`ROLLBACK` 驱动。
//!
//! 查询结果一次性物化成 [`Rows`]，不持有 rusqlite 的借用游标。

use crate::driver::{Connection, ExecResult, TxResource};
use crate::error::DriverError;
use crate::interpolate::TIME_FORMAT;
use crate::scan::Rows;
use crate::value::SqlValue;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use std::path::Path;
use std::rc::Rc;
use time::UtcOffset;

/// SQLite 连接，克隆后共享同一个底层连接。
#[derive(Clone)]
pub struct SqliteConnection {
    conn: Rc<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn open_in_memory() -> Result<Self, DriverError> {
        Ok(Self {
            conn: Rc::new(rusqlite::Connection::open_in_memory()?),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        Ok(Self {
            conn: Rc::new(rusqlite::Connection::open(path)?),
        })
    }

    /// 执行多条以分号分隔、不带参数的语句，常用于建表。
    pub fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Connection for SqliteConnection {
    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError> {
        exec(&self.conn, sql, args)
    }

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError> {
        query(&self.conn, sql, args)
    }

    fn begin(&self) -> Result<Box<dyn TxResource>, DriverError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(Box::new(SqliteTx {
            conn: self.conn.clone(),
            open: true,
        }))
    }
}

/// 一个 `BEGIN` 出来的事务；drop 时若仍未结束则回滚。
struct SqliteTx {
    conn: Rc<rusqlite::Connection>,
    open: bool,
}

impl TxResource for SqliteTx {
    fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError> {
        exec(&self.conn, sql, args)
    }

    fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError> {
        query(&self.conn, sql, args)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.open = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(target: "dbx.sqlite", error = %e, "rollback on drop failed");
            }
        }
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

fn exec(conn: &rusqlite::Connection, sql: &str, args: &[SqlValue]) -> Result<ExecResult, DriverError> {
    let mut stmt = conn.prepare(sql)?;
    let n = stmt.execute(rusqlite::params_from_iter(args.iter().map(Bind)))?;
    let last_insert_id = is_insert(sql).then(|| conn.last_insert_rowid());
    Ok(ExecResult {
        rows_affected: n as u64,
        last_insert_id,
    })
}

fn query(conn: &rusqlite::Connection, sql: &str, args: &[SqlValue]) -> Result<Rows, DriverError> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut out = Vec::new();
    let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(Bind)))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(from_value_ref(row.get_ref(i)?)?);
        }
        out.push(values);
    }
    Ok(Rows::new(columns, out))
}

fn from_value_ref(v: ValueRef<'_>) -> Result<SqlValue, DriverError> {
    Ok(match v {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::I64(i),
        ValueRef::Real(f) => SqlValue::F64(f),
        ValueRef::Text(t) => SqlValue::from(std::str::from_utf8(t)?.to_string()),
        ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
    })
}

/// 把 `SqlValue` 绑定为 SQLite 参数。
struct Bind<'a>(&'a SqlValue);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self.0 {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(*b as i64)),
            SqlValue::I64(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::U64(u) => {
                let i = i64::try_from(*u)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(Value::Integer(i))
            }
            SqlValue::F64(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            SqlValue::DateTime(t) => {
                let s = (*t + time::Duration::nanoseconds(500))
                    .to_offset(UtcOffset::UTC)
                    .format(TIME_FORMAT)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(Value::Text(s))
            }
        };
        Ok(out)
    }
}
