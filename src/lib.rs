//! halo-dbx：事务作用域的 SQL 语句组合层。
//!
//! - `Session`/`Tx`：嵌套事务扁平化成一个真实事务，只有外层句柄能提交或回滚。
//! - 语句装饰器：WITH 前缀、ON CONFLICT、只在 Postgres 家族生效的 RETURNING。
//! - 片段：括号、VALUES、GREATEST/MAX、translate、UPDATE-SET-WHERE。
//! - UNION / UNION ALL 组合。

pub mod args;
pub mod builder;
pub mod cte;
pub mod delete;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod event;
pub mod flavor;
pub mod fragment;
#[cfg(test)]
mod fragment_tests;
pub mod insert;
#[cfg(test)]
mod insert_tests;
pub mod interpolate;
#[cfg(test)]
mod interpolate_tests;
pub mod modifiers;
pub mod scan;
pub mod select;
pub mod session;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod stmt;
#[cfg(test)]
mod stmt_tests;
pub mod string_builder;
#[cfg(test)]
mod test_support;
pub mod union;
#[cfg(test)]
mod union_tests;
pub mod update;
pub mod value;

pub use crate::args::Args;
pub use crate::builder::{build, expr, with_flavor};
pub use crate::cte::WithClause;
pub use crate::delete::{DeleteBuilder, delete_from};
pub use crate::dialect::{Dialect, TimeLayout, TimeLayoutDialect};
pub use crate::driver::{Connection, ExecResult, TxResource};
pub use crate::error::{BuildError, DbError, DbResult, DriverError, InterpolateError};
pub use crate::event::{
    Callback, CommitCallbacks, EventReceiver, NullEventReceiver,
    TracingEventReceiver,
};
pub use crate::flavor::Flavor;
pub use crate::fragment::{
    Greatest, Literal, Parens, Translate, UpdateFragment, Values, do_nothing, do_update, greatest,
    translate, values,
};
pub use crate::insert::{InsertBuilder, insert_into};
pub use crate::interpolate::{interpolate, interpolate_builder};
pub use crate::modifiers::{
    Arg, Builder, FlattenIntoArgs, escape, escape_all, flatten, list, raw, tuple,
};
pub use crate::scan::{FromSqlValue, Row, Rows, ScanError};
pub use crate::select::{JoinOption, SelectBuilder, select};
pub use crate::session::{Dml, Session, SessionBuilder, Tx, TxRole, run_in_transaction};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
pub use crate::stmt::{DeleteStmt, InsertStmt, SelectStmt, UpdateStmt};
pub use crate::string_builder::IntoStrings;
pub use crate::union::{UnionBuilder, UnionStmt, union, union_all};
pub use crate::update::{UpdateBuilder, update};
pub use crate::value::SqlValue;
