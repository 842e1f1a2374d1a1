//! 语句装饰器：在基础 builder 之上加入 WITH 前缀、ON CONFLICT、按方言开关的 RETURNING，
//! 并持有执行它的会话或事务。
//!
//! 带 WITH 的 UPDATE 与带 ON CONFLICT 的 INSERT 先插值成字面量 SQL，再作为原始语句执行；
//! 其它语句使用绑定参数执行。

use crate::args::Args;
use crate::cte::WithClause;
use crate::delete::DeleteBuilder;
use crate::dialect::Dialect;
use crate::driver::{Connection, ExecResult};
use crate::error::{BuildError, DbError, DbResult};
use crate::flavor::Flavor;
use crate::fragment::impl_into_builder_arg;
use crate::insert::InsertBuilder;
use crate::interpolate::interpolate_builder;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, escape, into_values};
use crate::scan::{FromSqlValue, Rows, ScanError};
use crate::select::SelectBuilder;
use crate::session::TxState;
use crate::string_builder::{IntoStrings, collect_into_strings};
use crate::update::UpdateBuilder;
use crate::value::SqlValue;
use crate::event::EventReceiver;
use std::rc::Rc;
use std::time::Instant;

#[derive(Clone)]
pub(crate) enum Target {
    Conn(Rc<dyn Connection>),
    Tx(Rc<TxState>),
}

/// 语句回到会话/事务执行的通道。
#[derive(Clone)]
pub(crate) struct Runner {
    pub(crate) target: Target,
    pub(crate) dialect: Rc<dyn Dialect>,
    pub(crate) events: Rc<dyn EventReceiver>,
}

impl Runner {
    pub(crate) fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub(crate) fn flavor(&self) -> Flavor {
        self.dialect.flavor()
    }

    pub(crate) fn exec(&self, sql: &str, args: &[SqlValue]) -> DbResult<ExecResult> {
        tracing::trace!(target: "dbx.sql", sql, args = args.len(), "exec");
        let start = Instant::now();
        let res = match &self.target {
            Target::Conn(conn) => conn.exec(sql, args).map_err(DbError::DriverExec),
            Target::Tx(tx) => tx.exec(sql, args),
        };
        self.observe("dbx.exec", start, res.as_ref().err());
        res
    }

    pub(crate) fn query(&self, sql: &str, args: &[SqlValue]) -> DbResult<Rows> {
        tracing::trace!(target: "dbx.sql", sql, args = args.len(), "query");
        let start = Instant::now();
        let res = match &self.target {
            Target::Conn(conn) => conn.query(sql, args).map_err(DbError::DriverExec),
            Target::Tx(tx) => tx.query(sql, args),
        };
        self.observe("dbx.query", start, res.as_ref().err());
        res
    }

    fn observe(&self, name: &str, start: Instant, err: Option<&DbError>) {
        self.events.timing(name, start.elapsed());
        if let Some(err) = err {
            self.events.event_err(name, err);
        }
    }

    fn bind(&self, b: &dyn Builder) -> Result<(String, Vec<SqlValue>), BuildError> {
        let (sql, args) = b.build_with_flavor(self.flavor(), &[])?;
        Ok((sql, into_values(args)?))
    }

    /// 绑定参数执行。
    pub(crate) fn exec_builder(&self, b: &dyn Builder) -> DbResult<ExecResult> {
        let (sql, args) = self.bind(b)?;
        self.exec(&sql, &args)
    }

    pub(crate) fn query_builder(&self, b: &dyn Builder) -> DbResult<Rows> {
        let (sql, args) = self.bind(b)?;
        self.query(&sql, &args)
    }

    /// 插值成字面量 SQL 后无参数执行。
    pub(crate) fn exec_literal(&self, b: &dyn Builder) -> DbResult<ExecResult> {
        let sql = interpolate_builder(self.dialect(), b)?;
        self.exec(&sql, &[])
    }

    pub(crate) fn query_literal(&self, b: &dyn Builder) -> DbResult<Rows> {
        let sql = interpolate_builder(self.dialect(), b)?;
        self.query(&sql, &[])
    }
}

fn first_value<T: FromSqlValue>(rows: &Rows) -> DbResult<T> {
    let row = rows.first().ok_or(ScanError::NoRows)?;
    Ok(row.get(0)?)
}

fn first_column<T: FromSqlValue>(rows: &Rows) -> DbResult<Vec<T>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        out.push(row.get(0)?);
    }
    Ok(out)
}

impl_into_builder_arg!(SelectStmt, InsertStmt, UpdateStmt, DeleteStmt, OnConflict);

/// SELECT 装饰器。
#[derive(Clone)]
pub struct SelectStmt {
    builder: SelectBuilder,
    with: WithClause,
    runner: Runner,
}

impl SelectStmt {
    pub(crate) fn new(runner: Runner, with: WithClause, cols: Vec<String>) -> Self {
        let mut builder = SelectBuilder::new();
        builder.set_flavor(runner.flavor());
        builder.select(cols);
        Self {
            builder,
            with,
            runner,
        }
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.builder.distinct();
        self
    }

    pub fn from(&mut self, tables: impl IntoStrings) -> &mut Self {
        self.builder.from(tables);
        self
    }

    pub fn join(&mut self, table: impl Into<String>, on: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.builder.join(table, on, values);
        self
    }

    pub fn left_join(
        &mut self,
        table: impl Into<String>,
        on: &str,
        values: impl FlattenIntoArgs,
    ) -> &mut Self {
        self.builder.left_join(table, on, values);
        self
    }

    pub fn where_(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.builder.where_(expr, values);
        self
    }

    pub fn group_by(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.builder.group_by(cols);
        self
    }

    pub fn having(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.builder.having(expr, values);
        self
    }

    pub fn order_by(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.builder.order_by(cols);
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.builder.limit(limit);
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.builder.offset(offset);
        self
    }

    pub fn for_update(&mut self) -> &mut Self {
        self.builder.for_update();
        self
    }

    /// 插值后的完整 SQL。
    pub fn to_sql(&self) -> Result<String, BuildError> {
        interpolate_builder(self.runner.dialect(), self)
    }

    pub fn rows(&self) -> DbResult<Rows> {
        self.runner.query_builder(self)
    }

    /// 第一行第一列。
    pub fn load_value<T: FromSqlValue>(&self) -> DbResult<T> {
        first_value(&self.rows()?)
    }

    /// 所有行的第一列。
    pub fn load_column<T: FromSqlValue>(&self) -> DbResult<Vec<T>> {
        first_column(&self.rows()?)
    }

    pub fn load_strings(&self) -> DbResult<Vec<String>> {
        self.load_column()
    }
}

impl Builder for SelectStmt {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        self.with.prefix(&self.builder, flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.runner.flavor()
    }
}

/// `ON CONFLICT [(<cols>)] DO <action>`
#[derive(Debug, Clone)]
struct OnConflict {
    /// 已按会话方言引用过的列名。
    target: Vec<String>,
    action: Arg,
}

impl Builder for OnConflict {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut args = Args::new(flavor);
        let mut sql = String::from("ON CONFLICT");
        if !self.target.is_empty() {
            let cols: Vec<String> = self
                .target
                .iter()
                .map(|c| escape(c))
                .collect();
            sql.push_str(&format!(" ({})", cols.join(", ")));
        }
        sql.push_str(" DO ");
        sql.push_str(&args.add(self.action.clone()));
        args.compile_with_flavor(&sql, flavor, initial_arg)
    }
}

/// INSERT 装饰器。
#[derive(Clone)]
pub struct InsertStmt {
    builder: InsertBuilder,
    runner: Runner,
    has_conflict: bool,
}

impl InsertStmt {
    pub(crate) fn new(runner: Runner, table: String) -> Self {
        let mut builder = InsertBuilder::new();
        builder.set_flavor(runner.flavor());
        builder.insert_into(table);
        Self {
            builder,
            runner,
            has_conflict: false,
        }
    }

    pub fn columns(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.builder.columns(cols);
        self
    }

    pub fn values(&mut self, row: impl FlattenIntoArgs) -> &mut Self {
        self.builder.values(row);
        self
    }

    /// 冲突处理：`target` 为空时不输出列清单。`action` 通常是
    /// [`do_nothing`](crate::fragment::do_nothing) 或 [`do_update`](crate::fragment::do_update)。
    pub fn on_conflict(&mut self, target: impl IntoStrings, action: impl Into<Arg>) -> &mut Self {
        let dialect = self.runner.dialect();
        let target = collect_into_strings(target)
            .iter()
            .map(|c| dialect.quote_ident(c))
            .collect();
        self.builder.after_values(OnConflict {
            target,
            action: action.into(),
        });
        self.has_conflict = true;
        self
    }

    /// 只在 Postgres 家族上生效，其余方言忽略。
    pub fn returning(&mut self, cols: impl IntoStrings) -> &mut Self {
        if self.runner.dialect().is_postgres_family() {
            self.builder.returning(cols);
        }
        self
    }

    pub fn to_sql(&self) -> Result<String, BuildError> {
        interpolate_builder(self.runner.dialect(), self)
    }

    /// Postgres 家族且只 RETURNING 一列时，读取该值作为 `last_insert_id`，
    /// 此时 `rows_affected` 恒为 0。
    pub fn exec(&self) -> DbResult<ExecResult> {
        if self.runner.dialect().is_postgres_family() && self.builder.returning_columns().len() == 1 {
            let rows = self.rows()?;
            let id = match rows.first() {
                Some(row) => row.get::<Option<i64>>(0)?,
                None => None,
            };
            return Ok(ExecResult {
                rows_affected: 0,
                last_insert_id: id,
            });
        }
        if self.has_conflict {
            return self.runner.exec_literal(self);
        }
        self.runner.exec_builder(self)
    }

    /// RETURNING 的结果行。
    pub fn rows(&self) -> DbResult<Rows> {
        if self.has_conflict {
            return self.runner.query_literal(self);
        }
        self.runner.query_builder(self)
    }
}

impl Builder for InsertStmt {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        self.builder.build_with_flavor(flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.runner.flavor()
    }
}

/// UPDATE 装饰器。
#[derive(Clone)]
pub struct UpdateStmt {
    builder: UpdateBuilder,
    with: WithClause,
    runner: Runner,
}

impl UpdateStmt {
    pub(crate) fn new(runner: Runner, with: WithClause, table: String) -> Self {
        let mut builder = UpdateBuilder::new();
        builder.set_flavor(runner.flavor());
        builder.update(table);
        Self {
            builder,
            with,
            runner,
        }
    }

    pub fn set(&mut self, col: impl Into<String>, value: impl Into<Arg>) -> &mut Self {
        self.builder.set(col, value);
        self
    }

    pub fn set_expr(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.builder.set_expr(expr, values);
        self
    }

    pub fn where_(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.builder.where_(expr, values);
        self
    }

    /// 只在 Postgres 家族上生效，其余方言忽略。
    pub fn returning(&mut self, cols: impl IntoStrings) -> &mut Self {
        if self.runner.dialect().is_postgres_family() {
            self.builder.returning(cols);
        }
        self
    }

    pub fn to_sql(&self) -> Result<String, BuildError> {
        interpolate_builder(self.runner.dialect(), self)
    }

    pub fn exec(&self) -> DbResult<ExecResult> {
        if !self.with.is_empty() {
            return self.runner.exec_literal(self);
        }
        self.runner.exec_builder(self)
    }

    pub fn rows(&self) -> DbResult<Rows> {
        if !self.with.is_empty() {
            return self.runner.query_literal(self);
        }
        self.runner.query_builder(self)
    }
}

impl Builder for UpdateStmt {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        self.with.prefix(&self.builder, flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.runner.flavor()
    }
}

/// DELETE 装饰器。
#[derive(Clone)]
pub struct DeleteStmt {
    builder: DeleteBuilder,
    runner: Runner,
}

impl DeleteStmt {
    pub(crate) fn new(runner: Runner, table: String) -> Self {
        let mut builder = DeleteBuilder::new();
        builder.set_flavor(runner.flavor());
        builder.delete_from(table);
        Self { builder, runner }
    }

    pub fn where_(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.builder.where_(expr, values);
        self
    }

    pub fn to_sql(&self) -> Result<String, BuildError> {
        interpolate_builder(self.runner.dialect(), self)
    }

    pub fn exec(&self) -> DbResult<ExecResult> {
        self.runner.exec_builder(self)
    }
}

impl Builder for DeleteStmt {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        self.builder.build_with_flavor(flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.runner.flavor()
    }
}
