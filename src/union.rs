//! UnionBuilder：构建 UNION / UNION ALL；UnionStmt 把整条语句插值后作为原始查询执行。

use crate::args::Args;
use crate::error::{BuildError, DbResult};
use crate::flavor::Flavor;
use crate::fragment::impl_into_builder_arg;
use crate::interpolate::interpolate_builder;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, flatten};
use crate::scan::{FromSqlValue, Rows};
use crate::select::write_limit_offset;
use crate::stmt::Runner;
use crate::string_builder::{IntoStrings, StringBuilder, collect_into_strings};

const UNION_DISTINCT: &str = " UNION ";
const UNION_ALL: &str = " UNION ALL ";

#[derive(Debug, Clone)]
pub struct UnionBuilder {
    opt: &'static str,
    builder_vars: Vec<String>,
    order_by_cols: Vec<String>,
    limit_var: Option<String>,
    offset_var: Option<String>,

    args: Args,
}

impl Default for UnionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl_into_builder_arg!(UnionBuilder, UnionStmt);

/// `(a) UNION (b)`
pub fn union(builders: impl FlattenIntoArgs) -> UnionBuilder {
    let mut ub = UnionBuilder::new();
    ub.union(builders);
    ub
}

/// `(a) UNION ALL (b)`
pub fn union_all(builders: impl FlattenIntoArgs) -> UnionBuilder {
    let mut ub = UnionBuilder::new();
    ub.union_all(builders);
    ub
}

impl UnionBuilder {
    pub fn new() -> Self {
        Self {
            opt: UNION_DISTINCT,
            builder_vars: Vec::new(),
            order_by_cols: Vec::new(),
            limit_var: None,
            offset_var: None,
            args: Args::default(),
        }
    }

    pub fn set_flavor(&mut self, flavor: Flavor) -> Flavor {
        std::mem::replace(&mut self.args.flavor, flavor)
    }

    pub fn flavor(&self) -> Flavor {
        self.args.flavor
    }

    pub fn union(&mut self, builders: impl FlattenIntoArgs) -> &mut Self {
        self.union_impl(UNION_DISTINCT, builders)
    }

    pub fn union_all(&mut self, builders: impl FlattenIntoArgs) -> &mut Self {
        self.union_impl(UNION_ALL, builders)
    }

    fn union_impl(&mut self, opt: &'static str, builders: impl FlattenIntoArgs) -> &mut Self {
        self.opt = opt;
        self.builder_vars = flatten(builders)
            .into_iter()
            .map(|b| self.args.add(b))
            .collect();
        self
    }

    pub fn order_by(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.order_by_cols = collect_into_strings(cols);
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        if limit < 0 {
            self.limit_var = None;
            return self;
        }
        self.limit_var = Some(self.args.add(limit));
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        if offset < 0 {
            self.offset_var = None;
            return self;
        }
        self.offset_var = Some(self.args.add(offset));
        self
    }
}

impl Builder for UnionBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut buf = StringBuilder::new();

        // SQLite 不接受带括号的 UNION 成员
        let need_paren = flavor != Flavor::SQLite;
        for (i, b) in self.builder_vars.iter().enumerate() {
            if i > 0 {
                buf.write_str(self.opt);
            }
            if need_paren {
                buf.write_str("(");
                buf.write_str(b);
                buf.write_str(")");
            } else {
                buf.write_str(b);
            }
        }

        if !self.order_by_cols.is_empty() {
            buf.write_leading("ORDER BY ");
            buf.write_str(&self.order_by_cols.join(", "));
        }

        write_limit_offset(
            &mut buf,
            flavor,
            self.limit_var.as_deref(),
            self.offset_var.as_deref(),
            !self.order_by_cols.is_empty(),
        );

        self.args
            .compile_with_flavor(&buf.into_string(), flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}

/// 会话/事务上的 UNION 语句。
#[derive(Clone)]
pub struct UnionStmt {
    builder: UnionBuilder,
    runner: Runner,
}

impl UnionStmt {
    pub(crate) fn new(runner: Runner, all: bool, builders: impl FlattenIntoArgs) -> Self {
        let mut builder = UnionBuilder::new();
        builder.set_flavor(runner.flavor());
        if all {
            builder.union_all(builders);
        } else {
            builder.union(builders);
        }
        Self { builder, runner }
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

    pub fn to_sql(&self) -> Result<String, BuildError> {
        interpolate_builder(self.runner.dialect(), self)
    }

    pub fn rows(&self) -> DbResult<Rows> {
        self.runner.query_literal(self)
    }

    pub fn load_column<T: FromSqlValue>(&self) -> DbResult<Vec<T>> {
        let rows = self.rows()?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            out.push(row.get(0)?);
        }
        Ok(out)
    }
}

impl Builder for UnionStmt {
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
