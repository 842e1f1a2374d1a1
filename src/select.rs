//! SelectBuilder：构建 SELECT 语句。列与表名按原样输出，条件使用 `?` 风格参数。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::fragment::impl_into_builder_arg;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, flatten};
use crate::string_builder::{IntoStrings, StringBuilder, collect_into_strings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOption {
    InnerJoin,
    LeftJoin,
    LeftOuterJoin,
    RightJoin,
    FullJoin,
}

impl JoinOption {
    fn as_str(self) -> &'static str {
        match self {
            Self::InnerJoin => "INNER",
            Self::LeftJoin => "LEFT",
            Self::LeftOuterJoin => "LEFT OUTER",
            Self::RightJoin => "RIGHT",
            Self::FullJoin => "FULL",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    option: Option<JoinOption>,
    table: String,
    on: String,
}

#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    args: Args,
    err: Option<BuildError>,

    distinct: bool,
    select_cols: Vec<String>,
    tables: Vec<String>,
    joins: Vec<Join>,
    where_exprs: Vec<String>,
    group_by_cols: Vec<String>,
    having_exprs: Vec<String>,
    order_by_cols: Vec<String>,
    limit_var: Option<String>,
    offset_var: Option<String>,
    for_update: bool,
}

impl_into_builder_arg!(SelectBuilder);

/// 以列名创建 SelectBuilder。
pub fn select(cols: impl IntoStrings) -> SelectBuilder {
    let mut sb = SelectBuilder::new();
    sb.select(cols);
    sb
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flavor(&mut self, flavor: Flavor) -> Flavor {
        std::mem::replace(&mut self.args.flavor, flavor)
    }

    pub fn flavor(&self) -> Flavor {
        self.args.flavor
    }

    fn var(&mut self, v: impl Into<Arg>) -> String {
        self.args.add(v)
    }

    /// 展开 `?` 表达式；第一个错误会保留到渲染时返回。
    fn expand(&mut self, expr: &str, values: impl FlattenIntoArgs) -> Option<String> {
        match self.args.expand(expr, flatten(values)) {
            Ok(s) => Some(s),
            Err(e) => {
                self.err.get_or_insert(e);
                None
            }
        }
    }

    pub fn select(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.select_cols = collect_into_strings(cols);
        self
    }

    pub fn select_more(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.select_cols.extend(collect_into_strings(cols));
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    pub fn from(&mut self, tables: impl IntoStrings) -> &mut Self {
        self.tables = collect_into_strings(tables);
        self
    }

    pub fn join(&mut self, table: impl Into<String>, on: &str, values: impl FlattenIntoArgs) -> &mut Self {
        self.join_with_option(None, table, on, values)
    }

    pub fn left_join(
        &mut self,
        table: impl Into<String>,
        on: &str,
        values: impl FlattenIntoArgs,
    ) -> &mut Self {
        self.join_with_option(Some(JoinOption::LeftJoin), table, on, values)
    }

    pub fn join_with_option(
        &mut self,
        option: Option<JoinOption>,
        table: impl Into<String>,
        on: &str,
        values: impl FlattenIntoArgs,
    ) -> &mut Self {
        if let Some(on) = self.expand(on, values) {
            self.joins.push(Join {
                option,
                table: table.into(),
                on,
            });
        }
        self
    }

    /// 追加条件，多次调用以 AND 连接：`WHERE (a) AND (b)`。
    pub fn where_(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        if expr.is_empty() {
            return self;
        }
        if let Some(e) = self.expand(expr, values) {
            self.where_exprs.push(e);
        }
        self
    }

    pub fn group_by(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.group_by_cols.extend(collect_into_strings(cols));
        self
    }

    pub fn having(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        if let Some(e) = self.expand(expr, values) {
            self.having_exprs.push(e);
        }
        self
    }

    /// 例如 `order_by("id DESC")`。
    pub fn order_by(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.order_by_cols.extend(collect_into_strings(cols));
        self
    }

    /// 负数表示清除。
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        if limit < 0 {
            self.limit_var = None;
            return self;
        }
        self.limit_var = Some(self.var(limit));
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        if offset < 0 {
            self.offset_var = None;
            return self;
        }
        self.offset_var = Some(self.var(offset));
        self
    }

    pub fn for_update(&mut self) -> &mut Self {
        self.for_update = true;
        self
    }
}

impl Builder for SelectBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let mut buf = StringBuilder::new();
        buf.write_leading("SELECT");
        if self.distinct {
            buf.write_str(" DISTINCT");
        }
        buf.write_str(" ");
        if self.select_cols.is_empty() {
            buf.write_str("*");
        } else {
            buf.write_str(&self.select_cols.join(", "));
        }

        if !self.tables.is_empty() {
            buf.write_leading("FROM");
            buf.write_str(" ");
            buf.write_str(&self.tables.join(", "));
        }

        for join in &self.joins {
            if let Some(opt) = join.option {
                buf.write_leading(opt.as_str());
            }
            buf.write_leading("JOIN");
            buf.write_str(" ");
            buf.write_str(&join.table);
            buf.write_str(" ON ");
            buf.write_str(&join.on);
        }

        write_where(&mut buf, &self.where_exprs);

        if !self.group_by_cols.is_empty() {
            buf.write_leading("GROUP BY");
            buf.write_str(" ");
            buf.write_str(&self.group_by_cols.join(", "));
            if !self.having_exprs.is_empty() {
                buf.write_str(" HAVING ");
                buf.write_str(&wrap_and(&self.having_exprs));
            }
        }

        if !self.order_by_cols.is_empty() {
            buf.write_leading("ORDER BY");
            buf.write_str(" ");
            buf.write_str(&self.order_by_cols.join(", "));
        }

        write_limit_offset(
            &mut buf,
            flavor,
            self.limit_var.as_deref(),
            self.offset_var.as_deref(),
            !self.order_by_cols.is_empty(),
        );

        if self.for_update {
            buf.write_leading("FOR UPDATE");
        }

        self.args
            .compile_with_flavor(&buf.into_string(), flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}

/// `(a) AND (b)`
pub(crate) fn wrap_and(exprs: &[String]) -> String {
    exprs
        .iter()
        .map(|e| format!("({e})"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub(crate) fn write_where(buf: &mut StringBuilder, exprs: &[String]) {
    if exprs.is_empty() {
        return;
    }
    buf.write_leading("WHERE");
    buf.write_str(" ");
    buf.write_str(&wrap_and(exprs));
}

/// LIMIT/OFFSET 按 flavor 输出；SQLServer 使用 OFFSET/FETCH 且要求 ORDER BY。
pub(crate) fn write_limit_offset(
    buf: &mut StringBuilder,
    flavor: Flavor,
    limit: Option<&str>,
    offset: Option<&str>,
    has_order_by: bool,
) {
    match flavor {
        Flavor::MySQL | Flavor::SQLite => {
            if let Some(lim) = limit {
                buf.write_leading("LIMIT ");
                buf.write_str(lim);
                if let Some(off) = offset {
                    buf.write_leading("OFFSET ");
                    buf.write_str(off);
                }
            }
        }
        Flavor::PostgreSQL => {
            if let Some(lim) = limit {
                buf.write_leading("LIMIT ");
                buf.write_str(lim);
            }
            if let Some(off) = offset {
                buf.write_leading("OFFSET ");
                buf.write_str(off);
            }
        }
        Flavor::SQLServer => {
            if limit.is_none() && offset.is_none() {
                return;
            }
            if !has_order_by {
                buf.write_leading("ORDER BY 1");
            }
            buf.write_leading("OFFSET ");
            buf.write_str(offset.unwrap_or("0"));
            buf.write_str(" ROWS");
            if let Some(lim) = limit {
                buf.write_leading("FETCH NEXT ");
                buf.write_str(lim);
                buf.write_str(" ROWS ONLY");
            }
        }
    }
}
