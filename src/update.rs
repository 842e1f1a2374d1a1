//! UpdateBuilder：构建 UPDATE 语句。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::fragment::impl_into_builder_arg;
use crate::insert::write_returning;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, escape, flatten};
use crate::select::write_where;
use crate::string_builder::{IntoStrings, StringBuilder, collect_into_strings};

#[derive(Debug, Clone)]
enum Assignment {
    /// `"col" = $n`
    Value { col: String, ph: String },
    /// 已展开的表达式，例如 `count = count + $0`
    Expr(String),
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    table: String,
    assignments: Vec<Assignment>,
    where_exprs: Vec<String>,
    returning: Vec<String>,

    args: Args,
    err: Option<BuildError>,
}

impl_into_builder_arg!(UpdateBuilder);

pub fn update(table: impl Into<String>) -> UpdateBuilder {
    let mut ub = UpdateBuilder::new();
    ub.update(table);
    ub
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flavor(&mut self, flavor: Flavor) -> Flavor {
        std::mem::replace(&mut self.args.flavor, flavor)
    }

    pub fn flavor(&self) -> Flavor {
        self.args.flavor
    }

    pub fn update(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    /// `"col" = value`；value 可以是子查询（参见 `Parens`）。
    pub fn set(&mut self, col: impl Into<String>, value: impl Into<Arg>) -> &mut Self {
        let ph = self.args.add(value);
        self.assignments.push(Assignment::Value {
            col: col.into(),
            ph,
        });
        self
    }

    /// 原样的赋值表达式，例如 `set_expr("n = n + ?", 1)`。
    pub fn set_expr(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        match self.args.expand(expr, flatten(values)) {
            Ok(e) => self.assignments.push(Assignment::Expr(e)),
            Err(e) => {
                self.err.get_or_insert(e);
            }
        }
        self
    }

    pub fn where_(&mut self, expr: &str, values: impl FlattenIntoArgs) -> &mut Self {
        if expr.is_empty() {
            return self;
        }
        match self.args.expand(expr, flatten(values)) {
            Ok(e) => self.where_exprs.push(e),
            Err(e) => {
                self.err.get_or_insert(e);
            }
        }
        self
    }

    pub fn returning(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.returning = collect_into_strings(cols);
        self
    }
}

impl Builder for UpdateBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let mut buf = StringBuilder::new();
        buf.write_leading("UPDATE ");
        buf.write_str(&escape(&flavor.quote(&self.table)));

        if !self.assignments.is_empty() {
            let sets: Vec<String> = self
                .assignments
                .iter()
                .map(|a| match a {
                    Assignment::Value { col, ph } => {
                        format!("{} = {ph}", escape(&flavor.quote(col)))
                    }
                    Assignment::Expr(e) => e.clone(),
                })
                .collect();
            buf.write_leading("SET ");
            buf.write_str(&sets.join(", "));
        }

        write_where(&mut buf, &self.where_exprs);
        write_returning(&mut buf, flavor, &self.returning);

        self.args
            .compile_with_flavor(&buf.into_string(), flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}
