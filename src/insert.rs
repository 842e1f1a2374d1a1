//! InsertBuilder：构建 INSERT 语句，表名与列名按 flavor 加引号。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::fragment::impl_into_builder_arg;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, escape, flatten};
use crate::string_builder::{IntoStrings, StringBuilder, collect_into_strings};

#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    table: String,
    cols: Vec<String>,
    values: Vec<Vec<String>>,
    after_values: Option<String>,
    returning: Vec<String>,

    args: Args,
}

impl_into_builder_arg!(InsertBuilder);

pub fn insert_into(table: impl Into<String>) -> InsertBuilder {
    let mut ib = InsertBuilder::new();
    ib.insert_into(table);
    ib
}

impl InsertBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flavor(&mut self, flavor: Flavor) -> Flavor {
        std::mem::replace(&mut self.args.flavor, flavor)
    }

    pub fn flavor(&self) -> Flavor {
        self.args.flavor
    }

    pub fn insert_into(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn columns(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.cols = collect_into_strings(cols);
        self
    }

    /// 追加一行值，顺序与 `columns` 一致。
    pub fn values(&mut self, row: impl FlattenIntoArgs) -> &mut Self {
        let placeholders: Vec<String> = flatten(row).into_iter().map(|v| self.args.add(v)).collect();
        self.values.push(placeholders);
        self
    }

    /// 在 VALUES 之后、RETURNING 之前插入一段子句（例如 ON CONFLICT）。
    pub fn after_values(&mut self, clause: impl Into<Arg>) -> &mut Self {
        self.after_values = Some(self.args.add(clause));
        self
    }

    pub fn returning(&mut self, cols: impl IntoStrings) -> &mut Self {
        self.returning = collect_into_strings(cols);
        self
    }

    pub fn returning_columns(&self) -> &[String] {
        &self.returning
    }
}

impl Builder for InsertBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut buf = StringBuilder::new();
        buf.write_leading("INSERT INTO ");
        buf.write_str(&escape(&flavor.quote(&self.table)));

        if !self.cols.is_empty() {
            let cols: Vec<String> = self.cols.iter().map(|c| escape(&flavor.quote(c))).collect();
            buf.write_leading("(");
            buf.write_str(&cols.join(", "));
            buf.write_str(")");
        }

        if !self.values.is_empty() {
            let rows: Vec<String> = self
                .values
                .iter()
                .map(|row| format!("({})", row.join(", ")))
                .collect();
            buf.write_leading("VALUES ");
            buf.write_str(&rows.join(", "));
        }

        if let Some(ph) = &self.after_values {
            buf.write_leading(ph);
        }

        write_returning(&mut buf, flavor, &self.returning);

        self.args
            .compile_with_flavor(&buf.into_string(), flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}

pub(crate) fn write_returning(buf: &mut StringBuilder, flavor: Flavor, cols: &[String]) {
    if cols.is_empty() {
        return;
    }
    let cols: Vec<String> = cols.iter().map(|c| escape(&flavor.quote(c))).collect();
    buf.write_leading("RETURNING ");
    buf.write_str(&cols.join(", "));
}
