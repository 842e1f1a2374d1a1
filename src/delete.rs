//! DeleteBuilder：构建 DELETE 语句。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::fragment::impl_into_builder_arg;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, escape, flatten};
use crate::select::write_where;
use crate::string_builder::StringBuilder;

#[derive(Debug, Clone, Default)]
pub struct DeleteBuilder {
    table: String,
    where_exprs: Vec<String>,

    args: Args,
    err: Option<BuildError>,
}

impl_into_builder_arg!(DeleteBuilder);

pub fn delete_from(table: impl Into<String>) -> DeleteBuilder {
    let mut db = DeleteBuilder::new();
    db.delete_from(table);
    db
}

impl DeleteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flavor(&mut self, flavor: Flavor) -> Flavor {
        std::mem::replace(&mut self.args.flavor, flavor)
    }

    pub fn flavor(&self) -> Flavor {
        self.args.flavor
    }

    pub fn delete_from(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
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
}

impl Builder for DeleteBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let mut buf = StringBuilder::new();
        buf.write_leading("DELETE FROM ");
        buf.write_str(&escape(&flavor.quote(&self.table)));
        write_where(&mut buf, &self.where_exprs);

        self.args
            .compile_with_flavor(&buf.into_string(), flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}
