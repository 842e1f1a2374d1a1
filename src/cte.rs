//! WithClause：有序的 `(name, sub-query)` 列表，渲染为 `WITH a AS (...), b AS (...)`。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::modifiers::{Arg, Builder, escape};
use crate::string_builder::StringBuilder;

#[derive(Debug, Clone, Default)]
pub struct WithClause {
    recursive: bool,
    query_vars: Vec<String>,
    args: Args,
}

impl WithClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个 CTE；`name` 原样输出，可以带列清单，例如 `v(id,value)`。
    pub fn push(&mut self, name: &str, query: impl Into<Arg>) -> &mut Self {
        let ph = self.args.add(query);
        self.query_vars.push(format!("{} AS ({ph})", escape(name)));
        self
    }

    pub fn recursive(&mut self) -> &mut Self {
        self.recursive = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query_vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.query_vars.len()
    }

    /// 渲染 `WITH ... <body>`；WITH 为空时只渲染 body。
    pub fn prefix(
        &self,
        body: &dyn Builder,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        if self.is_empty() {
            return body.build_with_flavor(flavor, initial_arg);
        }
        let (with_sql, args) = self.build_with_flavor(flavor, initial_arg)?;
        let (body_sql, args) = body.build_with_flavor(flavor, &args)?;
        Ok((format!("{with_sql} {body_sql}"), args))
    }
}

impl Builder for WithClause {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut buf = StringBuilder::new();
        if !self.query_vars.is_empty() {
            buf.write_leading("WITH");
            if self.recursive {
                buf.write_str(" RECURSIVE");
            }
            buf.write_str(" ");
            buf.write_str(&self.query_vars.join(", "));
        }
        self.args
            .compile_with_flavor(&buf.into_string(), flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}
