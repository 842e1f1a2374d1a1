//! 可组合的 SQL 片段：括号、VALUES、GREATEST/MAX、translate、UPDATE-SET-WHERE、字面量。
//!
//! 片段构造后不再变化，所有参数都在 `build_with_flavor` 时登记，因此可以被多次渲染。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, flatten};
use std::collections::BTreeMap;

/// 片段（以及语句 builder）可以直接作为参数使用，编译时原地展开。
macro_rules! impl_into_builder_arg {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Builder(Box::new(v))
                }
            }

            impl From<&mut $ty> for Arg {
                fn from(v: &mut $ty) -> Self {
                    Arg::Builder(Box::new(v.clone()))
                }
            }
        )+
    };
}
pub(crate) use impl_into_builder_arg;

impl_into_builder_arg!(Parens, Values, Greatest, Translate, UpdateFragment, Literal);

/// 括号包裹：`(` + inner + `)`，常用于把 SELECT 作为标量子查询。
#[derive(Debug, Clone)]
pub struct Parens {
    inner: Arg,
}

impl Parens {
    pub fn new(inner: impl Into<Arg>) -> Self {
        Self {
            inner: inner.into(),
        }
    }
}

impl Builder for Parens {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut args = Args::new(flavor);
        let ph = args.add(self.inner.clone());
        args.compile_with_flavor(&format!("({ph})"), flavor, initial_arg)
    }
}

/// 多行 VALUES：`VALUES (v1,v2),(v1,v2)`，空行会被跳过。
#[derive(Debug, Clone, Default)]
pub struct Values {
    rows: Vec<Vec<Arg>>,
}

/// 以第一行创建 `Values`。
pub fn values(row: impl FlattenIntoArgs) -> Values {
    Values::new().row(row)
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一行。
    pub fn row(mut self, row: impl FlattenIntoArgs) -> Self {
        self.rows.push(flatten(row));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }
}

impl Builder for Values {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut args = Args::new(flavor);
        let rows: Vec<String> = self
            .rows
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| {
                let phs: Vec<String> = r.iter().map(|v| args.add(v.clone())).collect();
                format!("({})", phs.join(","))
            })
            .collect();
        if rows.is_empty() {
            return Err(BuildError::EmptyValues);
        }
        args.compile_with_flavor(&format!("VALUES {}", rows.join(",")), flavor, initial_arg)
    }
}

/// 多值取最大：Postgres 家族输出 `greatest(...)`，其余输出 `max(...)`。
#[derive(Debug, Clone)]
pub struct Greatest {
    args: Vec<Arg>,
}

pub fn greatest(values: impl FlattenIntoArgs) -> Greatest {
    Greatest {
        args: flatten(values),
    }
}

impl Builder for Greatest {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        if self.args.is_empty() {
            return Err(BuildError::EmptyArgs("greatest"));
        }
        let func = if flavor.is_postgres_family() {
            "greatest"
        } else {
            "max"
        };
        let mut args = Args::new(flavor);
        let phs: Vec<String> = self.args.iter().map(|v| args.add(v.clone())).collect();
        args.compile_with_flavor(&format!("{func}({})", phs.join(",")), flavor, initial_arg)
    }
}

/// 字符替换：Postgres 家族使用 `translate(text, from, to)`，
/// 其余方言对每个字符对嵌套一次 `replace(...)`。
#[derive(Debug, Clone)]
pub struct Translate {
    text: Arg,
    from: String,
    to: String,
}

pub fn translate(text: impl Into<Arg>, from: impl Into<String>, to: impl Into<String>) -> Translate {
    Translate {
        text: text.into(),
        from: from.into(),
        to: to.into(),
    }
}

impl Builder for Translate {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let from: Vec<char> = self.from.chars().collect();
        let to: Vec<char> = self.to.chars().collect();
        if from.len() != to.len() {
            return Err(BuildError::TranslateLength {
                from: from.len(),
                to: to.len(),
            });
        }

        let mut args = Args::new(flavor);
        let mut sql = args.add(self.text.clone());
        if flavor.is_postgres_family() {
            let f = args.add(self.from.clone());
            let t = args.add(self.to.clone());
            sql = format!("translate({sql}, {f}, {t})");
        } else {
            for (f, t) in from.iter().zip(to.iter()) {
                let f = args.add(f.to_string());
                let t = args.add(t.to_string());
                sql = format!("replace({sql}, {f}, {t})");
            }
        }
        args.compile_with_flavor(&sql, flavor, initial_arg)
    }
}

/// 通用 UPDATE-SET-WHERE 片段；列按名字排序，保证 SQL 文本稳定。
///
/// 没有表名时输出 `UPDATE SET ...`，用作 `ON CONFLICT ... DO UPDATE SET ...` 的动作。
#[derive(Debug, Clone, Default)]
pub struct UpdateFragment {
    table: Option<String>,
    set: BTreeMap<String, Arg>,
    wheres: Vec<(String, Vec<Arg>)>,
}

impl UpdateFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// 同名列后写覆盖先写。
    pub fn set(mut self, col: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.set.insert(col.into(), value.into());
        self
    }

    /// 追加一个 `?` 风格的条件，多个条件以 AND 连接。
    pub fn where_(mut self, expr: impl Into<String>, values: impl FlattenIntoArgs) -> Self {
        self.wheres.push((expr.into(), flatten(values)));
        self
    }
}

impl Builder for UpdateFragment {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut args = Args::new(flavor);
        let mut sql = String::from("UPDATE");
        if let Some(table) = &self.table {
            sql.push(' ');
            sql.push_str(&flavor.quote(table));
        }

        if !self.set.is_empty() {
            let assignments: Vec<String> = self
                .set
                .iter()
                .map(|(col, v)| format!("{} = {}", flavor.quote(col), args.add(v.clone())))
                .collect();
            sql.push_str(" SET ");
            sql.push_str(&assignments.join(", "));
        }

        if !self.wheres.is_empty() {
            let mut conds = Vec::with_capacity(self.wheres.len());
            for (expr, values) in &self.wheres {
                conds.push(format!("({})", args.expand(expr, values.iter().cloned())?));
            }
            sql.push_str(" WHERE ");
            sql.push_str(&conds.join(" AND "));
        }

        args.compile_with_flavor(&sql, flavor, initial_arg)
    }
}

/// 原样输出的 SQL 文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(pub String);

impl Literal {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }
}

impl Builder for Literal {
    fn build_with_flavor(
        &self,
        _flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        Ok((self.0.clone(), initial_arg.to_vec()))
    }
}

/// `ON CONFLICT ... DO NOTHING` 的动作。
pub fn do_nothing() -> Literal {
    Literal::new("NOTHING")
}

/// `ON CONFLICT ... DO UPDATE SET ...` 的动作，通过 `set` 追加赋值。
pub fn do_update() -> UpdateFragment {
    UpdateFragment::new()
}
