//! 参数修饰器与 Builder trait：所有语句、片段都通过它渲染进不断增长的 SQL。

use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::value::SqlValue;
use dyn_clone::DynClone;

/// Escape：把 `$` 替换为 `$$`，避免被 `Args::compile_with_flavor` 当成占位符。
pub fn escape(ident: &str) -> String {
    ident.replace('$', "$$")
}

/// EscapeAll：批量 Escape。
pub fn escape_all(idents: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    idents.into_iter().map(|s| escape(s.as_ref())).collect()
}

/// Raw：原样拼入 SQL（不会成为参数占位符）。
pub fn raw(expr: impl Into<String>) -> Arg {
    Arg::Raw(expr.into())
}

/// List：展开成 `?, ?, ?`（或对应 flavor 的占位符序列）。
pub fn list<T: FlattenIntoArgs>(values: T) -> Arg {
    Arg::List {
        args: flatten(values),
        is_tuple: false,
    }
}

/// Tuple：展开成 `(?, ?)`，常用于 `IN ?`。
pub fn tuple<T: FlattenIntoArgs>(values: T) -> Arg {
    Arg::List {
        args: flatten(values),
        is_tuple: true,
    }
}

pub fn flatten<T: FlattenIntoArgs>(v: T) -> Vec<Arg> {
    let mut out = Vec::new();
    v.flatten_into(&mut out);
    out
}

/// Builder/Args 体系使用的动态参数类型。
#[derive(Clone)]
pub enum Arg {
    Value(SqlValue),
    Raw(String),
    /// List/Tuple 的统一表示。
    List {
        args: Vec<Arg>,
        is_tuple: bool,
    },
    /// 嵌套 builder，编译时原地展开，参数顺延。
    Builder(Box<dyn Builder>),
}

impl Arg {
    pub fn builder(b: impl Builder + 'static) -> Self {
        Self::Builder(Box::new(b))
    }
}

impl std::fmt::Debug for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Raw(v) => f.debug_tuple("Raw").field(v).finish(),
            Self::List { args, is_tuple } => f
                .debug_struct("List")
                .field("args", args)
                .field("is_tuple", is_tuple)
                .finish(),
            Self::Builder(_) => f.write_str("Builder(..)"),
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Raw(a), Self::Raw(b)) => a == b,
            (
                Self::List {
                    args: a,
                    is_tuple: at,
                },
                Self::List {
                    args: b,
                    is_tuple: bt,
                },
            ) => at == bt && a == b,
            _ => false,
        }
    }
}

/// 可嵌套构建 SQL 的对象：把自身渲染进 SQL，并返回累积的参数。
///
/// `initial_arg` 是外层已经收集的参数；实现必须把它们原样放在返回值的最前面，
/// 这样 PostgreSQL 的 `$n` 编号才能跨片段连续。
pub trait Builder: DynClone {
    fn build(&self) -> Result<(String, Vec<Arg>), BuildError> {
        self.build_with_flavor(self.flavor(), &[])
    }

    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError>;

    fn flavor(&self) -> Flavor {
        Flavor::default()
    }
}

dyn_clone::clone_trait_object!(Builder);

impl Builder for Box<dyn Builder> {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        (**self).build_with_flavor(flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        (**self).flavor()
    }
}

impl From<Box<dyn Builder>> for Arg {
    fn from(v: Box<dyn Builder>) -> Self {
        Self::Builder(v)
    }
}

impl From<SqlValue> for Arg {
    fn from(v: SqlValue) -> Self {
        Self::Value(v)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        SqlValue::I64(v).into()
    }
}
impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        SqlValue::I64(v as i64).into()
    }
}
impl From<u64> for Arg {
    fn from(v: u64) -> Self {
        SqlValue::U64(v).into()
    }
}
impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v).into()
    }
}
impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        SqlValue::F64(v).into()
    }
}
impl From<&'static str> for Arg {
    fn from(v: &'static str) -> Self {
        SqlValue::from(v).into()
    }
}
impl From<String> for Arg {
    fn from(v: String) -> Self {
        SqlValue::from(v).into()
    }
}
impl From<Vec<u8>> for Arg {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v).into()
    }
}
impl From<time::OffsetDateTime> for Arg {
    fn from(v: time::OffsetDateTime) -> Self {
        SqlValue::from(v).into()
    }
}

impl<T> From<Option<T>> for Arg
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        SqlValue::from_option(v).into()
    }
}

/// 编译后的参数只应剩下 `Arg::Value`，转换成驱动可绑定的值。
pub fn into_values(args: Vec<Arg>) -> Result<Vec<SqlValue>, BuildError> {
    args.into_iter()
        .map(|a| match a {
            Arg::Value(v) => Ok(v),
            Arg::Raw(_) => Err(BuildError::UnsupportedArg("raw")),
            Arg::List { .. } => Err(BuildError::UnsupportedArg("list")),
            Arg::Builder(_) => Err(BuildError::UnsupportedArg("builder")),
        })
        .collect()
}

/// 递归展开成参数列表；元组用于 `Values::row((1, "a"))` 这类异构行。
pub trait FlattenIntoArgs {
    fn flatten_into(self, out: &mut Vec<Arg>);
}

impl<T: Into<Arg>> FlattenIntoArgs for T {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        out.push(self.into());
    }
}

/// 无参数。
impl FlattenIntoArgs for () {
    fn flatten_into(self, _out: &mut Vec<Arg>) {}
}

impl<T: FlattenIntoArgs> FlattenIntoArgs for Vec<T> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.flatten_into(out);
        }
    }
}

impl<T: FlattenIntoArgs, const N: usize> FlattenIntoArgs for [T; N] {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.flatten_into(out);
        }
    }
}

macro_rules! impl_flatten_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Arg>),+> FlattenIntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn flatten_into(self, out: &mut Vec<Arg>) {
                let ($($name,)+) = self;
                $(out.push($name.into());)+
            }
        }
    };
}

impl_flatten_tuple!(A, B);
impl_flatten_tuple!(A, B, C);
impl_flatten_tuple!(A, B, C, D);
impl_flatten_tuple!(A, B, C, D, E);
impl_flatten_tuple!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape() {
        assert_eq!(escape("foo"), "foo");
        assert_eq!(escape("$foo"), "$$foo");
        assert_eq!(escape_all(["a", "$b"]), vec!["a".to_string(), "$$b".to_string()]);
    }

    #[test]
    fn flatten_tuple_keeps_order() {
        let args = flatten((1_i64, "v_1", true));
        assert_eq!(
            args,
            vec![Arg::from(1_i64), Arg::from("v_1"), Arg::from(true)]
        );
    }

    #[test]
    fn tuple_marks_list() {
        match tuple([1_i64, 2, 3]) {
            Arg::List { args, is_tuple } => {
                assert!(is_tuple);
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }
}
