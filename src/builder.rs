//! 自由拼接的 builder：`build` 使用 `$n` 语法，`expr` 使用 `?` 语法。

use crate::args::Args;
use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::modifiers::{Arg, Builder, FlattenIntoArgs, flatten};

#[derive(Debug, Clone)]
struct CompiledBuilder {
    args: Args,
    format: String,
    err: Option<BuildError>,
}

impl Builder for CompiledBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        self.args
            .compile_with_flavor(&self.format, flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.args.flavor
    }
}

#[derive(Clone)]
struct FlavoredBuilder {
    inner: Box<dyn Builder>,
    flavor: Flavor,
}

impl Builder for FlavoredBuilder {
    fn build_with_flavor(
        &self,
        flavor: Flavor,
        initial_arg: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        self.inner.build_with_flavor(flavor, initial_arg)
    }

    fn flavor(&self) -> Flavor {
        self.flavor
    }
}

/// WithFlavor：给 builder 绑定默认 flavor（只影响 `build()`）。
pub fn with_flavor(builder: impl Builder + 'static, flavor: Flavor) -> Box<dyn Builder> {
    Box::new(FlavoredBuilder {
        inner: Box::new(builder),
        flavor,
    })
}

/// Build：使用 `$` 特殊语法构建 builder，`$0` 引用第一个参数。
pub fn build(
    format: impl Into<String>,
    args_in: impl IntoIterator<Item = impl Into<Arg>>,
) -> Box<dyn Builder> {
    let mut args = Args::default();
    for a in args_in {
        args.add(a);
    }
    Box::new(CompiledBuilder {
        args,
        format: format.into(),
        err: None,
    })
}

/// Expr：`?` 风格的表达式，例如 `expr("count + ?", 1)`。
///
/// 参数个数与 `?` 个数不一致时，错误会在渲染时返回。
pub fn expr(sql: &str, values: impl FlattenIntoArgs) -> Box<dyn Builder> {
    let mut args = Args::default();
    let (format, err) = match args.expand(sql, flatten(values)) {
        Ok(format) => (format, None),
        Err(e) => (String::new(), Some(e)),
    };
    Box::new(CompiledBuilder { args, format, err })
}
