//! Args：存储参数，把 `?` 表达式展开成 `$n` 语法，再把 `$n` 编译成最终 SQL。

use crate::error::BuildError;
use crate::flavor::Flavor;
use crate::modifiers::Arg;
use crate::string_builder::StringBuilder;

/// Args 存储 SQL 相关参数。
///
/// format 语法：`$0`/`$1` 引用第 n 个参数，`$?` 引用“上一个引用之后”的参数，`$$` 输出 `$`。
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// 默认 flavor，用于 `compile`。
    pub flavor: Flavor,

    pub(crate) arg_values: Vec<Arg>,
}

impl Args {
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            arg_values: Vec::new(),
        }
    }

    /// Add：追加一个参数并返回内部占位符（`$0/$1/...`）。
    pub fn add(&mut self, arg: impl Into<Arg>) -> String {
        let idx = self.arg_values.len();
        self.arg_values.push(arg.into());
        format!("${idx}")
    }

    pub fn len(&self) -> usize {
        self.arg_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arg_values.is_empty()
    }

    /// Expand：把 `?` 风格表达式改写成 `$n` 风格，并登记参数。
    ///
    /// 单引号内的 `?` 原样保留；原有的 `$` 会被转义成 `$$`。
    /// 嵌套 builder 参数渲染为 `(sub-query)`。
    pub fn expand(
        &mut self,
        expr: &str,
        values: impl IntoIterator<Item = Arg>,
    ) -> Result<String, BuildError> {
        let values: Vec<Arg> = values.into_iter().collect();
        let expected = count_placeholders(expr);
        if expected != values.len() {
            return Err(BuildError::ArgCountMismatch {
                expr: expr.to_string(),
                expected,
                got: values.len(),
            });
        }

        let mut out = String::with_capacity(expr.len());
        let mut values = values.into_iter();
        let mut quoted = false;
        for c in expr.chars() {
            match c {
                '\'' => {
                    quoted = !quoted;
                    out.push(c);
                }
                '$' => out.push_str("$$"),
                '?' if !quoted => {
                    let Some(v) = values.next() else {
                        break;
                    };
                    if matches!(v, Arg::Builder(_)) {
                        out.push('(');
                        out.push_str(&self.add(v));
                        out.push(')');
                    } else {
                        out.push_str(&self.add(v));
                    }
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }

    /// Compile：按默认 flavor 编译 format。
    pub fn compile(
        &self,
        format: &str,
        initial_value: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        self.compile_with_flavor(format, self.flavor, initial_value)
    }

    /// CompileWithFlavor：编译 format，并用 `flavor` 输出最终占位符。
    ///
    /// `initial_value` 会原样出现在返回参数的最前面，新占位符从它之后编号。
    pub fn compile_with_flavor(
        &self,
        format: &str,
        flavor: Flavor,
        initial_value: &[Arg],
    ) -> Result<(String, Vec<Arg>), BuildError> {
        let mut offset = 0usize;
        let mut ctx = CompileContext {
            buf: StringBuilder::new(),
            flavor,
            values: initial_value.to_vec(),
        };

        let mut rest = format;
        while let Some(pos) = rest.find('$') {
            if pos > 0 {
                ctx.buf.write_str(&rest[..pos]);
            }
            rest = &rest[pos + 1..];

            let Some(&b0) = rest.as_bytes().first() else {
                ctx.buf.write_char('$');
                break;
            };
            match b0 {
                b'$' => {
                    ctx.buf.write_char('$');
                    rest = &rest[1..];
                }
                b'0'..=b'9' => {
                    let end = rest
                        .bytes()
                        .position(|b| !b.is_ascii_digit())
                        .unwrap_or(rest.len());
                    let pointer = rest[..end]
                        .parse::<usize>()
                        .map_err(|_| BuildError::InvalidArgRef(usize::MAX))?;
                    rest = &rest[end..];
                    offset = self.compile_successive(&mut ctx, pointer)?;
                }
                b'?' => {
                    rest = &rest[1..];
                    offset = self.compile_successive(&mut ctx, offset)?;
                }
                _ => ctx.buf.write_char('$'),
            }
        }

        if !rest.is_empty() {
            ctx.buf.write_str(rest);
        }

        Ok((ctx.buf.into_string(), ctx.values))
    }

    fn compile_successive(
        &self,
        ctx: &mut CompileContext,
        offset: usize,
    ) -> Result<usize, BuildError> {
        let arg = self
            .arg_values
            .get(offset)
            .ok_or(BuildError::InvalidArgRef(offset))?;
        ctx.write_value(arg)?;
        Ok(offset + 1)
    }
}

fn count_placeholders(expr: &str) -> usize {
    let mut quoted = false;
    let mut n = 0;
    for c in expr.chars() {
        match c {
            '\'' => quoted = !quoted,
            '?' if !quoted => n += 1,
            _ => {}
        }
    }
    n
}

#[derive(Debug)]
struct CompileContext {
    buf: StringBuilder,
    flavor: Flavor,
    values: Vec<Arg>,
}

impl CompileContext {
    fn write_value(&mut self, arg: &Arg) -> Result<(), BuildError> {
        match arg {
            Arg::Builder(b) => {
                let (sql, args) = b.build_with_flavor(self.flavor, &self.values)?;
                self.buf.write_str(&sql);
                self.values = args;
            }
            Arg::Raw(expr) => self.buf.write_str(expr),
            Arg::List { args, is_tuple } => {
                if *is_tuple {
                    self.buf.write_char('(');
                }
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.buf.write_str(", ");
                    }
                    self.write_value(a)?;
                }
                if *is_tuple {
                    self.buf.write_char(')');
                }
            }
            Arg::Value(_) => {
                let idx = self.values.len() + 1;
                self.buf.write_str(&self.flavor.placeholder(idx));
                self.values.push(arg.clone());
            }
        }
        Ok(())
    }
}
