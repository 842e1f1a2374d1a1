//! SQL 插值：将 `sql` 中的占位符替换为方言编码后的字面量。
//!
//! 安全警告：插值永远不如预编译参数安全；这里只服务于驱动无法直接执行的语句
//! （带 WITH 的 UPDATE、带 ON CONFLICT 的 INSERT、UNION）以及 `to_sql` 调试输出。

use crate::dialect::Dialect;
use crate::error::{BuildError, InterpolateError};
use crate::flavor::Flavor;
use crate::modifiers::{Arg, Builder};
use crate::value::SqlValue;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub(crate) const TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// 按 `dialect` 把 `sql` 中的占位符替换为字面量。
pub fn interpolate(dialect: &dyn Dialect, sql: &str, args: &[Arg]) -> Result<String, InterpolateError> {
    match dialect.flavor() {
        Flavor::MySQL | Flavor::SQLite => mysql_like_interpolate(dialect, sql, args),
        Flavor::PostgreSQL => postgresql_interpolate(dialect, sql, args),
        Flavor::SQLServer => sqlserver_interpolate(dialect, sql, args),
    }
}

/// 渲染 builder 并插值成可直接执行的 SQL 字符串。
pub fn interpolate_builder(dialect: &dyn Dialect, builder: &dyn Builder) -> Result<String, BuildError> {
    let (sql, args) = builder.build_with_flavor(dialect.flavor(), &[])?;
    Ok(interpolate(dialect, &sql, &args)?)
}

fn mysql_like_interpolate(
    dialect: &dyn Dialect,
    query: &str,
    args: &[Arg],
) -> Result<String, InterpolateError> {
    let mut out = String::with_capacity(query.len() + args.len() * 20);
    let mut quote: Option<char> = None;
    let mut escaping = false;
    let mut arg_idx = 0usize;

    for c in query.chars() {
        if escaping {
            out.push(c);
            escaping = false;
            continue;
        }

        match c {
            '\\' if quote.is_some() => {
                out.push(c);
                escaping = true;
            }
            '\'' | '"' | '`' => {
                if quote == Some(c) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(c);
                }
                out.push(c);
            }
            '?' if quote.is_none() => {
                let arg = args.get(arg_idx).ok_or(InterpolateError::MissingArgs)?;
                encode_value(&mut out, arg, dialect)?;
                arg_idx += 1;
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// 解析 `bytes[start..]` 开头的十进制数（不接受前导 0），返回数值与结束位置。
fn scan_index(query: &str, start: usize) -> Option<(usize, usize)> {
    let bytes = query.as_bytes();
    if start >= bytes.len() || !bytes[start].is_ascii_digit() || bytes[start] == b'0' {
        return None;
    }
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let n = query[start..end].parse().ok()?;
    Some((n, end))
}

fn nth_arg(args: &[Arg], n: usize) -> Result<&Arg, InterpolateError> {
    if n == 0 {
        return Err(InterpolateError::MissingArgs);
    }
    args.get(n - 1).ok_or(InterpolateError::MissingArgs)
}

fn postgresql_interpolate(
    dialect: &dyn Dialect,
    query: &str,
    args: &[Arg],
) -> Result<String, InterpolateError> {
    let mut out = String::with_capacity(query.len() + args.len() * 20);
    // '\'' | '"' | '$'(dollar-quote)
    let mut quote: Option<char> = None;
    let mut dollar_quote: Option<&str> = None;

    let bytes = query.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'\'' | b'"' => {
                if quote == Some(c as char) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(c as char);
                }
                out.push(c as char);
                i += 1;
            }
            b'$' if quote == Some('$') => {
                if let Some(dq) = dollar_quote
                    && query[i..].starts_with(dq)
                {
                    out.push_str(dq);
                    i += dq.len();
                    quote = None;
                    dollar_quote = None;
                    continue;
                }
                out.push('$');
                i += 1;
            }
            b'$' if quote.is_none() => {
                if let Some((n, end)) = scan_index(query, i + 1) {
                    encode_value(&mut out, nth_arg(args, n)?, dialect)?;
                    i = end;
                    continue;
                }

                // dollar quote: $tag$
                let mut k = i + 1;
                while k < bytes.len() && bytes[k].is_ascii_alphabetic() {
                    k += 1;
                }
                if k < bytes.len() && bytes[k] == b'$' {
                    let dq = &query[i..=k];
                    out.push_str(dq);
                    quote = Some('$');
                    dollar_quote = Some(dq);
                    i = k + 1;
                    continue;
                }

                out.push('$');
                i += 1;
            }
            _ => {
                // 按 char 推进，保持多字节字符完整
                let ch = query[i..].chars().next().unwrap_or('\0');
                out.push(ch);
                i += ch.len_utf8().max(1);
            }
        }
    }

    Ok(out)
}

fn sqlserver_interpolate(
    dialect: &dyn Dialect,
    query: &str,
    args: &[Arg],
) -> Result<String, InterpolateError> {
    let mut out = String::with_capacity(query.len() + args.len() * 20);
    let mut quote: Option<char> = None;

    let bytes = query.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'\'' | b'"' => {
                if quote == Some(c as char) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(c as char);
                }
                out.push(c as char);
                i += 1;
            }
            // 只插值 @pN/@PN
            b'@' if quote.is_none()
                && matches!(bytes.get(i + 1), Some(b'p') | Some(b'P')) =>
            {
                if let Some((n, end)) = scan_index(query, i + 2) {
                    encode_value(&mut out, nth_arg(args, n)?, dialect)?;
                    i = end;
                    continue;
                }
                out.push('@');
                i += 1;
            }
            _ => {
                let ch = query[i..].chars().next().unwrap_or('\0');
                out.push(ch);
                i += ch.len_utf8().max(1);
            }
        }
    }

    Ok(out)
}

fn encode_value(out: &mut String, arg: &Arg, dialect: &dyn Dialect) -> Result<(), InterpolateError> {
    let Arg::Value(v) = arg else {
        return Err(InterpolateError::UnsupportedArgs);
    };
    match v {
        SqlValue::Null => out.push_str("NULL"),
        SqlValue::Bool(b) => out.push_str(&dialect.encode_bool(*b)),
        SqlValue::I64(n) => out.push_str(&n.to_string()),
        SqlValue::U64(n) => out.push_str(&n.to_string()),
        SqlValue::F64(n) => out.push_str(&n.to_string()),
        SqlValue::String(s) => out.push_str(&dialect.encode_string(s)),
        SqlValue::Bytes(b) => out.push_str(&dialect.encode_bytes(b)?),
        SqlValue::DateTime(dt) => out.push_str(&dialect.encode_time(dt)?),
    }
    Ok(())
}

/// 字符串字面量：MySQL 使用反斜杠转义，其余风格把 `'` 写成 `''`。
pub(crate) fn encode_string(flavor: Flavor, s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    match flavor {
        Flavor::MySQL => {
            out.push('\'');
            for ch in s.chars() {
                match ch {
                    '\u{0000}' => out.push_str("\\0"),
                    '\u{0008}' => out.push_str("\\b"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    '\u{001a}' => out.push_str("\\Z"),
                    '\'' => out.push_str("\\'"),
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    _ => out.push(ch),
                }
            }
            out.push('\'');
        }
        Flavor::PostgreSQL | Flavor::SQLite | Flavor::SQLServer => {
            if flavor == Flavor::SQLServer {
                out.push('N');
            }
            out.push('\'');
            out.push_str(&s.replace('\'', "''"));
            out.push('\'');
        }
    }
    out
}

pub(crate) fn encode_bool(flavor: Flavor, b: bool) -> String {
    let s = match (flavor, b) {
        (Flavor::PostgreSQL, true) => "TRUE",
        (Flavor::PostgreSQL, false) => "FALSE",
        (_, true) => "1",
        (_, false) => "0",
    };
    s.to_string()
}

pub(crate) fn encode_bytes(flavor: Flavor, data: &[u8]) -> Result<String, InterpolateError> {
    if data.is_empty() {
        return Ok("NULL".to_string());
    }

    let hex = to_hex(data);
    let s = match flavor {
        Flavor::MySQL | Flavor::SQLite => format!("X'{hex}'"),
        Flavor::PostgreSQL => format!("'\\x{hex}'::bytea"),
        Flavor::SQLServer => format!("0x{hex}"),
    };
    Ok(s)
}

fn to_hex(data: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(data.len() * 2);
    for &b in data {
        out.push(HEX[((b >> 4) & 0xF) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out
}

/// 时间字面量：统一换算到 UTC，四舍五入到微秒。
pub(crate) fn encode_time(flavor: Flavor, t: &OffsetDateTime) -> Result<String, InterpolateError> {
    let dt = (*t + time::Duration::nanoseconds(500)).to_offset(UtcOffset::UTC);
    let s = dt
        .format(TIME_FORMAT)
        .map_err(|e| InterpolateError::Format(e.to_string()))?;
    Ok(encode_string(flavor, &s))
}
