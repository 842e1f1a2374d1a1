//! Dialect：插值与语句渲染需要的方言能力（Quote、字面量编码、占位符、Postgres 家族判断）。

use crate::error::InterpolateError;
use crate::flavor::Flavor;
use crate::interpolate;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::OwnedFormatItem;
use time::format_description::well_known::Rfc3339;

/// 方言能力。默认实现按 `flavor()` 分派，自定义方言只需覆盖关心的字面量编码。
///
/// 标识符引用与占位符由 Builder 按 Flavor 渲染，对应 `dyn Dialect` 上的
/// `quote_ident` 与 `placeholder`，不随自定义方言改变。
pub trait Dialect: fmt::Debug {
    /// 方言对应的 Flavor，决定引用符、占位符风格与插值扫描器。
    fn flavor(&self) -> Flavor;

    fn encode_string(&self, s: &str) -> String {
        interpolate::encode_string(self.flavor(), s)
    }

    fn encode_bool(&self, b: bool) -> String {
        interpolate::encode_bool(self.flavor(), b)
    }

    fn encode_bytes(&self, b: &[u8]) -> Result<String, InterpolateError> {
        interpolate::encode_bytes(self.flavor(), b)
    }

    fn encode_time(&self, t: &OffsetDateTime) -> Result<String, InterpolateError> {
        interpolate::encode_time(self.flavor(), t)
    }

    /// RETURNING/greatest/translate 等子句是否可以原生输出。
    fn is_postgres_family(&self) -> bool {
        self.flavor().is_postgres_family()
    }
}

impl Dialect for Flavor {
    fn flavor(&self) -> Flavor {
        *self
    }
}

// 不可覆盖：必须与 Args 编译出的 SQL 一致
impl<'a> dyn Dialect + 'a {
    pub fn quote_ident(&self, name: &str) -> String {
        self.flavor().quote(name)
    }

    /// 第 `idx` 个（从 1 开始）参数的占位符。
    pub fn placeholder(&self, idx: usize) -> String {
        self.flavor().placeholder(idx)
    }
}

/// 时间字面量格式。
#[derive(Debug, Clone, PartialEq)]
pub enum TimeLayout {
    /// `'2006-01-02T15:04:05Z'` 风格。
    Rfc3339,
    /// 自定义格式描述，按原时区输出。
    Custom(OwnedFormatItem),
}

impl TimeLayout {
    /// 解析 `time` 的格式描述（如 `[year]/[month]/[day]`）。
    pub fn parse(description: &str) -> Result<Self, InterpolateError> {
        time::format_description::parse_owned::<2>(description)
            .map(Self::Custom)
            .map_err(|e| InterpolateError::Format(e.to_string()))
    }

    fn format(&self, t: &OffsetDateTime) -> Result<String, time::error::Format> {
        match self {
            Self::Rfc3339 => t.format(&Rfc3339),
            Self::Custom(items) => t.format(items),
        }
    }
}

/// 包装一个基础方言，只改写时间字面量的编码，其余全部委托。
#[derive(Debug, Clone)]
pub struct TimeLayoutDialect<D> {
    inner: D,
    layout: TimeLayout,
}

impl<D: Dialect> TimeLayoutDialect<D> {
    pub fn new(inner: D, layout: TimeLayout) -> Self {
        Self { inner, layout }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Dialect> Dialect for TimeLayoutDialect<D> {
    fn flavor(&self) -> Flavor {
        self.inner.flavor()
    }

    fn encode_string(&self, s: &str) -> String {
        self.inner.encode_string(s)
    }

    fn encode_bool(&self, b: bool) -> String {
        self.inner.encode_bool(b)
    }

    fn encode_bytes(&self, b: &[u8]) -> Result<String, InterpolateError> {
        self.inner.encode_bytes(b)
    }

    fn encode_time(&self, t: &OffsetDateTime) -> Result<String, InterpolateError> {
        let s = self
            .layout
            .format(t)
            .map_err(|e| InterpolateError::Format(e.to_string()))?;
        Ok(self.inner.encode_string(&s))
    }

    fn is_postgres_family(&self) -> bool {
        self.inner.is_postgres_family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    #[test]
    fn flavor_dialect_defaults() {
        let d: &dyn Dialect = &Flavor::SQLite;
        assert_eq!(d.quote_ident("t"), "\"t\"");
        assert_eq!(d.encode_string("it's"), "'it''s'");
        assert_eq!(d.encode_bool(true), "1");
        assert_eq!(d.placeholder(3), "?");
        assert!(!d.is_postgres_family());
        assert!(Flavor::PostgreSQL.is_postgres_family());
    }

    #[test]
    fn time_layout_overrides_only_time() {
        let layout = TimeLayoutDialect::new(Flavor::PostgreSQL, TimeLayout::Rfc3339);
        let d: &dyn Dialect = &layout;
        let t = datetime!(2024-05-06 07:08:09 UTC);
        assert_eq!(d.encode_time(&t).unwrap(), "'2024-05-06T07:08:09Z'");
        assert_eq!(
            Flavor::PostgreSQL.encode_time(&t).unwrap(),
            "'2024-05-06 07:08:09.000000'"
        );

        assert_eq!(d.quote_ident("t"), "\"t\"");
        assert_eq!(d.encode_bool(false), "FALSE");
        assert_eq!(d.placeholder(2), "$2");
        assert!(d.is_postgres_family());
    }

    #[test]
    fn time_layout_custom_description() {
        let d = TimeLayoutDialect::new(Flavor::MySQL, TimeLayout::parse("[year]/[month]/[day]").unwrap());
        let t = datetime!(2024-05-06 07:08:09 +08:00);
        assert_eq!(d.encode_time(&t).unwrap(), "'2024/05/06'");
        assert!(TimeLayout::parse("[nope]").is_err());
    }

    #[derive(Debug)]
    struct Shouting;

    impl Dialect for Shouting {
        fn flavor(&self) -> Flavor {
            Flavor::SQLServer
        }

        fn encode_bool(&self, b: bool) -> String {
            if b { "YES" } else { "NO" }.to_string()
        }
    }

    #[test]
    fn custom_dialect_quotes_and_numbers_by_flavor() {
        let d: &dyn Dialect = &Shouting;
        assert_eq!(d.encode_bool(true), "YES");
        assert_eq!(d.quote_ident("t"), Flavor::SQLServer.quote("t"));
        assert_eq!(d.placeholder(2), "@p2");
        assert!(!d.is_postgres_family());
    }
}
