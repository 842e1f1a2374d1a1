//! SQL Flavor：控制占位符与标识符 Quote 风格。

use std::fmt;

/// 支持的 SQL 风格。没有全局默认值，`Flavor::default()` 恒为 MySQL。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    #[default]
    MySQL,
    PostgreSQL,
    SQLite,
    SQLServer,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::SQLite => "SQLite",
            Self::SQLServer => "SQLServer",
        };
        f.write_str(s)
    }
}

impl Flavor {
    /// 为标识符加引号。
    pub fn quote(self, name: &str) -> String {
        match self {
            Self::MySQL => format!("`{name}`"),
            Self::PostgreSQL | Self::SQLite | Self::SQLServer => format!("\"{name}\""),
        }
    }

    /// 第 `idx` 个（从 1 开始）参数的占位符。
    pub fn placeholder(self, idx: usize) -> String {
        match self {
            Self::MySQL | Self::SQLite => "?".to_string(),
            Self::PostgreSQL => format!("${idx}"),
            Self::SQLServer => format!("@p{idx}"),
        }
    }

    /// RETURNING、`greatest`、`translate` 只在 Postgres 家族上原生可用。
    pub fn is_postgres_family(self) -> bool {
        matches!(self, Self::PostgreSQL)
    }
}
