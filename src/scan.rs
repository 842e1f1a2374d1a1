//! Scan：把驱动返回的 `SqlValue` 行转换成 Rust 值。只做值转换，不做结构体映射。

use crate::value::SqlValue;

/// 扫描/转换错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("dbx cannot convert {from} into {to}")]
    TypeMismatch {
        from: &'static str,
        to: &'static str,
    },
    #[error("dbx value out of range for {0}")]
    OutOfRange(&'static str),
    #[error("dbx query returned no rows")]
    NoRows,
    #[error("dbx column index {0} out of range")]
    ColumnIndex(usize),
    #[error("dbx unknown column {0}")]
    UnknownColumn(String),
}

/// 查询结果：列名 + 行。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn first(&self) -> Option<Row<'_>> {
        self.iter().next()
    }
}

/// 单行视图。
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> Row<'a> {
    pub fn values(&self) -> &'a [SqlValue] {
        self.values
    }

    /// 按下标取值。
    pub fn get<T: FromSqlValue>(&self, idx: usize) -> Result<T, ScanError> {
        let v = self.values.get(idx).ok_or(ScanError::ColumnIndex(idx))?;
        T::from_sql_value(v)
    }

    /// 按列名取值。
    pub fn get_by_name<T: FromSqlValue>(&self, name: &str) -> Result<T, ScanError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ScanError::UnknownColumn(name.to_string()))?;
        self.get(idx)
    }
}

/// 从单元格值转换。
pub trait FromSqlValue: Sized {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError>;
}

fn mismatch<T>(v: &SqlValue, to: &'static str) -> Result<T, ScanError> {
    Err(ScanError::TypeMismatch { from: v.kind(), to })
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        Ok(v.clone())
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        match v {
            SqlValue::I64(n) => Ok(*n),
            SqlValue::U64(n) => i64::try_from(*n).map_err(|_| ScanError::OutOfRange("i64")),
            SqlValue::Bool(b) => Ok(i64::from(*b)),
            SqlValue::String(s) => s.parse().map_err(|_| ScanError::TypeMismatch {
                from: "string",
                to: "i64",
            }),
            _ => mismatch(v, "i64"),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        let n = i64::from_sql_value(v)?;
        i32::try_from(n).map_err(|_| ScanError::OutOfRange("i32"))
    }
}

impl FromSqlValue for u64 {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        match v {
            SqlValue::U64(n) => Ok(*n),
            SqlValue::I64(n) => u64::try_from(*n).map_err(|_| ScanError::OutOfRange("u64")),
            _ => mismatch(v, "u64"),
        }
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        match v {
            SqlValue::F64(n) => Ok(*n),
            SqlValue::I64(n) => Ok(*n as f64),
            _ => mismatch(v, "f64"),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        match v {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::I64(n) => Ok(*n != 0),
            _ => mismatch(v, "bool"),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        match v {
            SqlValue::String(s) => Ok(s.to_string()),
            SqlValue::Bytes(b) => String::from_utf8(b.clone()).map_err(|_| ScanError::TypeMismatch {
                from: "bytes",
                to: "string",
            }),
            _ => mismatch(v, "string"),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        match v {
            SqlValue::Bytes(b) => Ok(b.clone()),
            SqlValue::String(s) => Ok(s.as_bytes().to_vec()),
            _ => mismatch(v, "bytes"),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(v: &SqlValue) -> Result<Self, ScanError> {
        if v.is_null() {
            return Ok(None);
        }
        T::from_sql_value(v).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Rows {
        Rows::new(
            vec!["id".into(), "value".into()],
            vec![
                vec![SqlValue::I64(1), SqlValue::from("v_1")],
                vec![SqlValue::I64(2), SqlValue::Null],
            ],
        )
    }

    #[test]
    fn row_get_by_index_and_name() {
        let rows = sample();
        let first = rows.first().unwrap();
        assert_eq!(first.get::<i64>(0).unwrap(), 1);
        assert_eq!(first.get_by_name::<String>("value").unwrap(), "v_1");
        assert_eq!(
            first.get::<i64>(5).unwrap_err(),
            ScanError::ColumnIndex(5)
        );
        assert_eq!(
            first.get_by_name::<i64>("nope").unwrap_err(),
            ScanError::UnknownColumn("nope".into())
        );
    }

    #[test]
    fn option_maps_null() {
        let rows = sample();
        let second = rows.iter().nth(1).unwrap();
        assert_eq!(second.get::<Option<String>>(1).unwrap(), None);
        assert_eq!(
            second.get::<String>(1).unwrap_err(),
            ScanError::TypeMismatch {
                from: "null",
                to: "string"
            }
        );
    }

    #[test]
    fn integer_conversions_check_range() {
        assert_eq!(i32::from_sql_value(&SqlValue::I64(i64::MAX)).unwrap_err(), ScanError::OutOfRange("i32"));
        assert_eq!(u64::from_sql_value(&SqlValue::I64(-1)).unwrap_err(), ScanError::OutOfRange("u64"));
        assert!(bool::from_sql_value(&SqlValue::I64(1)).unwrap());
    }
}
