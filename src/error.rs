//! 错误类型：构建期（BuildError）、插值期（InterpolateError）与执行期（DbError）。

use crate::scan::ScanError;

/// 驱动层返回的错误，保持不透明。
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// DbResult：本 crate 执行类 API 的统一返回值。
pub type DbResult<T> = Result<T, DbError>;

/// 插值错误：把占位符替换成字面量时失败。
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InterpolateError {
    #[error("dbx not enough args when interpolating")]
    MissingArgs,
    #[error("dbx unsupported args when interpolating")]
    UnsupportedArgs,
    #[error("dbx cannot format literal: {0}")]
    Format(String),
}

/// 构建错误：语句或片段渲染失败，属于调用方的编程错误，不会重试。
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("dbx invalid arg reference ${0}")]
    InvalidArgRef(usize),
    #[error("dbx expression `{expr}` expects {expected} args, got {got}")]
    ArgCountMismatch {
        expr: String,
        expected: usize,
        got: usize,
    },
    #[error("dbx VALUES needs at least one non-empty row")]
    EmptyValues,
    #[error("dbx {0} needs at least one argument")]
    EmptyArgs(&'static str),
    #[error("dbx translate needs equal-length sets, got {from} and {to} chars")]
    TranslateLength { from: usize, to: usize },
    #[error("dbx unsupported arg left after compiling: {0}")]
    UnsupportedArg(&'static str),
    #[error(transparent)]
    Interpolate(#[from] InterpolateError),
}

/// DbError：会话、事务与执行路径上的错误。
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// 驱动无法打开外层事务。
    #[error("dbx cannot start transaction: {0}")]
    TransactionStart(#[source] DriverError),

    #[error("dbx build statement: {0}")]
    Build(#[from] BuildError),

    /// 驱动拒绝或执行失败（含 commit/rollback 失败）。
    #[error("dbx driver: {0}")]
    DriverExec(#[source] DriverError),

    /// 当前 event receiver 不接受提交后回调，或事务已结束。
    #[error("dbx cannot register commit callback: {0}")]
    CallbackRegistration(String),

    #[error("dbx transaction has already been committed or rolled back")]
    TxDone,

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl DbError {
    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }
}
