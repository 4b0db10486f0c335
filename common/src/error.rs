//! 错误类型定义

use thiserror::Error;

/// 公共错误类型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown report kind: {0}")]
    UnknownKind(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
