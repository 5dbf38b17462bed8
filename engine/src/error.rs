//! StreamSeal 错误类型
//!
//! 所有错误对当前调用都是终止性的：引擎内部不重试、不自动纠正，
//! 调用方可以整体重试（例如重新输入密码）。
//!
//! 流式接口通过 `std::io::Read` 暴露，错误会被包装进 `io::Error`
//! 传递出去，再由 `From<io::Error>` 无损还原。

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamSealError {
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// Header 中的 KDF 成本低于配置的下限（防降级）
    #[error("KDF parameters below the configured minimum: {0}")]
    WeakParameter(String),

    #[error("unsupported StreamSeal version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// 密码错误与数据篡改刻意不加区分
    #[error("authentication failed: wrong secret or tampered data")]
    Authentication,

    #[error("truncated container: input ended before the final chunk")]
    TruncatedContainer,

    #[error("secret must not be empty")]
    EmptySecret,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 流已进入 Failed 状态后再次读取
    #[error("stream aborted after an earlier failure")]
    Aborted,

    #[error("internal error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, StreamSealError>;

impl StreamSealError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }
}

impl From<io::Error> for StreamSealError {
    fn from(err: io::Error) -> Self {
        let wraps_engine_error = err
            .get_ref()
            .is_some_and(|inner| inner.is::<StreamSealError>());

        if !wraps_engine_error {
            return Self::Io(err);
        }

        match err.into_inner().map(|inner| inner.downcast::<StreamSealError>()) {
            Some(Ok(inner)) => *inner,
            _ => Self::Internal,
        }
    }
}

impl From<StreamSealError> for io::Error {
    fn from(err: StreamSealError) -> Self {
        let kind = match &err {
            StreamSealError::Io(inner) => inner.kind(),
            StreamSealError::TruncatedContainer => io::ErrorKind::UnexpectedEof,
            StreamSealError::EmptySecret | StreamSealError::InvalidConfig(_) => {
                io::ErrorKind::InvalidInput
            }
            StreamSealError::Internal | StreamSealError::Aborted => io::ErrorKind::Other,
            _ => io::ErrorKind::InvalidData,
        };

        match err {
            StreamSealError::Io(inner) => inner,
            other => io::Error::new(kind, other),
        }
    }
}
