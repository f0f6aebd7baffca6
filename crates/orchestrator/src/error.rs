#![forbid(unsafe_code)]

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("value out of range for column {column}: {value}")]
    OutOfRange { column: &'static str, value: i64 },

    #[error("snapshot at revision {0} was not persisted")]
    SaveFailed(u64),

    #[error("persistence worker is gone")]
    WorkerGone,
}
