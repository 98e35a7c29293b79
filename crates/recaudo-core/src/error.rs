use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Station cleaning failed: {0}")]
    Stations(#[from] crate::stations::StationCleanError),

    #[error("Stratum assignment failed: {0}")]
    Strata(#[from] crate::strata::StrataAssignError),

    #[error("Transaction cleaning failed: {0}")]
    Transactions(#[from] crate::transactions::TransactionCleanError),

    #[error("Stratum block layer load failed: {0}")]
    Blocks(#[from] crate::blocks::BlockLoadError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
