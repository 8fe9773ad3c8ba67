use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid period key '{0}': expected YYYY-MM")]
    InvalidPeriodKey(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
