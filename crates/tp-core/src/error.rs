use thiserror::Error;

pub type TpResult<T> = Result<T, TpError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TpError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },
}
