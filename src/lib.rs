pub mod config;
pub mod error;
pub mod request;
pub mod routing;
pub mod types;
pub mod validate;

pub use error::ContractError;
pub type Result<T> = std::result::Result<T, ContractError>;
