pub mod appointment;
pub mod error;

pub use appointment::*;
pub use error::AppError;
