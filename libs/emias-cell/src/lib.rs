pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::EmiasError;
pub use models::*;
pub use services::*;
pub use router::emias_routes;
