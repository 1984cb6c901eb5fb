pub mod auth;
pub mod request_logger;

pub use auth::AuthenticatedOwner;
pub use request_logger::request_logger_middleware;
