pub mod dto;
pub mod error;
pub mod handlers;
pub mod observer;
pub mod routes;

pub use observer::InvocationCounter;
pub use routes::create_router;
