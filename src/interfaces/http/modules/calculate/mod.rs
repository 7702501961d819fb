//! `POST /api/v1/calculate`

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
