pub mod health;
pub mod materialized;
