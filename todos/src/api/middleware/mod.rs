pub mod auth;
pub mod https;
pub mod identity;
