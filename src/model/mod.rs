pub mod admin;
pub mod api;
pub mod question;
pub mod score;
pub mod validate;
