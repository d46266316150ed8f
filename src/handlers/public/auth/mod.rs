// handlers/public/auth/mod.rs - Token acquisition and password reset

pub mod password_reset;
pub mod token;

pub use password_reset::{confirm_password_reset, reset_password};
pub use token::login;
