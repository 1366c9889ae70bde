//! Core types for Verity

mod login;
mod user;

pub use login::*;
pub use user::*;
