pub mod chat;
pub mod knowledge;
pub mod marketing;
pub mod profile;
pub mod prompt;
pub mod user;
