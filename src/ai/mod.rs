pub mod catalog;
pub mod chat;
pub mod prompt;
pub mod provider;
