pub mod ascii;
pub mod assembler;
pub mod common;
pub mod conversion;
pub mod database;
pub mod domain;
pub mod extract;
pub mod layout;
pub mod metadata;
pub mod store;
pub mod transcribe;
