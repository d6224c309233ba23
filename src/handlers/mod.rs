// src/handlers/mod.rs

pub mod session;
pub mod survey;
