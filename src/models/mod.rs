// src/models/mod.rs

pub mod intent;
pub mod response;
pub mod survey;
