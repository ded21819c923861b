// src/handlers/mod.rs

pub mod attempts;
pub mod stats;
pub mod transfer;
