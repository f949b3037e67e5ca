// src/services/mod.rs

pub mod roster;
pub mod scoring;
pub mod selector;
pub mod submission;
pub mod violations;
