//! Core pipeline orchestration and domain logic for Wordy.
//!
//! This crate ties together discovery, fetching, word frequencies, text
//! generation, and document compilation into one end-to-end run
//! ([`pipeline::run_analysis`]).

pub mod compiler;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod render;
