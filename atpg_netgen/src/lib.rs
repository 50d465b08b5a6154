//! Random gate-level netlist generation for exercising `atpg_core` over
//! structurally varied circuits.

pub mod random_network;

pub use random_network::{RandomNetConfig, RandomNetwork};
