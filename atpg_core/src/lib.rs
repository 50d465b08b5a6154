//! Gate-level automatic test pattern generation: structural fault scoping,
//! Tseitin CNF encoding of good and faulty circuit behavior, D-chain fault
//! propagation, and SAT-based detection with back-justification to a
//! primary-input test pattern.

pub mod cnf;
pub mod cone_builder;
pub mod config;
pub mod dchain;
pub mod dtpg_engine;
pub mod error;
pub mod extractor;
pub mod fault;
pub mod ffr_activation;
pub mod gate;
pub mod gate_encoder;
pub mod justifier;
pub mod mffc_encoding;
pub mod network;
pub mod stats;
pub mod structural_index;
pub mod val3;

pub use config::{Config, JustifyStrategy, ScopeMode};
pub use dtpg_engine::{DtpgEngine, DtpgResult};
pub use error::{AtpgError, Result};
pub use fault::{Fault, FaultId, FaultModel, FaultSet, FaultSite};
pub use gate::GateType;
pub use justifier::{NodeAssign, NodeValList};
pub use network::{NetworkBuilder, NetworkModel, NodeId, StorageId};
pub use stats::DtpgStats;
pub use structural_index::StructuralIndex;
pub use val3::Val3;
