// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   artifact.rs — The trained artifact bundle: model weights
//                 plus the training config, normalization
//                 parameters, rock-type encoding, and grid
//                 bounds that serving must replay exactly.
//
//   metrics.rs  — Epoch-level training metrics appended to a
//                 CSV file for later analysis.
//
// Reference: Rust Book §7 (Modules), §9 (Error Handling)

/// Model weight + preprocessing parameter persistence
pub mod artifact;

/// Training metrics CSV logger
pub mod metrics;
