//! Reusable gadgets for the identity circuits
//!
//! - `RangeCheckChip`: Range checks using lookup tables
//! - `ComparisonChip`: Boolean-output `>=` / `<=`
//! - `IsEqualChip`: Boolean-output equality and non-zero tests
//! - `AggregateChip`: Running sum of boolean sub-checks
//! - `PoseidonChip`: Poseidon hash for nullifiers and commitments

pub mod aggregate;
pub mod comparison;
pub mod is_equal;
pub mod poseidon;
pub mod range_check;

pub use aggregate::{AggregateChip, AggregateConfig};
pub use comparison::{ComparisonChip, ComparisonConfig, ComparisonInstruction};
pub use is_equal::{IsEqualChip, IsEqualConfig};
pub use poseidon::{poseidon_hash, PoseidonChip, PoseidonConfig};
pub use range_check::{RangeCheckChip, RangeCheckConfig, RangeCheckInstruction};
