//! Register allocation for the EP18R register VM backend.
//!
//! Two allocators share one contract, [`RegisterAllocator`]:
//!
//! - [`GraphColoringAllocator`] colors the interference graph of a whole
//!   function's [`LiveInterval`]s.
//! - [`LinearScanAllocator`] hands out registers incrementally while code
//!   generation walks the instructions, evicting to the stack when full.
//!
//! [`SymbolAllocator`] puts either one behind compiler symbols.

pub mod codegen;
pub mod error;
pub mod frame;
pub mod symbol;

pub use crate::{
    codegen::{
        adapter::SymbolAllocator,
        interference::InterferenceGraph,
        linear_scan::{AllocationPolicy, LinearScanAllocator},
        liveness::LiveInterval,
        reg_alloc::GraphColoringAllocator,
        Allocator, Location, RegisterAllocator, SpillSlot,
    },
    error::{Error, Result},
    frame::{Register, RegisterClass},
    symbol::{SymbolId, VariableSymbol},
};
