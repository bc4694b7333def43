use std::fmt::Display;

use crate::{
    error::{Error, Result},
    frame::{self, Register},
};

pub mod adapter;
pub mod color;
pub mod graph;
pub mod interference;
pub mod linear_scan;
pub mod liveness;
pub mod reg_alloc;

use self::{
    linear_scan::{AllocationPolicy, LinearScanAllocator},
    reg_alloc::GraphColoringAllocator,
};

/// Index of a stack slot in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpillSlot(u32);

impl SpillSlot {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    /// Offset of the slot from `fp`.
    pub fn frame_offset(self) -> i32 {
        frame::local_offset(self.0)
    }
}

impl Display for SpillSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {} (fp{:+})", self.0, self.frame_offset())
    }
}

/// Where a variable lives after allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Register(Register),
    Spilled(SpillSlot),
}

impl Location {
    /// Numeric form handed to code generators: the register id, or
    /// `-1 - slot` for a spilled variable.
    pub fn encode(self) -> i32 {
        match self {
            Location::Register(reg) => reg.id() as i32,
            Location::Spilled(slot) => -1 - slot.index() as i32,
        }
    }

    pub fn register(self) -> Option<Register> {
        match self {
            Location::Register(reg) => Some(reg),
            Location::Spilled(_) => None,
        }
    }

    pub fn spill_slot(self) -> Option<SpillSlot> {
        match self {
            Location::Register(_) => None,
            Location::Spilled(slot) => Some(slot),
        }
    }

    pub fn is_spilled(self) -> bool {
        matches!(self, Location::Spilled(_))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Register(reg) => write!(f, "{}", reg),
            Location::Spilled(slot) => write!(f, "{}", slot),
        }
    }
}

/// What code generators need from a register allocator. `V` is the key
/// variables are addressed by: plain names for the allocators themselves,
/// compiler symbols behind `adapter::SymbolAllocator`.
pub trait RegisterAllocator<V: ?Sized = str> {
    fn allocate_register(&mut self, var: &V) -> Result<Location>;

    fn register(&self, var: &V) -> Option<Register>;

    /// Slot of a variable that currently lives on the stack.
    fn spill_slot(&self, var: &V) -> Option<SpillSlot>;

    /// `fp`-relative offset of the variable's slot. The compact `-1 - slot`
    /// form is `Location::encode`.
    fn stack_offset(&self, var: &V) -> Option<i32> {
        self.spill_slot(var).map(SpillSlot::frame_offset)
    }

    fn is_spilled(&self, var: &V) -> bool;

    /// Afterwards the variable reports neither a register nor a stack
    /// slot until it is allocated again. Unknown variables are ignored.
    fn free_register(&mut self, var: &V) -> Result<()>;

    fn reset(&mut self);

    fn allocated_register_count(&self) -> usize;

    fn report(&self) -> String;
}

pub(crate) fn check_name(var: &str) -> Result<()> {
    if var.is_empty() {
        return Err(Error::EmptyVariableName);
    }
    Ok(())
}

/// Either allocator behind one value, for callers that pick the strategy
/// at run time.
#[derive(Debug, Clone)]
pub enum Allocator {
    LinearScan(LinearScanAllocator),
    GraphColoring(GraphColoringAllocator),
}

impl Allocator {
    pub fn linear_scan() -> Self {
        Allocator::LinearScan(LinearScanAllocator::new())
    }

    pub fn linear_scan_with(policy: AllocationPolicy) -> Self {
        Allocator::LinearScan(LinearScanAllocator::with_policy(policy))
    }

    pub fn graph_coloring() -> Self {
        Allocator::GraphColoring(GraphColoringAllocator::new())
    }

    pub fn as_linear_scan_mut(&mut self) -> Option<&mut LinearScanAllocator> {
        match self {
            Allocator::LinearScan(alloc) => Some(alloc),
            Allocator::GraphColoring(_) => None,
        }
    }

    pub fn as_graph_coloring_mut(&mut self) -> Option<&mut GraphColoringAllocator> {
        match self {
            Allocator::LinearScan(_) => None,
            Allocator::GraphColoring(alloc) => Some(alloc),
        }
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::linear_scan()
    }
}

impl RegisterAllocator for Allocator {
    fn allocate_register(&mut self, var: &str) -> Result<Location> {
        match self {
            Allocator::LinearScan(alloc) => alloc.allocate_register(var),
            Allocator::GraphColoring(alloc) => alloc.allocate_register(var),
        }
    }

    fn register(&self, var: &str) -> Option<Register> {
        match self {
            Allocator::LinearScan(alloc) => RegisterAllocator::register(alloc, var),
            Allocator::GraphColoring(alloc) => RegisterAllocator::register(alloc, var),
        }
    }

    fn spill_slot(&self, var: &str) -> Option<SpillSlot> {
        match self {
            Allocator::LinearScan(alloc) => RegisterAllocator::spill_slot(alloc, var),
            Allocator::GraphColoring(alloc) => RegisterAllocator::spill_slot(alloc, var),
        }
    }

    fn is_spilled(&self, var: &str) -> bool {
        match self {
            Allocator::LinearScan(alloc) => RegisterAllocator::is_spilled(alloc, var),
            Allocator::GraphColoring(alloc) => RegisterAllocator::is_spilled(alloc, var),
        }
    }

    fn free_register(&mut self, var: &str) -> Result<()> {
        match self {
            Allocator::LinearScan(alloc) => alloc.free_register(var),
            Allocator::GraphColoring(alloc) => alloc.free_register(var),
        }
    }

    fn reset(&mut self) {
        match self {
            Allocator::LinearScan(alloc) => RegisterAllocator::reset(alloc),
            Allocator::GraphColoring(alloc) => RegisterAllocator::reset(alloc),
        }
    }

    fn allocated_register_count(&self) -> usize {
        match self {
            Allocator::LinearScan(alloc) => RegisterAllocator::allocated_register_count(alloc),
            Allocator::GraphColoring(alloc) => RegisterAllocator::allocated_register_count(alloc),
        }
    }

    fn report(&self) -> String {
        match self {
            Allocator::LinearScan(alloc) => RegisterAllocator::report(alloc),
            Allocator::GraphColoring(alloc) => RegisterAllocator::report(alloc),
        }
    }
}
