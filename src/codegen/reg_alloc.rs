use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Write as _,
};

use itertools::Itertools;
use log::{debug, warn};

use crate::{
    error::{Error, Result},
    frame::{Register, ALLOCATABLE, NUM_ALLOCATABLE},
};

use super::{
    check_name,
    color::{self, Color, Coloring},
    interference::InterferenceGraph,
    liveness::LiveInterval,
    Location, RegisterAllocator, SpillSlot,
};

/// Allocator over a whole function's live intervals. Every allocation
/// request re-colors the interference graph with one color per allocatable
/// register; color `c` is register `ALLOCATABLE[c - 1]`.
#[derive(Debug, Clone, Default)]
pub struct GraphColoringAllocator {
    intervals: BTreeMap<String, LiveInterval>,
    interference: InterferenceGraph,
    var_to_reg: HashMap<String, Register>,
    // stack homes, stable for the allocator's lifetime
    spill_slots: HashMap<String, SpillSlot>,
    next_spill_slot: u32,
    // spill candidates of the latest pass over the current interval set
    spilled: HashSet<String>,
}

impl GraphColoringAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the interval set and rebuilds the interference graph. A
    /// later interval for the same variable wins. Register assignments and
    /// spill decisions made against the old set are dropped; a variable
    /// that spills again later gets its old slot back.
    pub fn set_live_intervals(&mut self, intervals: impl IntoIterator<Item = LiveInterval>) {
        self.intervals = intervals
            .into_iter()
            .map(|interval| (interval.var().to_string(), interval))
            .collect();
        self.interference = InterferenceGraph::build(self.intervals.values());
        self.var_to_reg.clear();
        self.spilled.clear();
        debug!("live intervals set for {} variables", self.intervals.len());
    }

    /// Runs one coloring pass with `k` colors and returns the variables it
    /// spilled, each of which now owns a stack slot.
    pub fn color_graph(&mut self, k: usize) -> Result<Vec<String>> {
        let coloring = self.run(k)?;
        Ok(coloring
            .spilled
            .iter()
            .map(|&id| self.interference.var(id).to_string())
            .collect())
    }

    pub fn allocate(&mut self, var: &str) -> Result<Location> {
        check_name(var)?;

        if let Some(&reg) = self.var_to_reg.get(var) {
            return Ok(Location::Register(reg));
        }
        let id = match self.interference.id(var) {
            Some(id) => id,
            None => {
                warn!("no live interval for `{}`", var);
                return Err(Error::MissingInterval(var.to_string()));
            }
        };

        let coloring = self.run(NUM_ALLOCATABLE)?;
        if let Some(&color) = coloring.colors.get(&id) {
            let reg = color_register(color);
            self.var_to_reg.insert(var.to_string(), reg);
            return Ok(Location::Register(reg));
        }

        self.spill_slots
            .get(var)
            .copied()
            .map(Location::Spilled)
            .ok_or_else(|| Error::MissingInterval(var.to_string()))
    }

    /// Forgets where `var` lives until it is allocated again.
    pub fn free(&mut self, var: &str) {
        if let Some(reg) = self.var_to_reg.remove(var) {
            debug!("released {} held by `{}`", reg, var);
        }
        self.spilled.remove(var);
    }

    pub fn register(&self, var: &str) -> Option<Register> {
        self.var_to_reg.get(var).copied()
    }

    /// Slot of a variable the latest pass spilled.
    pub fn spill_slot(&self, var: &str) -> Option<SpillSlot> {
        if !self.spilled.contains(var) || self.var_to_reg.contains_key(var) {
            return None;
        }
        self.spill_slots.get(var).copied()
    }

    pub fn is_spilled(&self, var: &str) -> bool {
        self.spill_slot(var).is_some()
    }

    /// Spill candidates of the latest pass.
    pub fn spilled_count(&self) -> usize {
        self.spilled.len()
    }

    /// Every stack home handed out since the last reset.
    pub fn spill_slots(&self) -> &HashMap<String, SpillSlot> {
        &self.spill_slots
    }

    pub fn live_intervals(&self) -> impl Iterator<Item = &LiveInterval> + '_ {
        self.intervals.values()
    }

    pub fn interference_graph(&self) -> &InterferenceGraph {
        &self.interference
    }

    pub fn allocated_register_count(&self) -> usize {
        self.var_to_reg.len()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
        debug!("graph coloring allocator reset");
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        // writing to a String cannot fail
        let _ = self.write_report(&mut s);
        s
    }

    fn write_report(&self, s: &mut String) -> std::fmt::Result {
        writeln!(
            s,
            "GraphColoringAllocator{{allocated={}, spilled={}}}",
            self.var_to_reg.len(),
            self.spilled.len()
        )?;
        writeln!(
            s,
            "Interference graph: {} vertices, {} edges",
            self.interference.node_count(),
            self.interference.edge_count()
        )?;
        for (var, reg) in self.var_to_reg.iter().sorted() {
            writeln!(s, "  {:<20} -> {}", var, reg)?;
        }
        for var in self.spilled.iter().sorted_by_key(|var| self.spill_slots.get(*var)) {
            if let Some(slot) = self.spill_slots.get(var) {
                writeln!(s, "  {:<20} -> {}", var, slot)?;
            }
        }
        Ok(())
    }

    fn run(&mut self, k: usize) -> Result<Coloring> {
        if k == 0 || k > NUM_ALLOCATABLE {
            return Err(Error::InvalidColorCount(k));
        }

        let coloring = color::color(&self.interference, k);
        self.spilled.clear();
        for &id in &coloring.spilled {
            let var = self.interference.var(id);
            self.spilled.insert(var.to_string());
            if !self.spill_slots.contains_key(var) {
                let slot = SpillSlot::new(self.next_spill_slot);
                self.next_spill_slot += 1;
                self.spill_slots.insert(var.to_string(), slot);
                debug!("spilled `{}` to {}", var, slot);
            }
        }
        Ok(coloring)
    }
}

fn color_register(color: Color) -> Register {
    ALLOCATABLE[color - 1]
}

impl RegisterAllocator for GraphColoringAllocator {
    fn allocate_register(&mut self, var: &str) -> Result<Location> {
        self.allocate(var)
    }

    fn register(&self, var: &str) -> Option<Register> {
        GraphColoringAllocator::register(self, var)
    }

    fn spill_slot(&self, var: &str) -> Option<SpillSlot> {
        GraphColoringAllocator::spill_slot(self, var)
    }

    fn is_spilled(&self, var: &str) -> bool {
        GraphColoringAllocator::is_spilled(self, var)
    }

    fn free_register(&mut self, var: &str) -> Result<()> {
        check_name(var)?;
        self.free(var);
        Ok(())
    }

    fn reset(&mut self) {
        GraphColoringAllocator::reset(self)
    }

    fn allocated_register_count(&self) -> usize {
        GraphColoringAllocator::allocated_register_count(self)
    }

    fn report(&self) -> String {
        GraphColoringAllocator::report(self)
    }
}
