use std::{
    collections::{HashMap, HashSet},
    fmt::Write as _,
};

use itertools::Itertools;
use log::{debug, warn};
use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

use crate::{
    error::{Error, Result},
    frame::{self, Register, RegisterClass, CALLEE_SAVED, CALLER_SAVED, NUM_REGISTERS},
};

use super::{check_name, Location, RegisterAllocator, SpillSlot};

static CALLEE_SAVED_FIRST: Lazy<Vec<Register>> = Lazy::new(|| {
    CALLEE_SAVED
        .iter()
        .chain(CALLER_SAVED.iter())
        .copied()
        .collect()
});

static CALLER_SAVED_FIRST: Lazy<Vec<Register>> = Lazy::new(|| {
    CALLER_SAVED
        .iter()
        .chain(CALLEE_SAVED.iter())
        .copied()
        .collect()
});

/// Which half of the register file `allocate` reaches for first. Within
/// each half registers are taken in ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
    /// s0-s4, then ra, a0-a5, lr.
    #[default]
    PreferCalleeSaved,
    /// ra, a0-a5, lr, then s0-s4.
    PreferCallerSaved,
}

impl AllocationPolicy {
    fn order(self) -> &'static [Register] {
        match self {
            AllocationPolicy::PreferCalleeSaved => &CALLEE_SAVED_FIRST,
            AllocationPolicy::PreferCallerSaved => &CALLER_SAVED_FIRST,
        }
    }
}

/// Incremental allocator driven by code generation order: every variable
/// use is allocated as it is visited, and when the register file is full
/// the longest-held variable is evicted to the stack.
#[derive(Debug, Clone)]
pub struct LinearScanAllocator {
    policy: AllocationPolicy,
    physical_regs: [Option<String>; NUM_REGISTERS],
    var_to_reg: HashMap<String, Register>,
    spill_slots: HashMap<String, SpillSlot>,
    next_spill_slot: u32,
    // register holders, oldest first
    held: Vec<String>,
    // bound by `force_allocate`; evicted only as a last resort
    pinned: HashSet<String>,
}

impl Default for LinearScanAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearScanAllocator {
    pub fn new() -> Self {
        Self::with_policy(AllocationPolicy::default())
    }

    pub fn with_policy(policy: AllocationPolicy) -> Self {
        Self {
            policy,
            physical_regs: Default::default(),
            var_to_reg: HashMap::new(),
            spill_slots: HashMap::new(),
            next_spill_slot: 0,
            held: Vec::new(),
            pinned: HashSet::new(),
        }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Returns the register already holding `var`, or binds a free one.
    /// Never fails for lack of registers: a held variable is spilled to
    /// make room instead.
    pub fn allocate(&mut self, var: &str) -> Result<Location> {
        check_name(var)?;

        if let Some(&reg) = self.var_to_reg.get(var) {
            return Ok(Location::Register(reg));
        }

        let mut reg = self.find_available_register();
        if reg.is_none() {
            if let Some(victim) = self.select_victim() {
                debug!("evicting `{}` to make room for `{}`", victim, var);
                self.spill_to_stack(&victim)?;
                reg = self.find_available_register();
            }
        }

        match reg {
            Some(reg) => {
                self.bind(var, reg);
                Ok(Location::Register(reg))
            }
            None => {
                warn!("no register could be freed for `{}`, spilling it", var);
                Ok(Location::Spilled(self.spill_to_stack(var)?))
            }
        }
    }

    /// Releases the register and the stack slot of `var`. Unknown
    /// variables are ignored.
    pub fn free(&mut self, var: &str) {
        self.release(var);
        self.spill_slots.remove(var);
    }

    /// Moves `var` to its stack slot, giving up any register it holds.
    /// A variable keeps the same slot for as long as it is tracked.
    pub fn spill_to_stack(&mut self, var: &str) -> Result<SpillSlot> {
        check_name(var)?;

        self.release(var);
        if let Some(&slot) = self.spill_slots.get(var) {
            return Ok(slot);
        }

        let slot = SpillSlot::new(self.next_spill_slot);
        self.next_spill_slot += 1;
        self.spill_slots.insert(var.to_string(), slot);
        debug!("spilled `{}` to {}", var, slot);
        Ok(slot)
    }

    /// Binds `var` to exactly `reg`, e.g. a parameter to its argument
    /// register. Whatever `var` held before is released.
    pub fn force_allocate(&mut self, var: &str, reg: Register) -> Result<()> {
        check_name(var)?;

        if reg.is_reserved() {
            return Err(Error::ReservedRegister(reg));
        }
        match &self.physical_regs[reg.id() as usize] {
            Some(owner) if owner == var => {
                self.pinned.insert(var.to_string());
                return Ok(());
            }
            Some(owner) => {
                return Err(Error::RegisterOccupied {
                    register: reg,
                    owner: owner.clone(),
                })
            }
            None => {}
        }

        self.free(var);
        self.bind(var, reg);
        self.pinned.insert(var.to_string());
        debug!("forced `{}` into {}", var, reg);
        Ok(())
    }

    pub fn register(&self, var: &str) -> Option<Register> {
        self.var_to_reg.get(var).copied()
    }

    pub fn is_spilled(&self, var: &str) -> bool {
        self.spill_slots.contains_key(var) && !self.var_to_reg.contains_key(var)
    }

    /// The slot of a variable currently living on the stack.
    pub fn spill_slot(&self, var: &str) -> Option<SpillSlot> {
        if self.var_to_reg.contains_key(var) {
            return None;
        }
        self.spill_slots.get(var).copied()
    }

    pub fn spill_slot_count(&self) -> usize {
        self.spill_slots.len()
    }

    pub fn allocation(&self) -> &HashMap<String, Register> {
        &self.var_to_reg
    }

    /// Register holders, oldest first.
    pub fn allocated_variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.held.iter().map(String::as_str)
    }

    /// Variables on the stack, in slot order.
    pub fn spilled_variables(&self) -> Vec<&str> {
        self.spill_slots
            .iter()
            .filter(|(var, _)| !self.var_to_reg.contains_key(*var))
            .sorted_by_key(|(_, slot)| **slot)
            .map(|(var, _)| var.as_str())
            .collect()
    }

    pub fn allocated_register_count(&self) -> usize {
        self.var_to_reg.len()
    }

    pub fn available_register_count(&self) -> usize {
        Register::iter()
            .filter(|reg| reg.is_allocatable() && self.is_free(*reg))
            .count()
    }

    pub fn available_registers(&self, class: RegisterClass) -> Vec<Register> {
        class
            .registers()
            .iter()
            .copied()
            .filter(|&reg| self.is_free(reg))
            .collect()
    }

    pub fn register_abi_name(&self, var: &str) -> Option<&'static str> {
        self.register(var).map(Register::abi_name)
    }

    pub fn reset(&mut self) {
        self.physical_regs = Default::default();
        self.var_to_reg.clear();
        self.spill_slots.clear();
        self.next_spill_slot = 0;
        self.held.clear();
        self.pinned.clear();
        debug!("linear scan allocator reset");
    }

    pub fn is_caller_saved(id: u8) -> bool {
        Register::from_id(id).map_or(false, Register::is_caller_saved)
    }

    pub fn is_callee_saved(id: u8) -> bool {
        Register::from_id(id).map_or(false, Register::is_callee_saved)
    }

    pub fn is_argument_register(id: u8) -> bool {
        Register::from_id(id).map_or(false, Register::is_argument)
    }

    pub fn arg_register(index: usize) -> Result<Register> {
        frame::arg_register(index)
    }

    pub fn return_value_register() -> Register {
        frame::return_value_register()
    }

    pub fn register_name(id: u8) -> Result<&'static str> {
        Register::from_id(id).map(Register::abi_name)
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        // writing to a String cannot fail
        let _ = self.write_report(&mut s);
        s
    }

    fn write_report(&self, s: &mut String) -> std::fmt::Result {
        writeln!(s, "=== Register Allocation Report ===")?;
        writeln!(s, "Allocated variables: {}", self.var_to_reg.len())?;
        writeln!(s, "Spilled variables: {}", self.spilled_variables().len())?;
        writeln!(s, "Available registers: {}", self.available_register_count())?;

        if !self.held.is_empty() {
            writeln!(s, "\nVariable to Register Mapping:")?;
            for var in &self.held {
                let reg = self.var_to_reg[var];
                let class = reg.class().map_or("reserved".to_string(), |c| c.to_string());
                writeln!(
                    s,
                    "  {:<20} -> {:>2} ({:<5}, {})",
                    var,
                    reg.id(),
                    reg.abi_name(),
                    class
                )?;
            }
        }

        let spilled = self.spilled_variables();
        if !spilled.is_empty() {
            writeln!(s, "\nSpilled Variables:")?;
            for var in spilled {
                writeln!(s, "  {:<20} -> {}", var, self.spill_slots[var])?;
            }
        }

        writeln!(s, "\nRegister Status:")?;
        for reg in Register::iter() {
            let occupant = self.physical_regs[reg.id() as usize].as_deref();
            let status = match occupant {
                _ if reg.is_reserved() => "RESERVED",
                Some(_) => "USED",
                None => "FREE",
            };
            writeln!(
                s,
                "  r{:<2} ({:<5}) [{:<8}] {}",
                reg.id(),
                reg.abi_name(),
                status,
                occupant.unwrap_or("")
            )?;
        }
        Ok(())
    }

    fn is_free(&self, reg: Register) -> bool {
        self.physical_regs[reg.id() as usize].is_none()
    }

    fn find_available_register(&self) -> Option<Register> {
        self.policy
            .order()
            .iter()
            .copied()
            .find(|&reg| self.is_free(reg))
    }

    fn select_victim(&self) -> Option<String> {
        self.held
            .iter()
            .find(|var| !self.pinned.contains(*var))
            .or_else(|| self.held.first())
            .cloned()
    }

    fn bind(&mut self, var: &str, reg: Register) {
        self.physical_regs[reg.id() as usize] = Some(var.to_string());
        self.var_to_reg.insert(var.to_string(), reg);
        self.held.push(var.to_string());
    }

    fn release(&mut self, var: &str) -> Option<Register> {
        let reg = self.var_to_reg.remove(var)?;
        self.physical_regs[reg.id() as usize] = None;
        self.held.retain(|held| held != var);
        self.pinned.remove(var);
        Some(reg)
    }
}

impl RegisterAllocator for LinearScanAllocator {
    fn allocate_register(&mut self, var: &str) -> Result<Location> {
        self.allocate(var)
    }

    fn register(&self, var: &str) -> Option<Register> {
        LinearScanAllocator::register(self, var)
    }

    fn spill_slot(&self, var: &str) -> Option<SpillSlot> {
        LinearScanAllocator::spill_slot(self, var)
    }

    fn is_spilled(&self, var: &str) -> bool {
        LinearScanAllocator::is_spilled(self, var)
    }

    fn free_register(&mut self, var: &str) -> Result<()> {
        check_name(var)?;
        self.free(var);
        Ok(())
    }

    fn reset(&mut self) {
        LinearScanAllocator::reset(self)
    }

    fn allocated_register_count(&self) -> usize {
        LinearScanAllocator::allocated_register_count(self)
    }

    fn report(&self) -> String {
        LinearScanAllocator::report(self)
    }
}
