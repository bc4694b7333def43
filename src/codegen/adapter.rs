use std::fmt::Write as _;

use crate::{
    error::Result,
    frame::Register,
    symbol::{SymbolId, SymbolTable, VariableSymbol},
};

use super::{Location, RegisterAllocator, SpillSlot};

/// Lets code generators address a string-keyed allocator by compiler
/// symbols. Declared names pass through unchanged; anonymous symbols are
/// named `var1`, `var2`, ... in the order they are first seen.
///
/// Queries never bind a name: asking about a symbol the adapter has not
/// seen yet reports it as unallocated.
#[derive(Debug, Default)]
pub struct SymbolAllocator<A> {
    delegate: A,
    symbols: SymbolTable,
}

impl<A: RegisterAllocator> SymbolAllocator<A> {
    pub fn new(delegate: A) -> Self {
        Self {
            delegate,
            symbols: SymbolTable::default(),
        }
    }

    /// The name `symbol` goes by in the delegate, binding one if needed.
    pub fn name_of(&mut self, symbol: &VariableSymbol) -> Result<&str> {
        self.symbols.intern(symbol)
    }

    pub fn variable_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.symbol(name)
    }

    pub fn managed_symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.ids()
    }

    pub fn delegate(&self) -> &A {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut A {
        &mut self.delegate
    }

    pub fn into_delegate(self) -> A {
        self.delegate
    }

    fn bound_name(&self, symbol: &VariableSymbol) -> Option<&str> {
        self.symbols.name(symbol.id())
    }

    fn write_report(&self, s: &mut String) -> std::fmt::Result {
        writeln!(s, "=== Symbol Allocator Report ===")?;
        writeln!(s, "Managed variables: {}", self.symbols.len())?;
        writeln!(
            s,
            "Allocated registers: {}",
            self.delegate.allocated_register_count()
        )?;
        writeln!(s)?;
        s.push_str(&self.delegate.report());
        Ok(())
    }
}

impl<A: RegisterAllocator> RegisterAllocator<VariableSymbol> for SymbolAllocator<A> {
    fn allocate_register(&mut self, symbol: &VariableSymbol) -> Result<Location> {
        let name = self.symbols.intern(symbol)?;
        self.delegate.allocate_register(name)
    }

    fn register(&self, symbol: &VariableSymbol) -> Option<Register> {
        self.bound_name(symbol)
            .and_then(|name| self.delegate.register(name))
    }

    fn spill_slot(&self, symbol: &VariableSymbol) -> Option<SpillSlot> {
        self.bound_name(symbol)
            .and_then(|name| self.delegate.spill_slot(name))
    }

    fn is_spilled(&self, symbol: &VariableSymbol) -> bool {
        self.bound_name(symbol)
            .map_or(false, |name| self.delegate.is_spilled(name))
    }

    fn free_register(&mut self, symbol: &VariableSymbol) -> Result<()> {
        match self.symbols.name(symbol.id()) {
            Some(name) => self.delegate.free_register(name),
            None => Ok(()),
        }
    }

    /// Resets the delegate and forgets every symbol; anonymous numbering
    /// starts over at `var1`.
    fn reset(&mut self) {
        self.delegate.reset();
        self.symbols.clear();
    }

    fn allocated_register_count(&self) -> usize {
        self.delegate.allocated_register_count()
    }

    fn report(&self) -> String {
        let mut s = String::new();
        // writing to a String cannot fail
        let _ = self.write_report(&mut s);
        s
    }
}
