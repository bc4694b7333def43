use std::{collections::HashMap, fmt::Display};

use log::warn;

use crate::error::{Error, Result};

/// Handle the compiler's symbol table gives every variable symbol.
/// Two symbols are the same variable iff their ids are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableSymbol {
    id: SymbolId,
    name: Option<String>,
}

impl VariableSymbol {
    pub fn new(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// Compiler temporaries carry no source name.
    pub fn anonymous(id: SymbolId) -> Self {
        Self { id, name: None }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Display for VariableSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}", name, self.id),
            None => write!(f, "<anonymous>{}", self.id),
        }
    }
}

const ANONYMOUS_PREFIX: &str = "var";

/// Bijection between symbol handles and the names the string-keyed
/// allocators see.
#[derive(Debug)]
pub struct SymbolTable {
    names: HashMap<SymbolId, String>,
    symbols: HashMap<String, SymbolId>,
    next_anonymous: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
            symbols: HashMap::new(),
            next_anonymous: 1,
        }
    }
}

impl SymbolTable {
    /// Returns the name bound to `symbol`, binding one first if needed.
    /// Declared names are used verbatim; anonymous symbols get `var<N>`.
    pub fn intern(&mut self, symbol: &VariableSymbol) -> Result<&str> {
        let id = symbol.id();
        if self.names.contains_key(&id) {
            return Ok(self.names[&id].as_str());
        }

        let name = match symbol.name() {
            Some("") => return Err(Error::EmptyVariableName),
            Some(name) => {
                if let Some(&existing) = self.symbols.get(name) {
                    warn!("refusing to bind `{}` to {}: held by {}", name, id, existing);
                    return Err(Error::SymbolNameConflict {
                        name: name.to_string(),
                        existing,
                        requested: id,
                    });
                }
                name.to_string()
            }
            None => self.fresh_name(),
        };

        self.symbols.insert(name.clone(), id);
        Ok(self.names.entry(id).or_insert(name).as_str())
    }

    fn fresh_name(&mut self) -> String {
        loop {
            let name = format!("{}{}", ANONYMOUS_PREFIX, self.next_anonymous);
            self.next_anonymous += 1;
            if !self.symbols.contains_key(&name) {
                return name;
            }
        }
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.names.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forgets every binding and restarts anonymous numbering at 1.
    pub fn clear(&mut self) {
        self.names.clear();
        self.symbols.clear();
        self.next_anonymous = 1;
    }
}
