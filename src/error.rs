use thiserror::Error;

use crate::{frame::Register, symbol::SymbolId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid live interval for `{var}`: start {start} > end {end}")]
    InvalidInterval { var: String, start: u32, end: u32 },

    #[error("variable name cannot be empty")]
    EmptyVariableName,

    #[error("use point {point} of `{var}` lies outside [{start}, {end}]")]
    UsePointOutOfRange {
        var: String,
        point: u32,
        start: u32,
        end: u32,
    },

    #[error("intervals of `{0}` and `{1}` do not overlap")]
    DisjointIntervals(String, String),

    #[error("cannot allocate reserved register: {0}")]
    ReservedRegister(Register),

    #[error("register {register} is already allocated to: {owner}")]
    RegisterOccupied { register: Register, owner: String },

    #[error("invalid register number: {0}")]
    InvalidRegisterNumber(u8),

    #[error("argument index must be 0-5, got: {0}")]
    ArgumentIndexOutOfRange(usize),

    #[error("register {0} is not an argument register (a0-a5)")]
    NotAnArgumentRegister(Register),

    #[error("color count must be within 1..={}, got: {0}", crate::frame::NUM_ALLOCATABLE)]
    InvalidColorCount(usize),

    #[error("no live interval registered for `{0}`")]
    MissingInterval(String),

    #[error("name `{name}` is bound to symbol {existing}, cannot rebind it to symbol {requested}")]
    SymbolNameConflict {
        name: String,
        existing: SymbolId,
        requested: SymbolId,
    },
}
