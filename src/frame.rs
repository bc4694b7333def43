//! The EP18R register file and its calling convention.
//!
//! ```text
//! r0  zero   hard-wired zero, never allocated
//! r1  ra     return address            caller-saved
//! r2  a0     argument 0 / return value  caller-saved
//! r3  a1 .. r7 a5  arguments 1-5        caller-saved
//! r8  s0 .. r12 s4                      callee-saved
//! r13 sp     stack pointer, never allocated
//! r14 fp     frame pointer, never allocated
//! r15 lr     link register              caller-saved
//! ```
//!
//! Spilled values live below the saved callee registers, addressed from `fp`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use strum::{EnumIter, FromRepr, IntoEnumIterator, IntoStaticStr};

use crate::error::{Error, Result};

pub const NUM_REGISTERS: usize = 16;
pub const NUM_ALLOCATABLE: usize = NUM_REGISTERS - RESERVED.len();
pub const NUM_ARG_REGISTERS: usize = ARG_REGS.len();

/// Offset from `fp` of the first local (and spill) slot.
pub const FIRST_LOCAL_OFFSET: i32 = -16;
pub const SLOT_SIZE: i32 = 4;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, FromRepr, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Register {
    Zero = 0,
    Ra,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    S0,
    S1,
    S2,
    S3,
    S4,
    Sp,
    Fp,
    Lr,
}

pub const RESERVED: [Register; 3] = [Register::Zero, Register::Sp, Register::Fp];

const ARG_REGS: [Register; 6] = [
    Register::A0,
    Register::A1,
    Register::A2,
    Register::A3,
    Register::A4,
    Register::A5,
];

pub const CALLER_SAVED: [Register; 8] = [
    Register::Ra,
    Register::A0,
    Register::A1,
    Register::A2,
    Register::A3,
    Register::A4,
    Register::A5,
    Register::Lr,
];

pub const CALLEE_SAVED: [Register; 5] = [
    Register::S0,
    Register::S1,
    Register::S2,
    Register::S3,
    Register::S4,
];

/// Every register an allocator may hand out, in ascending id order.
pub static ALLOCATABLE: Lazy<Vec<Register>> =
    Lazy::new(|| Register::iter().filter(|reg| !reg.is_reserved()).collect());

static ABI_NAMES: Lazy<HashMap<&'static str, Register>> =
    Lazy::new(|| Register::iter().map(|reg| (reg.abi_name(), reg)).collect());

impl Register {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<Self> {
        Self::from_repr(id).ok_or(Error::InvalidRegisterNumber(id))
    }

    pub fn from_abi_name(name: &str) -> Option<Self> {
        ABI_NAMES.get(name).copied()
    }

    pub fn abi_name(self) -> &'static str {
        self.into()
    }

    pub fn is_reserved(self) -> bool {
        RESERVED.contains(&self)
    }

    pub fn is_allocatable(self) -> bool {
        !self.is_reserved()
    }

    pub fn is_caller_saved(self) -> bool {
        CALLER_SAVED.contains(&self)
    }

    pub fn is_callee_saved(self) -> bool {
        CALLEE_SAVED.contains(&self)
    }

    pub fn is_argument(self) -> bool {
        ARG_REGS.contains(&self)
    }

    pub fn class(self) -> Option<RegisterClass> {
        if self.is_callee_saved() {
            Some(RegisterClass::CalleeSaved)
        } else if self.is_caller_saved() {
            Some(RegisterClass::CallerSaved)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{} ({})", self.id(), self.abi_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    CallerSaved,
    CalleeSaved,
}

impl RegisterClass {
    pub fn registers(self) -> &'static [Register] {
        match self {
            RegisterClass::CallerSaved => &CALLER_SAVED,
            RegisterClass::CalleeSaved => &CALLEE_SAVED,
        }
    }
}

impl std::fmt::Display for RegisterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterClass::CallerSaved => write!(f, "caller-saved"),
            RegisterClass::CalleeSaved => write!(f, "callee-saved"),
        }
    }
}

/// Register that carries argument `index` (0-5).
pub fn arg_register(index: usize) -> Result<Register> {
    ARG_REGS
        .get(index)
        .copied()
        .ok_or(Error::ArgumentIndexOutOfRange(index))
}

pub fn arg_index(reg: Register) -> Result<usize> {
    ARG_REGS
        .iter()
        .position(|&arg| arg == reg)
        .ok_or(Error::NotAnArgumentRegister(reg))
}

/// The return value shares a0 with the first argument.
pub fn return_value_register() -> Register {
    ARG_REGS[0]
}

/// Offset from `fp` of local slot `index`; grows downwards.
pub fn local_offset(index: u32) -> i32 {
    FIRST_LOCAL_OFFSET - SLOT_SIZE * index as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_names() {
        let cases = vec![
            (0, "zero"),
            (1, "ra"),
            (2, "a0"),
            (7, "a5"),
            (8, "s0"),
            (12, "s4"),
            (13, "sp"),
            (14, "fp"),
            (15, "lr"),
        ];

        for (id, name) in cases {
            let reg = Register::from_id(id).unwrap();
            assert_eq!(name, reg.abi_name());
            assert_eq!(Some(reg), Register::from_abi_name(name));
        }
        assert_eq!(None, Register::from_abi_name("x0"));
    }

    #[test]
    fn test_from_id_out_of_range() {
        assert_eq!(Err(Error::InvalidRegisterNumber(16)), Register::from_id(16));
    }

    #[test]
    fn test_roles() {
        assert_eq!(NUM_ALLOCATABLE, 13);
        assert_eq!(ALLOCATABLE.len(), NUM_ALLOCATABLE);
        assert!(ALLOCATABLE.windows(2).all(|w| w[0] < w[1]));

        for reg in Register::iter() {
            // every register has at most one saving convention
            assert!(!(reg.is_caller_saved() && reg.is_callee_saved()));
            assert_eq!(reg.is_allocatable(), reg.class().is_some());
        }

        assert!(Register::Ra.is_caller_saved());
        assert!(Register::Lr.is_caller_saved());
        assert!(!Register::S0.is_caller_saved());
        assert!(Register::S4.is_callee_saved());
        assert!(!Register::A0.is_callee_saved());
        assert!(Register::A5.is_argument());
        assert!(!Register::S0.is_argument());
    }

    #[test]
    fn test_argument_registers() {
        assert_eq!(Register::A0, arg_register(0).unwrap());
        assert_eq!(Register::A5, arg_register(5).unwrap());
        assert_eq!(Err(Error::ArgumentIndexOutOfRange(6)), arg_register(6));

        for index in 0..NUM_ARG_REGISTERS {
            assert_eq!(index, arg_index(arg_register(index).unwrap()).unwrap());
        }
        assert_eq!(
            Err(Error::NotAnArgumentRegister(Register::S0)),
            arg_index(Register::S0)
        );
        assert_eq!(Register::A0, return_value_register());
    }

    #[test]
    fn test_local_offset() {
        assert_eq!(-16, local_offset(0));
        assert_eq!(-20, local_offset(1));
        assert_eq!(-56, local_offset(10));
    }
}
