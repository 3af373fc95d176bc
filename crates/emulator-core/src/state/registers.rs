/// Number of architecturally visible integer registers (`x0..x31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

/// ABI mnemonic for each integer register, indexed by register number.
pub const ABI_NAMES: [&str; GENERAL_REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Integer register identifier (`x0..x31`).
///
/// Construction is checked so an index is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Register(u8);

impl Register {
    /// The hardwired zero register.
    pub const ZERO: Self = Self(0);

    /// Decodes a 5-bit register field; higher bits are ignored.
    #[must_use]
    pub const fn from_u5(bits: u8) -> Self {
        Self(bits & 0x1F)
    }

    /// Returns the register for `index`, or `None` when out of range.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < GENERAL_REGISTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw register number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Returns the ABI name (`a0`, `sp`, ...).
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        ABI_NAMES[self.0 as usize]
    }

    /// Iterates over every register in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..32_u8).map(Self)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Register file and program counter of the RV32I core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [i32; GENERAL_REGISTER_COUNT],
    pc: u32,
}

impl ArchitecturalState {
    /// Reads an integer register. `x0` always reads 0.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> i32 {
        if reg.index() == 0 {
            0
        } else {
            self.gpr[reg.index()]
        }
    }

    /// Reads an integer register as its unsigned bit pattern.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn gpr_u32(&self, reg: Register) -> u32 {
        self.gpr(reg) as u32
    }

    /// Writes an integer register.
    ///
    /// Writes to `x0` land in storage but are cleared by [`Self::clear_zero_register`]
    /// at the end of every step.
    pub const fn set_gpr(&mut self, reg: Register, value: i32) {
        self.gpr[reg.index()] = value;
    }

    /// Forces `x0` back to zero.
    pub const fn clear_zero_register(&mut self) {
        self.gpr[0] = 0;
    }

    /// Returns the raw register array, `x0` included.
    #[must_use]
    pub const fn registers(&self) -> &[i32; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Zeroes every register and the program counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
