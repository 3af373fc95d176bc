use thiserror::Error;

/// Fault classes used for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder or executor met an operation outside the supported subset.
    Decode,
    /// Data access left the backing store or was not naturally aligned.
    Memory,
}

/// Stable taxonomy of non-fatal faults.
///
/// None of these stop the step loop; they are counted and forwarded to the
/// installed [`crate::diag::DiagnosticSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Unknown opcode or undefined `funct3`/`funct7` combination.
    #[error("unimplemented operation")]
    UnimplementedOperation = 0x01,
    /// Access whose last byte lies outside the backing store.
    #[error("address outside the backing store")]
    OutOfRangeAddress = 0x02,
    /// Access not aligned to its width; forced down to the containing unit.
    #[error("misaligned data access")]
    MisalignedAddress = 0x03,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::UnimplementedOperation),
            0x02 => Some(Self::OutOfRangeAddress),
            0x03 => Some(Self::MisalignedAddress),
            _ => None,
        }
    }

    /// Returns the diagnostics class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UnimplementedOperation => FaultClass::Decode,
            Self::OutOfRangeAddress | Self::MisalignedAddress => FaultClass::Memory,
        }
    }
}

/// Extra context attached to a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultDetail {
    /// The instruction word that could not be executed.
    Instruction(u32),
    /// The effective data address of the access.
    Address(u32),
}

/// One reported fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FaultRecord {
    /// What went wrong.
    pub code: FaultCode,
    /// Address of the instruction being executed; `None` for host accesses.
    pub pc: Option<u32>,
    /// Word or address involved.
    pub detail: FaultDetail,
}

impl FaultRecord {
    /// Record for an operation the executor could not perform.
    #[must_use]
    pub const fn unimplemented(pc: u32, word: u32) -> Self {
        Self {
            code: FaultCode::UnimplementedOperation,
            pc: Some(pc),
            detail: FaultDetail::Instruction(word),
        }
    }

    /// Record for a data access problem at `address`.
    #[must_use]
    pub const fn memory(code: FaultCode, pc: Option<u32>, address: u32) -> Self {
        Self {
            code,
            pc,
            detail: FaultDetail::Address(address),
        }
    }
}

impl std::fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)?;
        match self.detail {
            FaultDetail::Instruction(word) => write!(f, " (word {word:#010x})")?,
            FaultDetail::Address(address) => write!(f, " (address {address:#07x})")?,
        }
        if let Some(pc) = self.pc {
            write!(f, " at pc {pc:#010x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultClass, FaultCode, FaultRecord};

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x03 {
            let fault = FaultCode::from_u8(code).expect("defined taxonomy code");
            assert_eq!(fault.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(FaultCode::from_u8(0x00).is_none());
        assert!(FaultCode::from_u8(0x04).is_none());
        assert!(FaultCode::from_u8(0xFF).is_none());
    }

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        assert_eq!(FaultCode::UnimplementedOperation.class(), FaultClass::Decode);
        assert_eq!(FaultCode::OutOfRangeAddress.class(), FaultClass::Memory);
        assert_eq!(FaultCode::MisalignedAddress.class(), FaultClass::Memory);
    }

    #[test]
    fn records_render_context() {
        let record = FaultRecord::unimplemented(0x40, 0x0000_0073);
        assert_eq!(
            record.to_string(),
            "unimplemented operation (word 0x00000073) at pc 0x00000040"
        );

        let record = FaultRecord::memory(FaultCode::OutOfRangeAddress, None, 0x10_0000);
        assert_eq!(
            record.to_string(),
            "address outside the backing store (address 0x100000)"
        );
    }
}
