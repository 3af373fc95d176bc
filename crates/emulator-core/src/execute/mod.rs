//! Instruction execution pipeline for the RV32I subset.
//!
//! Execution is staged in two phases:
//! 1. [`execute_instruction`] reads source operands, computes the result or
//!    effective address, and performs any load through the bus;
//! 2. [`commit_execution`] applies the staged store, destination register and
//!    next pc.
//!
//! An unimplemented operation stages nothing and is never committed, so the
//! only visible effect is the pc advance already made by the fetch.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

mod alu;
mod helpers;

pub use alu::apply as alu_apply;
pub use helpers::{
    extend_load, jalr_target, load_access_width, offset_address, store_access_width,
};

use crate::bus::Bus;
use crate::decoder::{AluOperation, BranchCondition, DecodedInstruction, LoadWidth, StoreWidth};
use crate::memory::AccessWidth;
use crate::state::{ArchitecturalState, Register};

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecuteOutcome {
    /// Instruction completed; commit the staged state.
    Retired,
    /// Unknown opcode or undefined selector; nothing to commit.
    Unimplemented,
}

/// Store staged for the commit phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingStore {
    /// Effective address.
    pub addr: u32,
    /// Access width.
    pub width: AccessWidth,
    /// Value whose low `width` bytes are written.
    pub value: u32,
}

/// Side effects accumulated during execution, applied by [`commit_execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExecuteState {
    /// Effective address of a load or store.
    pub effective_address: Option<u32>,
    /// Destination register for the result.
    pub dest_reg: Option<Register>,
    /// Value to write to the destination register.
    pub dest_value: Option<i32>,
    /// Memory write to perform.
    pub store: Option<PendingStore>,
    /// Control-transfer target; `None` keeps the fall-through pc.
    pub next_pc: Option<u32>,
}

impl ExecuteState {
    const fn write_register(&mut self, rd: Register, value: i32) {
        self.dest_reg = Some(rd);
        self.dest_value = Some(value);
    }
}

/// Executes one decoded instruction fetched from `pc`.
///
/// Returns both the outcome and the staged state. On
/// [`ExecuteOutcome::Retired`] the caller must apply the state with
/// [`commit_execution`].
pub fn execute_instruction(
    instr: &DecodedInstruction,
    arch: &ArchitecturalState,
    bus: &mut Bus,
    pc: u32,
) -> (ExecuteOutcome, ExecuteState) {
    let mut exec = ExecuteState::default();

    let outcome = match *instr {
        DecodedInstruction::Lui { rd, imm } => {
            exec.write_register(rd, imm);
            ExecuteOutcome::Retired
        }
        DecodedInstruction::Auipc { rd, imm } => {
            exec.write_register(rd, offset_address(pc, imm) as i32);
            ExecuteOutcome::Retired
        }
        DecodedInstruction::Jal { rd, offset } => {
            exec.write_register(rd, pc.wrapping_add(4) as i32);
            exec.next_pc = Some(offset_address(pc, offset));
            ExecuteOutcome::Retired
        }
        DecodedInstruction::Jalr {
            rd,
            rs1,
            funct3,
            imm,
        } => execute_jalr(arch, &mut exec, pc, rd, rs1, funct3, imm),
        DecodedInstruction::Branch {
            funct3,
            rs1,
            rs2,
            offset,
        } => execute_branch(arch, &mut exec, pc, funct3, rs1, rs2, offset),
        DecodedInstruction::Load {
            funct3,
            rd,
            rs1,
            offset,
        } => execute_load(arch, bus, &mut exec, funct3, rd, rs1, offset),
        DecodedInstruction::Store {
            funct3,
            rs1,
            rs2,
            offset,
        } => execute_store(arch, &mut exec, funct3, rs1, rs2, offset),
        DecodedInstruction::AluImmediate {
            funct3,
            funct7,
            rd,
            rs1,
            imm,
        } => AluOperation::from_immediate(funct3, funct7).map_or(
            ExecuteOutcome::Unimplemented,
            |op| {
                exec.write_register(rd, alu::apply(op, arch.gpr(rs1), imm));
                ExecuteOutcome::Retired
            },
        ),
        DecodedInstruction::AluRegister {
            funct3,
            funct7,
            rd,
            rs1,
            rs2,
        } => AluOperation::from_register(funct3, funct7).map_or(
            ExecuteOutcome::Unimplemented,
            |op| {
                exec.write_register(rd, alu::apply(op, arch.gpr(rs1), arch.gpr(rs2)));
                ExecuteOutcome::Retired
            },
        ),
        DecodedInstruction::Unknown { .. } => ExecuteOutcome::Unimplemented,
    };

    (outcome, exec)
}

/// Applies staged side effects: memory write, destination register, pc.
pub fn commit_execution(arch: &mut ArchitecturalState, bus: &mut Bus, exec: &ExecuteState) {
    if let Some(store) = exec.store {
        bus.store(store.addr, store.width, store.value);
    }

    if let (Some(rd), Some(value)) = (exec.dest_reg, exec.dest_value) {
        arch.set_gpr(rd, value);
    }

    if let Some(pc) = exec.next_pc {
        arch.set_pc(pc);
    }
}

fn execute_jalr(
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
    pc: u32,
    rd: Register,
    rs1: Register,
    funct3: u8,
    imm: i32,
) -> ExecuteOutcome {
    if funct3 != 0 {
        return ExecuteOutcome::Unimplemented;
    }
    // target uses rs1 before rd is written, so `jalr x1, 0(x1)` works
    exec.next_pc = Some(jalr_target(arch.gpr(rs1), imm));
    exec.write_register(rd, pc.wrapping_add(4) as i32);
    ExecuteOutcome::Retired
}

fn execute_branch(
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
    pc: u32,
    funct3: u8,
    rs1: Register,
    rs2: Register,
    offset: i32,
) -> ExecuteOutcome {
    let Some(condition) = BranchCondition::from_funct3(funct3) else {
        return ExecuteOutcome::Unimplemented;
    };
    if condition.holds(arch.gpr(rs1), arch.gpr(rs2)) {
        exec.next_pc = Some(offset_address(pc, offset));
    }
    ExecuteOutcome::Retired
}

fn execute_load(
    arch: &ArchitecturalState,
    bus: &mut Bus,
    exec: &mut ExecuteState,
    funct3: u8,
    rd: Register,
    rs1: Register,
    offset: i32,
) -> ExecuteOutcome {
    let Some(width) = LoadWidth::from_funct3(funct3) else {
        return ExecuteOutcome::Unimplemented;
    };
    let addr = offset_address(arch.gpr_u32(rs1), offset);
    exec.effective_address = Some(addr);

    let raw = bus.load(addr, load_access_width(width));
    exec.write_register(rd, extend_load(raw, width));
    ExecuteOutcome::Retired
}

fn execute_store(
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
    funct3: u8,
    rs1: Register,
    rs2: Register,
    offset: i32,
) -> ExecuteOutcome {
    let Some(width) = StoreWidth::from_funct3(funct3) else {
        return ExecuteOutcome::Unimplemented;
    };
    let addr = offset_address(arch.gpr_u32(rs1), offset);
    exec.effective_address = Some(addr);
    exec.store = Some(PendingStore {
        addr,
        width: store_access_width(width),
        value: arch.gpr_u32(rs2),
    });
    ExecuteOutcome::Retired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn reg(n: u8) -> Register {
        Register::from_u5(n)
    }

    fn run(word: u32, arch: &mut ArchitecturalState, bus: &mut Bus, pc: u32) -> ExecuteOutcome {
        let (outcome, exec) = execute_instruction(&decode(word), arch, bus, pc);
        if outcome == ExecuteOutcome::Retired {
            commit_execution(arch, bus, &exec);
        }
        outcome
    }

    #[test]
    fn addi_stages_destination_only() {
        let arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        // addi x10, x0, 5
        let (outcome, exec) = execute_instruction(&decode(0x0050_0513), &arch, &mut bus, 0);
        assert_eq!(outcome, ExecuteOutcome::Retired);
        assert_eq!(exec.dest_reg, Some(reg(10)));
        assert_eq!(exec.dest_value, Some(5));
        assert_eq!(exec.next_pc, None);
        assert_eq!(exec.store, None);
    }

    #[test]
    fn store_is_deferred_until_commit() {
        let mut arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        arch.set_gpr(reg(1), 0x20);
        arch.set_gpr(reg(2), 0x42);
        // sw x2, 0(x1)
        let (outcome, exec) = execute_instruction(&decode(0x0020_A023), &arch, &mut bus, 0);
        assert_eq!(outcome, ExecuteOutcome::Retired);
        assert_eq!(bus.peek32(0x20), Some(0));

        commit_execution(&mut arch, &mut bus, &exec);
        assert_eq!(bus.peek32(0x20), Some(0x42));
    }

    #[test]
    fn auipc_and_jal_use_the_instruction_address() {
        let mut arch = ArchitecturalState::default();
        let mut bus = Bus::default();

        // auipc x5, 1
        run(0x0000_1297, &mut arch, &mut bus, 0x100);
        assert_eq!(arch.gpr(reg(5)), 0x1100);

        // jal x1, -16 placed at 0x18
        arch.set_pc(0x1C);
        run(0xFF1F_F0EF, &mut arch, &mut bus, 0x18);
        assert_eq!(arch.gpr(reg(1)), 0x1C);
        assert_eq!(arch.pc(), 0x08);
    }

    #[test]
    fn jalr_reads_base_before_linking() {
        let mut arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        arch.set_gpr(reg(1), 0x201);
        // jalr x1, 0(x1)
        run(0x0000_80E7, &mut arch, &mut bus, 0x40);
        assert_eq!(arch.pc(), 0x200);
        assert_eq!(arch.gpr(reg(1)), 0x44);
    }

    #[test]
    fn jalr_with_nonzero_funct3_is_unimplemented() {
        let mut arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        // jalr x1, 0(x1) with funct3 = 1
        let outcome = run(0x0000_90E7, &mut arch, &mut bus, 0x40);
        assert_eq!(outcome, ExecuteOutcome::Unimplemented);
        assert_eq!(arch.gpr(reg(1)), 0);
    }

    #[test]
    fn not_taken_branch_keeps_fall_through() {
        let arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        // bne x0, x0, +8
        let (outcome, exec) = execute_instruction(&decode(0x0000_1463), &arch, &mut bus, 0x10);
        assert_eq!(outcome, ExecuteOutcome::Retired);
        assert_eq!(exec.next_pc, None);
    }

    #[test]
    fn signed_and_unsigned_byte_loads() {
        let mut arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        bus.write32(0x40, 0x0000_80FF);
        arch.set_gpr(reg(1), 0x40);

        // lb x2, 1(x1)
        run(0x0010_8103, &mut arch, &mut bus, 0);
        assert_eq!(arch.gpr(reg(2)), -128);
        // lbu x2, 1(x1)
        run(0x0010_C103, &mut arch, &mut bus, 0);
        assert_eq!(arch.gpr(reg(2)), 0x80);
        // lh x2, 0(x1)
        run(0x0000_9103, &mut arch, &mut bus, 0);
        assert_eq!(arch.gpr(reg(2)), 0xFFFF_80FF_u32 as i32);
    }

    #[test]
    fn undefined_selectors_are_unimplemented() {
        let mut arch = ArchitecturalState::default();
        let mut bus = Bus::default();
        for word in [
            0x0000_2063, // branch funct3 = 2
            0x0000_3003, // load funct3 = 3
            0x0000_3023, // store funct3 = 3
            0x4000_1013, // slli with funct7 = 0x20
            0x0200_0033, // add with funct7 = 1 (mul)
            0x0000_0073, // ecall
        ] {
            assert_eq!(
                run(word, &mut arch, &mut bus, 0),
                ExecuteOutcome::Unimplemented,
                "{word:#010x}"
            );
        }
        assert_eq!(arch, ArchitecturalState::default());
    }
}
