//! eZ80 CPU tests
//!
//! - `instructions`: representative coverage of each instruction family.
//! - `scenarios`: the six literal end-to-end scenarios.
//! - `flag_invariants`: universal flag-identity properties, via `proptest`.
//! - `modes`: ADL-mode (24-bit) vs. Z80-mode (MBASE-banked 16-bit) behavior.
//! - `parity`: table-driven 8-bit ALU flag parity against CEmu's formulas.
//!
//! # References
//! - eZ80 CPU User Manual (Zilog UM0077)
//! - CEmu (https://github.com/CE-Programming/CEmu)

use super::*;
use crate::bus::test_support::TestBus;
use crate::bus::{Bus, MemoryBus};

mod modes;
mod parity;

// ========== Test Helpers ==========

/// A CPU reset into classic Z80 mode (ADL = 0), with MBASE banking RAM at
/// 0xD00000 and SP/PC at typical Z80 program-start values.
fn z80_cpu() -> (Cpu, TestBus) {
    let mut bus = TestBus::new();
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    cpu.mbase = 0xD0;
    cpu.sps = 0xFFFE;
    cpu.flush(&mut bus, 0x0100, false);
    (cpu, bus)
}

/// A CPU reset into ADL mode (24-bit addressing throughout).
fn adl_cpu() -> (Cpu, TestBus) {
    let mut bus = TestBus::new();
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    cpu.spl = 0xD0FFFE;
    cpu.flush(&mut bus, 0xD00100, true);
    (cpu, bus)
}

/// Load `code` at logical address `addr` (MBASE/ADL-composed per the CPU's
/// current mode) and re-flush the prefetch buffer so the CPU starts
/// executing from `addr`.
fn load(cpu: &mut Cpu, bus: &mut TestBus, addr: u32, code: &[u8]) {
    let phys = cpu.mask_addr_instr(addr);
    bus.load(phys, code);
    let mode = cpu.adl;
    cpu.flush(bus, addr, mode);
}

fn assert_flags(cpu: &Cpu, expected: u8, context: &str) {
    assert_eq!(
        cpu.f, expected,
        "{}: flags mismatch. Expected {:08b}, got {:08b} (S={} Z={} F5={} H={} F3={} PV={} N={} C={})",
        context,
        expected,
        cpu.f,
        if cpu.flag_s() { 1 } else { 0 },
        if cpu.flag_z() { 1 } else { 0 },
        if cpu.f & flags::F5 != 0 { 1 } else { 0 },
        if cpu.flag_h() { 1 } else { 0 },
        if cpu.f & flags::F3 != 0 { 1 } else { 0 },
        if cpu.flag_pv() { 1 } else { 0 },
        if cpu.flag_n() { 1 } else { 0 },
        if cpu.flag_c() { 1 } else { 0 },
    );
}
