//! eZ80 execution core
//!
//! This crate provides a cycle-accountable interpreter for the Zilog eZ80
//! processor: a Z80-compatible CPU extended with 24-bit ADL addressing,
//! mixed-mode `.SIS`/`.LIS`/`.SIL`/`.LIL` suffixes, and additional opcodes.
//!
//! # Architecture
//!
//! The core owns only architectural CPU state (registers, flags, mode bits,
//! the prefetch buffer). Memory, I/O ports, the interrupt controller, and the
//! debugger are external collaborators, reached through the traits in
//! [`bus`]. The core never allocates, spawns threads, or touches any host
//! API; a consumer wires it to a concrete memory map and drives it by
//! calling [`cpu::Cpu::execute`] with a cycle budget.
//!
//! - `bus`: collaborator traits (`MemoryBus`, `PortBus`, `InterruptSource`, `Debugger`).
//! - `cpu`: register file, fetch/decode/execute loop, flag arithmetic, snapshotting.

pub mod bus;
pub mod cpu;

pub use bus::{Bus, BreakReason, Debugger, InterruptSource, MemoryBus, PortBus};
pub use cpu::{Cpu, InterruptMode};
