//! eZ80 instruction dispatch
//!
//! Functions are named after the opcode byte's `xxyyyzzz` decomposition
//! (x = bits 7:6, y = bits 5:3, z = bits 2:0, p = y:1, q = y&1), the
//! convention this table itself is usually drawn in:
//!
//! - `execute_x0`/`execute_x3`: the x=0 and x=3 quadrants of the unprefixed table.
//! - `execute_alu`: the eight `ADD`/`ADC`/.../`CP` operations shared by x=2 and `ALU n`.
//! - `execute_cb`/`execute_index_cb`: CB-prefixed and DDCB/FDCB rotate/BIT/RES/SET.
//! - `execute_ed`: ED-prefixed block moves, 16-bit arithmetic, and eZ80 extensions.
//! - `execute_bli`/`execute_bli_ez80`: the block-instruction family.
//!
//! PREFIX (DD/FD) substitution for HL/H/L/(HL) is handled once, in
//! `helpers::get_reg8`/`get_rp`/`get_rp2` and friends — these functions don't
//! need to know whether IX, IY, or HL is actually in play.
//!
//! # References
//! - eZ80 CPU User Manual (Zilog UM0077)
//! - CEmu (https://github.com/CE-Programming/CEmu)

use super::flags;
use super::Cpu;
use crate::bus::Bus;

impl Cpu {
    // ========== x = 0 ==========

    pub(super) fn execute_x0<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8, p: u8, q: u8) {
        match z {
            0 => match y {
                0 => {} // NOP
                1 => self.ex_af(),
                2 => {
                    // DJNZ d
                    let d = self.fetch_offset(bus);
                    let b = self.b().wrapping_sub(1);
                    self.set_b(b);
                    bus.add_cycles(1);
                    if b != 0 {
                        let target = self.wrap_pc((self.pc as i64 + d as i64) as u32);
                        bus.add_cycles(5);
                        self.prefetch(bus, target, self.adl);
                    }
                }
                3 => {
                    // JR d
                    let d = self.fetch_offset(bus);
                    let target = self.wrap_pc((self.pc as i64 + d as i64) as u32);
                    bus.add_cycles(5);
                    self.prefetch(bus, target, self.adl);
                }
                4..=7 => {
                    // JR cc,d
                    let d = self.fetch_offset(bus);
                    if self.check_cc(y - 4) {
                        let target = self.wrap_pc((self.pc as i64 + d as i64) as u32);
                        bus.add_cycles(5);
                        self.prefetch(bus, target, self.adl);
                    }
                }
                _ => unreachable!(),
            },
            1 => {
                if q == 0 {
                    let val = self.fetch_word(bus);
                    self.set_rp(p, val);
                } else {
                    let hl = self.get_rp(2);
                    let rp = self.get_rp(p);
                    let result = self.alu_add16(hl, rp);
                    self.set_rp(2, result);
                    bus.add_cycles(self.addr_width() as u64);
                }
            }
            2 => match (q, p) {
                (0, 0) => {
                    let a = self.a;
                    bus.write_byte(self.mask_addr(self.bc), a);
                }
                (0, 1) => {
                    let a = self.a;
                    bus.write_byte(self.mask_addr(self.de), a);
                }
                (0, 2) => {
                    let nn = self.fetch_word(bus);
                    let hl = self.get_rp(2);
                    self.write_addr(bus, nn, hl);
                }
                (0, 3) => {
                    let nn = self.fetch_word(bus);
                    let a = self.a;
                    bus.write_byte(self.mask_addr(nn), a);
                }
                (1, 0) => self.a = bus.read_byte(self.mask_addr(self.bc)),
                (1, 1) => self.a = bus.read_byte(self.mask_addr(self.de)),
                (1, 2) => {
                    let nn = self.fetch_word(bus);
                    let val = self.read_addr(bus, nn);
                    self.set_rp(2, val);
                }
                (1, 3) => {
                    let nn = self.fetch_word(bus);
                    self.a = bus.read_byte(self.mask_addr(nn));
                }
                _ => unreachable!(),
            },
            3 => {
                let rp = self.get_rp(p);
                let result = if q == 0 {
                    rp.wrapping_add(1)
                } else {
                    rp.wrapping_sub(1)
                };
                self.set_rp(p, self.wrap_data(result));
                bus.add_cycles(self.addr_width() as u64 - 1);
            }
            4 => {
                let val = self.get_reg8(bus, y);
                let r = self.alu_inc(val);
                self.set_reg8(bus, y, r);
                if y == 6 {
                    bus.add_cycles(1);
                }
            }
            5 => {
                let val = self.get_reg8(bus, y);
                let r = self.alu_dec(val);
                self.set_reg8(bus, y, r);
                if y == 6 {
                    bus.add_cycles(1);
                }
            }
            6 => {
                let n = self.fetch_byte(bus);
                self.set_reg8(bus, y, n);
                if y == 6 {
                    bus.add_cycles(1);
                }
            }
            7 => self.execute_rot_acc(y),
            _ => unreachable!(),
        }
    }

    /// 16/24-bit `ADD HL,rp` (and `ADD IX,rp`/`ADD IY,rp` under PREFIX): only
    /// H, N, C are set; S/Z/P are left untouched; F5/F3 come from the high
    /// byte of the result.
    fn alu_add16(&mut self, a: u32, b: u32) -> u32 {
        let width_mask: u32 = if self.l { 0xFFFFFF } else { 0xFFFF };
        let sum = a as u64 + b as u64;
        let result = (sum as u32) & width_mask;
        let half = ((a & 0xFFF) + (b & 0xFFF)) > 0xFFF;
        let carry = sum > width_mask as u64;

        self.f &= flags::S | flags::Z | flags::PV;
        self.f |= ((result >> 8) as u8) & (flags::F5 | flags::F3);
        self.set_flag_h(half);
        self.set_flag_c(carry);
        self.set_flag_n(false);

        result
    }

    /// Write a 16- or 24-bit little-endian value to memory (`L`-width), used
    /// by `LD (nn),HL`/`LD (nn),rp` and their eZ80 24-bit forms.
    fn write_addr<B: Bus>(&mut self, bus: &mut B, addr: u32, val: u32) {
        bus.write_byte(self.mask_addr(addr), val as u8);
        bus.write_byte(self.mask_addr(addr.wrapping_add(1)), (val >> 8) as u8);
        if self.l {
            bus.write_byte(self.mask_addr(addr.wrapping_add(2)), (val >> 16) as u8);
        }
    }

    /// Read a 16- or 24-bit little-endian value from memory (`L`-width).
    fn read_addr<B: Bus>(&mut self, bus: &mut B, addr: u32) -> u32 {
        let lo = bus.read_byte(self.mask_addr(addr)) as u32;
        let hi = bus.read_byte(self.mask_addr(addr.wrapping_add(1))) as u32;
        if self.l {
            let top = bus.read_byte(self.mask_addr(addr.wrapping_add(2))) as u32;
            lo | (hi << 8) | (top << 16)
        } else {
            lo | (hi << 8)
        }
    }

    /// `RLCA`/`RRCA`/`RLA`/`RRA`/`DAA`/`CPL`/`SCF`/`CCF`. Unlike the CB-prefixed
    /// rotate group, the accumulator rotates leave S/Z/P untouched and copy
    /// F5/F3 from the new A.
    fn execute_rot_acc(&mut self, y: u8) {
        match y {
            0 => {
                let c = self.a & 0x80 != 0;
                self.a = (self.a << 1) | (c as u8);
                self.after_acc_rotate(c);
            }
            1 => {
                let c = self.a & 0x01 != 0;
                self.a = (self.a >> 1) | ((c as u8) << 7);
                self.after_acc_rotate(c);
            }
            2 => {
                let old_c = self.flag_c();
                let c = self.a & 0x80 != 0;
                self.a = (self.a << 1) | (old_c as u8);
                self.after_acc_rotate(c);
            }
            3 => {
                let old_c = self.flag_c();
                let c = self.a & 0x01 != 0;
                self.a = (self.a >> 1) | ((old_c as u8) << 7);
                self.after_acc_rotate(c);
            }
            4 => self.execute_daa(),
            5 => {
                // CPL
                self.a = !self.a;
                self.f |= flags::H | flags::N;
                self.f = (self.f & !(flags::F5 | flags::F3)) | (self.a & (flags::F5 | flags::F3));
            }
            6 => {
                // SCF
                self.set_flag_c(true);
                self.set_flag_h(false);
                self.set_flag_n(false);
                self.f = (self.f & !(flags::F5 | flags::F3)) | (self.a & (flags::F5 | flags::F3));
            }
            7 => {
                // CCF: H takes the old carry, C is inverted.
                let old_c = self.flag_c();
                self.set_flag_h(old_c);
                self.set_flag_c(!old_c);
                self.set_flag_n(false);
                self.f = (self.f & !(flags::F5 | flags::F3)) | (self.a & (flags::F5 | flags::F3));
            }
            _ => unreachable!(),
        }
    }

    #[inline]
    fn after_acc_rotate(&mut self, carry: bool) {
        self.f &= flags::S | flags::Z | flags::PV;
        self.f |= self.a & (flags::F5 | flags::F3);
        self.set_flag_c(carry);
        self.set_flag_h(false);
        self.set_flag_n(false);
    }

    /// `DAA`: additive correction `v` is 0x06 if the low nibble is out of BCD
    /// range (or H was set), plus 0x60 if the high nibble ends up out of range
    /// (or C was set); `v` is added under addition, subtracted under
    /// subtraction (N selects direction); C is set iff `v >= 0x60`; N itself
    /// is left untouched.
    fn execute_daa(&mut self) {
        let a = self.a;
        let n = self.flag_n();
        let mut v: u8 = 0;
        if (a & 0x0F) > 9 || self.flag_h() {
            v |= 0x06;
        }
        let high_after_low_fix = (a as u16 + v as u16) >> 4;
        if high_after_low_fix > 9 || self.flag_c() {
            v |= 0x60;
        }

        let half = if n {
            self.flag_h() && (a & 0x0F) < 6
        } else {
            (a & 0x0F) + (v & 0x0F) > 0x0F
        };
        let result = if n { a.wrapping_sub(v) } else { a.wrapping_add(v) };
        self.a = result;

        self.f &= flags::N;
        self.set_sz_flags(result);
        self.set_flag_pv(Self::parity(result));
        self.set_flag_h(half);
        self.set_flag_c(v >= 0x60);
    }

    // ========== ALU dispatch (x = 2, and `ALU n`) ==========

    /// `ADD`/`ADC`/`SUB`/`SBC`/`AND`/`XOR`/`OR`/`CP` against A, selected by `y`.
    pub(super) fn execute_alu(&mut self, y: u8, val: u8) {
        match y {
            0 => self.a = self.alu_add(val, false),
            1 => self.a = self.alu_add(val, true),
            2 => self.a = self.alu_sub(val, false),
            3 => self.a = self.alu_sub(val, true),
            4 => self.alu_and(val),
            5 => self.alu_xor(val),
            6 => self.alu_or(val),
            7 => {
                self.alu_sub(val, false);
            } // CP: flags only, A unchanged
            _ => unreachable!(),
        }
    }

    // ========== x = 3 ==========

    pub(super) fn execute_x3<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8, p: u8, q: u8) {
        match z {
            0 => {
                // RET cc
                bus.add_cycles(1);
                if self.check_cc(y) {
                    let addr = self.return_mixed(bus);
                    self.prefetch(bus, addr, self.adl);
                }
            }
            1 => {
                if q == 0 {
                    // AF is always a 16-bit pair, even in ADL/L mode.
                    let val = if p == 3 {
                        self.pop_word(bus) as u32
                    } else {
                        self.pop_addr(bus)
                    };
                    self.set_rp2(p, val);
                } else {
                    match p {
                        0 => {
                            let addr = self.return_mixed(bus);
                            self.prefetch(bus, addr, self.adl);
                        }
                        1 => self.exx(),
                        2 => {
                            let target = self.get_rp(2);
                            self.prefetch(bus, target, self.adl);
                        }
                        3 => {
                            let target = self.get_rp(2);
                            self.set_rp(3, target);
                            bus.add_cycles(self.addr_width() as u64 - 1);
                        }
                        _ => unreachable!(),
                    }
                }
            }
            2 => {
                let nn = self.fetch_word(bus);
                if self.check_cc(y) {
                    self.prefetch(bus, nn, self.il);
                }
            }
            3 => match y {
                0 => {
                    let nn = self.fetch_word_no_prefetch(bus);
                    self.prefetch(bus, nn, self.il);
                }
                1 => self.execute_cb(bus),
                2 => {
                    let n = self.fetch_byte(bus);
                    let a = self.a;
                    bus.port_write(n as u16, a);
                }
                3 => {
                    let n = self.fetch_byte(bus);
                    self.a = bus.port_read(n as u16);
                }
                4 => {
                    // EX (SP),HL / EX (SP),IX / EX (SP),IY
                    let sp = if self.l { self.spl } else { self.sps as u32 };
                    let lo = bus.read_byte(self.mask_addr(sp));
                    let hi = bus.read_byte(self.mask_addr(sp.wrapping_add(1)));
                    let old = self.get_rp(2);
                    bus.write_byte(self.mask_addr(sp), old as u8);
                    bus.write_byte(self.mask_addr(sp.wrapping_add(1)), (old >> 8) as u8);
                    let mut new_val = (lo as u32) | ((hi as u32) << 8);
                    if self.l {
                        let hi2 = bus.read_byte(self.mask_addr(sp.wrapping_add(2)));
                        bus.write_byte(self.mask_addr(sp.wrapping_add(2)), (old >> 16) as u8);
                        new_val |= (hi2 as u32) << 16;
                    }
                    self.set_rp(2, new_val);
                    bus.add_cycles(2);
                }
                5 => self.ex_de_hl(),
                6 => {
                    self.iff1 = false;
                    self.iff2 = false;
                }
                7 => self.start_ei_delay(),
                _ => unreachable!(),
            },
            4 => {
                let nn = self.fetch_word(bus);
                if self.check_cc(y) {
                    self.call_mixed(bus, nn, self.suffix);
                }
            }
            5 => {
                if q == 0 {
                    bus.add_cycles(1);
                    let val = self.get_rp2(p);
                    // AF is always a 16-bit pair, even in ADL/L mode.
                    if p == 3 {
                        self.push_word(bus, val as u16);
                    } else {
                        self.push_addr(bus, val);
                    }
                } else {
                    match p {
                        0 => {
                            let nn = self.fetch_word(bus);
                            self.call_mixed(bus, nn, self.suffix);
                        }
                        2 => {
                            let op = self.fetch_byte(bus);
                            self.execute_ed(bus, op);
                        }
                        // p = 1 (DD) / p = 3 (FD) are intercepted in `step` before
                        // opcode decomposition and never reach this table.
                        _ => unreachable!(),
                    }
                }
            }
            6 => {
                let n = self.fetch_byte(bus);
                self.execute_alu(y, n);
            }
            7 => {
                bus.add_cycles(1);
                let target = (y as u32) * 8;
                self.call_mixed(bus, target, self.suffix);
            }
            _ => unreachable!(),
        }
    }

    // ========== CB-prefixed rotate/BIT/RES/SET ==========

    /// `RLC`/`RRC`/`RL`/`RR`/`SLA`/`SRA`/`SRL` on an 8-bit value. `op = 6`
    /// (between SRA and SRL) is an opcode trap in this model, handled by the
    /// caller before `rotate_op` is reached.
    fn rotate_op(&mut self, op: u8, val: u8) -> u8 {
        let carry_in = self.flag_c();
        let (result, carry_out) = match op {
            0 => {
                let c = val & 0x80 != 0;
                ((val << 1) | (c as u8), c)
            }
            1 => {
                let c = val & 0x01 != 0;
                ((val >> 1) | ((c as u8) << 7), c)
            }
            2 => {
                let c = val & 0x80 != 0;
                ((val << 1) | (carry_in as u8), c)
            }
            3 => {
                let c = val & 0x01 != 0;
                ((val >> 1) | ((carry_in as u8) << 7), c)
            }
            4 => {
                let c = val & 0x80 != 0;
                (val << 1, c)
            }
            5 => {
                let c = val & 0x01 != 0;
                (((val as i8) >> 1) as u8, c)
            }
            7 => {
                let c = val & 0x01 != 0;
                (val >> 1, c)
            }
            _ => (val, false),
        };
        self.f = 0;
        self.set_sz_flags(result);
        self.set_flag_pv(Self::parity(result));
        self.set_flag_c(carry_out);
        self.set_flag_h(false);
        self.set_flag_n(false);
        result
    }

    /// `BIT y,v`: Z/PV mirror "bit clear"; S is set only for a set bit 7; H is
    /// always set, N always cleared. F5/F3 are simplified to copy from the
    /// tested value (real hardware reflects the high byte of the address
    /// latch for the `(HL)`/`(IX+d)` forms, which this core does not model).
    fn execute_bit(&mut self, y: u8, val: u8) {
        let set = val & (1 << y) != 0;
        self.set_flag_z(!set);
        self.set_flag_pv(!set);
        self.set_flag_h(true);
        self.set_flag_n(false);
        self.set_flag_s(y == 7 && set);
        self.f = (self.f & !(flags::F5 | flags::F3)) | (val & (flags::F5 | flags::F3));
    }

    fn execute_cb<B: Bus>(&mut self, bus: &mut B) {
        let op = self.fetch_byte(bus);
        let x = (op >> 6) & 3;
        let y = (op >> 3) & 7;
        let z = op & 7;
        let val = self.get_reg8(bus, z);
        match x {
            0 => {
                if y == 6 {
                    // opcode trap: undefined rotate, value left unchanged.
                    self.start_ei_delay();
                    return;
                }
                let result = self.rotate_op(y, val);
                self.set_reg8(bus, z, result);
                if z == 6 {
                    bus.add_cycles(2);
                }
            }
            1 => {
                self.execute_bit(y, val);
                if z == 6 {
                    bus.add_cycles(1);
                }
            }
            2 => {
                let result = val & !(1 << y);
                self.set_reg8(bus, z, result);
                if z == 6 {
                    bus.add_cycles(2);
                }
            }
            3 => {
                let result = val | (1 << y);
                self.set_reg8(bus, z, result);
                if z == 6 {
                    bus.add_cycles(2);
                }
            }
            _ => unreachable!(),
        }
    }

    /// DD CB d op / FD CB d op: the displacement precedes the opcode byte.
    /// The memory operand is always `(IX+d)`/`(IY+d)`; when `z != 6` the
    /// result is *also* copied into the plain register `r[z]` (never the
    /// PREFIX-substituted one — PREFIX only ever governs the address here).
    pub(super) fn execute_index_cb<B: Bus>(&mut self, bus: &mut B) {
        let d = self.fetch_offset(bus);
        let op = self.fetch_byte(bus);
        let base = if self.prefix == 3 { self.iy } else { self.ix };
        let addr = self.mask_addr(self.wrap_data((base as i64 + d as i64) as u32));

        let x = (op >> 6) & 3;
        let y = (op >> 3) & 7;
        let z = op & 7;
        let val = bus.read_byte(addr);

        if x == 1 {
            self.execute_bit(y, val);
            return;
        }

        let result = match x {
            0 => {
                if y == 6 {
                    val
                } else {
                    self.rotate_op(y, val)
                }
            }
            2 => val & !(1 << y),
            3 => val | (1 << y),
            _ => unreachable!(),
        };
        bus.write_byte(addr, result);
        if z != 6 {
            self.set_reg8_direct(z, result);
        }
    }

    // ========== ED-prefixed ==========

    pub(super) fn execute_ed<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let x = (op >> 6) & 3;
        let y = (op >> 3) & 7;
        let z = op & 7;
        let p = (y >> 1) & 3;
        let q = y & 1;

        match x {
            0 => self.execute_ed_x0(bus, y, z),
            1 => self.execute_ed_x1(bus, y, z, p, q),
            2 => {
                if (4..=7).contains(&y) && z < 4 {
                    self.execute_bli(bus, y, z);
                } else if (0..=3).contains(&y) && (2..=4).contains(&z) {
                    self.execute_bli_ez80(bus, y, z);
                } else if (4..=7).contains(&y) && z == 4 {
                    self.execute_bli_ez80(bus, y, z);
                } else {
                    // other (x=2) combinations: opcode trap, treated as NOP.
                    self.start_ei_delay();
                }
            }
            3 => {
                if op == 0xEE {
                    self.flush_flash_sector(bus);
                } else {
                    // other x = 3 combinations: NONI/opcode-trap space in this model.
                    self.start_ei_delay();
                }
            }
            _ => unreachable!(),
        }
    }

    /// `ED EE`: flushes the 16 KiB flash sector containing `HL` by writing
    /// 0xFF across `[HL & ~0x3FFF, +0x4000)`.
    fn flush_flash_sector<B: Bus>(&mut self, bus: &mut B) {
        let base = self.hl & !0x3FFF;
        for off in 0..0x4000u32 {
            let addr = self.mask_addr(base.wrapping_add(off));
            bus.write_byte(addr, 0xFF);
        }
    }

    /// eZ80 extensions occupying the ED x=0 quadrant: `IN0 r,(n)`, `OUT0 (n),r`,
    /// `LEA rp,ix+d` / `LEA rp,iy+d`, `TST A,r`, `STMIX`/`RSMIX`, `SLP`.
    /// Combinations this model doesn't assign a meaning to are treated as a
    /// one-cycle NOP (opcode trap).
    fn execute_ed_x0<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8) {
        match z {
            0 => {
                // IN0 r[y],(n)
                let n = self.fetch_byte(bus);
                let val = bus.port_read(n as u16);
                self.set_reg8(bus, y, val);
                self.set_sz_flags(val);
                self.set_flag_pv(Self::parity(val));
                self.set_flag_h(false);
                self.set_flag_n(false);
            }
            1 => {
                // OUT0 (n),r[y]
                let n = self.fetch_byte(bus);
                let val = self.get_reg8(bus, y);
                bus.port_write(n as u16, val);
            }
            3 => {
                // TST A,r[y]
                let val = self.get_reg8(bus, y);
                let saved = self.a;
                self.alu_and(val);
                self.a = saved;
            }
            4 if y < 4 => {
                // LEA rp[y]: destination register pair loaded with the
                // current PREFIX index register plus the displacement byte.
                let base = self.idx_hl();
                let addr = self.wrap_data((base as i64 + self.disp as i64) as u32);
                self.set_rp(y, addr);
            }
            _ => {
                match (y, z) {
                    (6, 4) => self.madl = true,  // STMIX
                    (7, 4) => self.madl = false, // RSMIX
                    (0, 6) => {}                 // SLP: modeled as a one-cycle NOP.
                    _ => self.start_ei_delay(),  // opcode trap
                }
                bus.add_cycles(1);
            }
        }
    }

    /// Standard ED x=1 block: `IN r,(C)`/`OUT (C),r`, `SBC`/`ADC HL,rp`,
    /// `LD (nn),rp`/`LD rp,(nn)`, `NEG`, `RETN`/`RETI`, `IM`, `LD I/R,A`,
    /// `LD A,I/R`, `RRD`/`RLD`.
    fn execute_ed_x1<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8, p: u8, q: u8) {
        match z {
            0 => {
                let c = self.c() as u16;
                let val = bus.port_read(c);
                if y != 6 {
                    self.set_reg8(bus, y, val);
                }
                self.set_sz_flags(val);
                self.set_flag_pv(Self::parity(val));
                self.set_flag_h(false);
                self.set_flag_n(false);
            }
            1 => {
                let c = self.c() as u16;
                let val = if y == 6 { 0 } else { self.get_reg8(bus, y) };
                bus.port_write(c, val);
            }
            2 => {
                let hl = self.get_rp(2);
                let rp = self.get_rp(p);
                let result = if q == 0 {
                    self.alu_sbc16(hl, rp)
                } else {
                    self.alu_adc16(hl, rp)
                };
                self.set_rp(2, result);
                bus.add_cycles(self.addr_width() as u64 + 4);
            }
            3 => {
                let nn = self.fetch_word(bus);
                if q == 0 {
                    let rp = self.get_rp(p);
                    self.write_addr(bus, nn, rp);
                } else {
                    let val = self.read_addr(bus, nn);
                    self.set_rp(p, val);
                }
            }
            4 => {
                // NEG
                let saved = self.a;
                self.a = 0;
                self.a = self.alu_sub(saved, false);
            }
            5 => {
                let addr = self.return_mixed(bus);
                self.prefetch(bus, addr, self.adl);
                if y != 1 {
                    self.iff1 = self.iff2;
                }
            }
            6 => {
                self.im = match y {
                    0 | 1 | 4 => super::InterruptMode::Mode0,
                    2 | 5 => super::InterruptMode::Mode1,
                    3 | 6 => super::InterruptMode::Mode2,
                    7 => super::InterruptMode::Mode3,
                    _ => unreachable!(),
                };
            }
            7 => match y {
                0 => self.i = ((self.a as u16) << 8) | (self.i & 0xFF),
                1 => self.r = self.a,
                2 => {
                    self.a = (self.i >> 8) as u8;
                    self.f &= flags::C;
                    self.set_sz_flags(self.a);
                    self.set_flag_pv(self.iff2);
                    self.set_flag_h(false);
                    self.set_flag_n(false);
                }
                3 => {
                    self.a = self.r;
                    self.f &= flags::C;
                    self.set_sz_flags(self.a);
                    self.set_flag_pv(self.iff2);
                    self.set_flag_h(false);
                    self.set_flag_n(false);
                }
                4 => self.execute_rld(bus),
                5 => self.execute_rrd(bus),
                _ => {
                    self.start_ei_delay();
                    bus.add_cycles(1);
                }
            },
            _ => unreachable!(),
        }
    }

    fn alu_sbc16(&mut self, a: u32, b: u32) -> u32 {
        let width_mask: u32 = if self.l { 0xFFFFFF } else { 0xFFFF };
        let sign_bit: u32 = if self.l { 0x800000 } else { 0x8000 };
        let carry = self.flag_c() as i64;
        let diff = a as i64 - b as i64 - carry;
        let result = (diff as u32) & width_mask;
        let half = (a & 0xFFF) < (b & 0xFFF) + carry as u32;
        let overflow = ((a ^ b) & sign_bit != 0) && ((a ^ result) & sign_bit != 0);

        self.f = 0;
        if result == 0 {
            self.f |= flags::Z;
        }
        if result & sign_bit != 0 {
            self.f |= flags::S;
        }
        self.f |= ((result >> 8) as u8) & (flags::F5 | flags::F3);
        self.set_flag_h(half);
        self.set_flag_pv(overflow);
        self.set_flag_n(true);
        self.set_flag_c(diff < 0);

        result
    }

    fn alu_adc16(&mut self, a: u32, b: u32) -> u32 {
        let width_mask: u32 = if self.l { 0xFFFFFF } else { 0xFFFF };
        let sign_bit: u32 = if self.l { 0x800000 } else { 0x8000 };
        let carry = self.flag_c() as u64;
        let sum = a as u64 + b as u64 + carry;
        let result = (sum as u32) & width_mask;
        let half = ((a & 0xFFF) + (b & 0xFFF) + carry as u32) > 0xFFF;
        let overflow = ((a ^ b) & sign_bit == 0) && ((a ^ result) & sign_bit != 0);

        self.f = 0;
        if result == 0 {
            self.f |= flags::Z;
        }
        if result & sign_bit != 0 {
            self.f |= flags::S;
        }
        self.f |= ((result >> 8) as u8) & (flags::F5 | flags::F3);
        self.set_flag_h(half);
        self.set_flag_pv(overflow);
        self.set_flag_n(false);
        self.set_flag_c(sum > width_mask as u64);

        result
    }

    fn execute_rld<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.mask_addr(self.hl);
        let m = bus.read_byte(addr);
        let new_m = (m << 4) | (self.a & 0x0F);
        let new_a = (self.a & 0xF0) | (m >> 4);
        bus.write_byte(addr, new_m);
        self.a = new_a;
        self.f &= flags::C;
        self.set_sz_flags(self.a);
        self.set_flag_pv(Self::parity(self.a));
        self.set_flag_h(false);
        self.set_flag_n(false);
        bus.add_cycles(4);
    }

    fn execute_rrd<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.mask_addr(self.hl);
        let m = bus.read_byte(addr);
        let new_m = (self.a << 4) | (m >> 4);
        let new_a = (self.a & 0xF0) | (m & 0x0F);
        bus.write_byte(addr, new_m);
        self.a = new_a;
        self.f &= flags::C;
        self.set_sz_flags(self.a);
        self.set_flag_pv(Self::parity(self.a));
        self.set_flag_h(false);
        self.set_flag_n(false);
        bus.add_cycles(4);
    }

    // ========== Block instructions ==========

    /// Re-prefetch rule for repeating block instructions: when the repeat
    /// condition holds, PC is backed up to the start of the instruction
    /// (2 bytes for the ED-prefixed opcode, plus 1 more if a suffix preceded
    /// it) and the prefetch buffer reloaded, so the next `step()` re-decodes
    /// the same instruction — this is how byte-count-driven loops and
    /// interrupt recognition between iterations both fall out of the normal
    /// fetch/execute loop.
    fn repeat_bli<B: Bus>(&mut self, bus: &mut B) {
        let back = 2 + self.suffix as u32;
        let pc = self.wrap_pc(self.pc.wrapping_sub(back));
        self.prefetch(bus, pc, self.adl);
    }

    /// `LDI`/`LDD`/`LDIR`/`LDDR`, `CPI`/`CPD`/`CPIR`/`CPDR`,
    /// `INI`/`IND`/`INIR`/`INDR`, `OUTI`/`OUTD`/`OTIR`/`OTDR`. The
    /// increment/decrement direction is `y & 1` (0 = increment, 1 =
    /// decrement); the repeat flag is `y & 2`; `z` selects LD/CP/IN/OUT.
    fn execute_bli<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8) {
        let decrement = y & 1 != 0;
        let repeat = y & 2 != 0;
        let step: i64 = if decrement { -1 } else { 1 };

        match z {
            0 => {
                // LDI/LDD/LDIR/LDDR
                let val = bus.read_byte(self.mask_addr(self.hl));
                bus.write_byte(self.mask_addr(self.de), val);
                self.hl = self.wrap_data((self.hl as i64 + step) as u32);
                self.de = self.wrap_data((self.de as i64 + step) as u32);
                self.dec_bc_block();
                let bc_zero = self.bc as u16 == 0;
                let n = val.wrapping_add(self.a);
                self.set_flag_h(false);
                self.set_flag_n(false);
                self.set_flag_pv(!bc_zero);
                self.f &= !(flags::F5 | flags::F3);
                self.f |= n & flags::F3;
                self.f |= (n << 4) & flags::F5;
                bus.add_cycles(2);
                if repeat && !bc_zero {
                    bus.add_cycles(5);
                    self.repeat_bli(bus);
                }
            }
            1 => {
                // CPI/CPD/CPIR/CPDR
                let val = bus.read_byte(self.mask_addr(self.hl));
                self.hl = self.wrap_data((self.hl as i64 + step) as u32);
                self.dec_bc_block();
                let bc_zero = self.bc as u16 == 0;
                let result = self.a.wrapping_sub(val);
                let half = (self.a & 0x0F) < (val & 0x0F);
                let n = if half { result.wrapping_sub(1) } else { result };
                self.set_sz_flags(result);
                self.f &= !(flags::F5 | flags::F3);
                self.f |= n & flags::F3;
                self.f |= (n << 4) & flags::F5;
                self.set_flag_h(half);
                self.set_flag_pv(!bc_zero);
                self.set_flag_n(true);
                bus.add_cycles(5);
                if repeat && !bc_zero && result != 0 {
                    bus.add_cycles(5);
                    self.repeat_bli(bus);
                }
            }
            2 => {
                // INI/IND/INIR/INDR
                let c = self.c() as u16;
                let val = bus.port_read(c);
                bus.write_byte(self.mask_addr(self.hl), val);
                self.hl = self.wrap_data((self.hl as i64 + step) as u32);
                let b = self.b().wrapping_sub(1);
                self.set_b(b);
                self.set_flag_n(val & 0x80 != 0);
                self.set_flag_z(b == 0);
                bus.add_cycles(1);
                if repeat && b != 0 {
                    bus.add_cycles(5);
                    self.repeat_bli(bus);
                }
            }
            3 => {
                // OUTI/OUTD/OTIR/OTDR
                let val = bus.read_byte(self.mask_addr(self.hl));
                self.hl = self.wrap_data((self.hl as i64 + step) as u32);
                let b = self.b().wrapping_sub(1);
                self.set_b(b);
                let c = self.c() as u16;
                bus.port_write(c, val);
                self.set_flag_n(val & 0x80 != 0);
                self.set_flag_z(b == 0);
                bus.add_cycles(1);
                if repeat && b != 0 {
                    bus.add_cycles(5);
                    self.repeat_bli(bus);
                }
            }
            _ => unreachable!(),
        }
    }

    /// eZ80 block-instruction extensions: `INIM`/`INDM`/`INIMR`/`INDMR`,
    /// `OTIM`/`OTDM`/`OTIMR`/`OTDMR` (the port address comes from all of
    /// `BC`, not a fixed `C` with `B` as a separate counter), `INI2`/`IND2`/
    /// `INI2R`/`IND2R`, `OUTI2`/`OUTD2`/`OTI2R`/`OTD2R` (doubled transfer
    /// count per iteration), and `INIRX`/`OTIRX`/`INDRX`/`OTDRX`. Opcode
    /// assignment within the ED x=2 quadrant's `(y ∈ 0..3, z ∈ 2..4)` and
    /// `(y ∈ 4..7, z = 4)` ranges follows this implementation's own
    /// convention rather than a literal Zilog encoding table (not present in
    /// the reference material this core was built against); see DESIGN.md.
    fn execute_bli_ez80<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8) {
        let decrement = y & 1 != 0;
        let repeat = y & 2 != 0;
        let step: i64 = if decrement { -1 } else { 1 };
        let doubled = z == 4;
        let is_output = z == 3 || (z == 4 && (4..=7).contains(&y));
        let count = if doubled { 2 } else { 1 };

        for _ in 0..count {
            if is_output {
                let val = bus.read_byte(self.mask_addr(self.hl));
                self.hl = self.wrap_data((self.hl as i64 + step) as u32);
                bus.port_write(self.bc as u16, val);
            } else {
                let val = bus.port_read(self.bc as u16);
                bus.write_byte(self.mask_addr(self.hl), val);
                self.hl = self.wrap_data((self.hl as i64 + step) as u32);
            }
            self.dec_bc_block();
        }

        let bc_zero = self.bc as u16 == 0;
        self.set_flag_z(bc_zero);
        self.set_flag_n(false);
        bus.add_cycles(2 * count as u64);

        if repeat && !bc_zero {
            bus.add_cycles(5);
            self.repeat_bli(bus);
        }
    }
}
