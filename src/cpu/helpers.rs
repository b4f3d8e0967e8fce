//! eZ80 CPU helper functions
//!
//! - Register accessors (b, c, d, e, h, l, ixh, ixl, iyh, iyl)
//! - Flag helpers (flag_c, set_flag_c, etc.)
//! - Address masking (mask_addr, mask_addr_instr, wrap_pc, wrap_data)
//! - Fetch/prefetch (prefetch, flush, fetch_byte, fetch_word, fetch_word_no_prefetch)
//! - Stack operations, including the mixed-mode CALL/RET layout
//! - ALU operations (alu_add, alu_sub, alu_and, alu_or, alu_xor, alu_inc, alu_dec)
//! - Register access by index (get_reg8, set_reg8, get_rp, set_rp)
//! - Register exchange (ex_af, exx, ex_de_hl)
//!
//! # References
//! - eZ80 CPU User Manual (Zilog UM0077)
//! - CEmu (https://github.com/CE-Programming/CEmu)

use super::flags;
use super::Cpu;
use crate::bus::Bus;

impl Cpu {
    // ========== Register Accessors ==========

    #[inline]
    pub fn b(&self) -> u8 {
        (self.bc >> 8) as u8
    }
    #[inline]
    pub fn set_b(&mut self, val: u8) {
        self.bc = (self.bc & 0xFF00FF) | ((val as u32) << 8);
    }
    #[inline]
    pub fn c(&self) -> u8 {
        self.bc as u8
    }
    #[inline]
    pub fn set_c(&mut self, val: u8) {
        self.bc = (self.bc & 0xFFFF00) | (val as u32);
    }
    #[inline]
    pub fn d(&self) -> u8 {
        (self.de >> 8) as u8
    }
    #[inline]
    pub fn set_d(&mut self, val: u8) {
        self.de = (self.de & 0xFF00FF) | ((val as u32) << 8);
    }
    #[inline]
    pub fn e(&self) -> u8 {
        self.de as u8
    }
    #[inline]
    pub fn set_e(&mut self, val: u8) {
        self.de = (self.de & 0xFFFF00) | (val as u32);
    }
    #[inline]
    pub fn h(&self) -> u8 {
        (self.hl >> 8) as u8
    }
    #[inline]
    pub fn set_h(&mut self, val: u8) {
        self.hl = (self.hl & 0xFF00FF) | ((val as u32) << 8);
    }
    #[inline]
    pub fn l(&self) -> u8 {
        self.hl as u8
    }
    #[inline]
    pub fn set_l(&mut self, val: u8) {
        self.hl = (self.hl & 0xFFFF00) | (val as u32);
    }
    #[inline]
    pub fn ixh(&self) -> u8 {
        (self.ix >> 8) as u8
    }
    #[inline]
    pub fn set_ixh(&mut self, val: u8) {
        self.ix = (self.ix & 0xFF00FF) | ((val as u32) << 8);
    }
    #[inline]
    pub fn ixl(&self) -> u8 {
        self.ix as u8
    }
    #[inline]
    pub fn set_ixl(&mut self, val: u8) {
        self.ix = (self.ix & 0xFFFF00) | (val as u32);
    }
    #[inline]
    pub fn iyh(&self) -> u8 {
        (self.iy >> 8) as u8
    }
    #[inline]
    pub fn set_iyh(&mut self, val: u8) {
        self.iy = (self.iy & 0xFF00FF) | ((val as u32) << 8);
    }
    #[inline]
    pub fn iyl(&self) -> u8 {
        self.iy as u8
    }
    #[inline]
    pub fn set_iyl(&mut self, val: u8) {
        self.iy = (self.iy & 0xFFFF00) | (val as u32);
    }

    // ========== Flag Helpers ==========

    #[inline]
    pub fn flag_c(&self) -> bool {
        self.f & flags::C != 0
    }
    #[inline]
    pub fn set_flag_c(&mut self, val: bool) {
        if val {
            self.f |= flags::C;
        } else {
            self.f &= !flags::C;
        }
    }
    #[inline]
    pub fn flag_z(&self) -> bool {
        self.f & flags::Z != 0
    }
    #[inline]
    pub fn set_flag_z(&mut self, val: bool) {
        if val {
            self.f |= flags::Z;
        } else {
            self.f &= !flags::Z;
        }
    }
    #[inline]
    pub fn flag_s(&self) -> bool {
        self.f & flags::S != 0
    }
    #[inline]
    pub fn set_flag_s(&mut self, val: bool) {
        if val {
            self.f |= flags::S;
        } else {
            self.f &= !flags::S;
        }
    }
    #[inline]
    pub fn flag_h(&self) -> bool {
        self.f & flags::H != 0
    }
    #[inline]
    pub fn set_flag_h(&mut self, val: bool) {
        if val {
            self.f |= flags::H;
        } else {
            self.f &= !flags::H;
        }
    }
    #[inline]
    pub fn flag_pv(&self) -> bool {
        self.f & flags::PV != 0
    }
    #[inline]
    pub fn set_flag_pv(&mut self, val: bool) {
        if val {
            self.f |= flags::PV;
        } else {
            self.f &= !flags::PV;
        }
    }
    #[inline]
    pub fn flag_n(&self) -> bool {
        self.f & flags::N != 0
    }
    #[inline]
    pub fn set_flag_n(&mut self, val: bool) {
        if val {
            self.f |= flags::N;
        } else {
            self.f &= !flags::N;
        }
    }

    /// Set S, Z, F5, F3 from an 8-bit result (the undocumented bits copy the result).
    #[inline]
    pub fn set_sz_flags(&mut self, result: u8) {
        self.f &= !(flags::S | flags::Z | flags::F5 | flags::F3);
        if result == 0 {
            self.f |= flags::Z;
        }
        if result & 0x80 != 0 {
            self.f |= flags::S;
        }
        self.f |= result & (flags::F5 | flags::F3);
    }

    #[inline]
    pub fn parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    // ========== Register Pair Exchange ==========

    pub fn ex_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
    }

    pub fn exx(&mut self) {
        std::mem::swap(&mut self.bc, &mut self.bc_prime);
        std::mem::swap(&mut self.de, &mut self.de_prime);
        std::mem::swap(&mut self.hl, &mut self.hl_prime);
    }

    pub fn ex_de_hl(&mut self) {
        std::mem::swap(&mut self.de, &mut self.hl);
    }

    // ========== Address Masking ==========

    /// Compose a data-operand address: MBASE-banked 16-bit when `L = 0`, full 24-bit when `L = 1`.
    #[inline]
    pub fn mask_addr(&self, addr: u32) -> u32 {
        if self.l {
            addr & 0xFFFFFF
        } else {
            ((self.mbase as u32) << 16) | (addr & 0xFFFF)
        }
    }

    /// Compose an instruction-fetch address: MBASE-banked 16-bit when `ADL = 0`, full 24-bit when `ADL = 1`.
    #[inline]
    pub fn mask_addr_instr(&self, addr: u32) -> u32 {
        if self.adl {
            addr & 0xFFFFFF
        } else {
            ((self.mbase as u32) << 16) | (addr & 0xFFFF)
        }
    }

    /// Wrap PC/SP to the ADL-selected address width (no MBASE).
    #[inline]
    pub fn wrap_pc(&self, addr: u32) -> u32 {
        if self.adl {
            addr & 0xFFFFFF
        } else {
            addr & 0xFFFF
        }
    }

    /// Wrap a data register (HL, DE) to the L-selected width (no MBASE); used by block instructions.
    #[inline]
    pub fn wrap_data(&self, addr: u32) -> u32 {
        if self.l {
            addr & 0xFFFFFF
        } else {
            addr & 0xFFFF
        }
    }

    /// Decrement BC for a block instruction's repeat counter. Under `L = 1`
    /// this wraps the full 24-bit BC; under `L = 0` only the 16-bit `BCS`
    /// alias is updated and BC's upper byte survives untouched, per the
    /// mode-partial rule for BC-decrementing block ops ("do not mask BC").
    #[inline]
    pub(super) fn dec_bc_block(&mut self) {
        if self.l {
            self.bc = self.bc.wrapping_sub(1) & 0xFFFFFF;
        } else {
            let low16 = (self.bc as u16).wrapping_sub(1);
            self.bc = (self.bc & 0xFF0000) | low16 as u32;
        }
    }

    /// Effective address width in bytes for the current L mode (2 or 3).
    #[inline]
    pub fn addr_width(&self) -> u8 {
        if self.l {
            3
        } else {
            2
        }
    }

    // ========== Fetch / Prefetch ==========

    /// Reset prefetch and boundary state to `addr` in `mode`: sets `ADL = mode`,
    /// recomputes PC, and loads the prefetch byte from memory at the new PC.
    #[inline]
    pub fn prefetch<B: Bus>(&mut self, bus: &mut B, addr: u32, mode: bool) {
        self.adl = mode;
        self.pc = self.wrap_pc(addr);
        let effective = self.mask_addr_instr(self.pc);
        self.prefetch = bus.read_byte(effective);
    }

    /// Reset prefetch and boundary state to `addr` in `mode`, additionally
    /// normalizing `PREFIX = SUFFIX = 0`, `L = IL = ADL` (the per-instruction
    /// invariant from the data model). Used by `reset()` and after any control
    /// transfer that would otherwise leave a stale prefix/suffix behind.
    #[inline]
    pub fn flush<B: Bus>(&mut self, bus: &mut B, addr: u32, mode: bool) {
        self.prefix = 0;
        self.suffix = false;
        self.prefetch(bus, addr, mode);
        self.l = self.adl;
        self.il = self.adl;
    }

    /// Return the current prefetch byte, advance R, and prefetch `PC + 1` in
    /// the current ADL mode. Debugger breakpoints are checked before the byte
    /// is consumed.
    #[inline]
    pub fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        if bus.exec_breakpoint(self.pc) {
            bus.on_break(crate::bus::BreakReason::Exec, self.pc);
        } else if bus.step_breakpoint(self.pc) {
            bus.on_break(crate::bus::BreakReason::Step, self.pc);
        }

        let byte = self.prefetch;
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
        let next = self.wrap_pc(self.pc.wrapping_add(1));
        self.prefetch(bus, next, self.adl);
        byte
    }

    /// Fetch a byte, reinterpreted as a signed 8-bit displacement/offset.
    #[inline]
    pub fn fetch_offset<B: Bus>(&mut self, bus: &mut B) -> i8 {
        self.fetch_byte(bus) as i8
    }

    /// Fetch a 16-bit little-endian word; if `IL = 1`, fetch a third byte forming a 24-bit word.
    #[inline]
    pub fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let lo = self.fetch_byte(bus) as u32;
        let hi = self.fetch_byte(bus) as u32;
        if self.il {
            let top = self.fetch_byte(bus) as u32;
            lo | (hi << 8) | (top << 16)
        } else {
            lo | (hi << 8)
        }
    }

    /// Same operand width as [`Cpu::fetch_word`], but the final byte is taken
    /// directly from the current prefetch buffer instead of issuing a new
    /// prefetch: used by taken jumps/calls, whose own `prefetch()` call
    /// immediately afterward replaces it with the branch target anyway.
    #[inline]
    pub fn fetch_word_no_prefetch<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.il {
            let b0 = self.fetch_byte(bus) as u32;
            let b1 = self.fetch_byte(bus) as u32;
            let b2 = self.prefetch as u32;
            self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
            self.pc = self.wrap_pc(self.pc.wrapping_add(1));
            b0 | (b1 << 8) | (b2 << 16)
        } else {
            let lo = self.fetch_byte(bus) as u32;
            let hi = self.prefetch as u32;
            self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
            self.pc = self.wrap_pc(self.pc.wrapping_add(1));
            lo | (hi << 8)
        }
    }

    // ========== Stack Operations ==========
    //
    // Plain push/pop select the mode-current stack: SPL if `L = 1`, else SPS
    // (see "Stack selection" in DESIGN NOTES). The mixed-mode CALL/RET layout
    // below instead addresses SPL and SPS explicitly, per the suffix rules.

    #[inline]
    pub(super) fn push_byte_spl<B: Bus>(&mut self, bus: &mut B, val: u8) {
        self.spl = self.spl.wrapping_sub(1) & 0xFFFFFF;
        bus.write_byte(self.mask_addr(self.spl), val);
    }

    #[inline]
    pub(super) fn pop_byte_spl<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let val = bus.read_byte(self.mask_addr(self.spl));
        self.spl = self.spl.wrapping_add(1) & 0xFFFFFF;
        val
    }

    #[inline]
    pub(super) fn push_byte_sps<B: Bus>(&mut self, bus: &mut B, val: u8) {
        self.sps = self.sps.wrapping_sub(1);
        bus.write_byte(self.mask_addr(self.sps as u32), val);
    }

    #[inline]
    pub(super) fn pop_byte_sps<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let val = bus.read_byte(self.mask_addr(self.sps as u32));
        self.sps = self.sps.wrapping_add(1);
        val
    }

    /// Push a byte onto the mode-selected stack (SPL if `L = 1`, else SPS).
    #[inline]
    pub fn push_byte<B: Bus>(&mut self, bus: &mut B, val: u8) {
        if self.l {
            self.push_byte_spl(bus, val);
        } else {
            self.push_byte_sps(bus, val);
        }
    }

    /// Pop a byte from the mode-selected stack.
    #[inline]
    pub fn pop_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        if self.l {
            self.pop_byte_spl(bus)
        } else {
            self.pop_byte_sps(bus)
        }
    }

    /// Push a 16-bit word, high byte first.
    #[inline]
    pub fn push_word<B: Bus>(&mut self, bus: &mut B, val: u16) {
        self.push_byte(bus, (val >> 8) as u8);
        self.push_byte(bus, val as u8);
    }

    /// Pop a 16-bit word.
    #[inline]
    pub fn pop_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop_byte(bus) as u16;
        let hi = self.pop_byte(bus) as u16;
        lo | (hi << 8)
    }

    /// Push an address: 24-bit if `L = 1`, 16-bit otherwise.
    #[inline]
    pub fn push_addr<B: Bus>(&mut self, bus: &mut B, val: u32) {
        if self.l {
            self.push_byte(bus, (val >> 16) as u8);
            self.push_byte(bus, (val >> 8) as u8);
            self.push_byte(bus, val as u8);
        } else {
            self.push_word(bus, val as u16);
        }
    }

    /// Pop an address: 24-bit if `L = 1`, 16-bit otherwise.
    #[inline]
    pub fn pop_addr<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.l {
            let lo = self.pop_byte(bus) as u32;
            let mid = self.pop_byte(bus) as u32;
            let hi = self.pop_byte(bus) as u32;
            lo | (mid << 8) | (hi << 16)
        } else {
            self.pop_word(bus) as u32
        }
    }

    /// Push `PC` per the mixed-mode CALL layout when `mixed`, else a plain
    /// mode-selected `push_addr`, and issue `prefetch(target, IL)`.
    ///
    /// Mixed layout (pushed in this order, so popped in reverse by
    /// [`Cpu::return_mixed`]):
    /// 1. if `ADL = 1`: PCU to SPL.
    /// 2. PCH then PCL, to SPL if `IL = 1 || (L = 1 && ADL = 0)`, else to SPS.
    /// 3. a mode byte `(MADL << 1) | ADL`, to SPL.
    pub(super) fn call_mixed<B: Bus>(&mut self, bus: &mut B, target: u32, mixed: bool) {
        if mixed {
            if self.adl {
                let pcu = ((self.pc >> 16) & 0xFF) as u8;
                self.push_byte_spl(bus, pcu);
            }
            let pch = ((self.pc >> 8) & 0xFF) as u8;
            let pcl = (self.pc & 0xFF) as u8;
            let via_spl = self.il || (self.l && !self.adl);
            if via_spl {
                self.push_byte_spl(bus, pch);
                self.push_byte_spl(bus, pcl);
            } else {
                self.push_byte_sps(bus, pch);
                self.push_byte_sps(bus, pcl);
            }
            let mode_byte = ((self.madl as u8) << 1) | (self.adl as u8);
            self.push_byte_spl(bus, mode_byte);
        } else {
            self.push_addr(bus, self.pc);
        }
        self.prefetch(bus, target, self.il);
    }

    /// Pop a return address per the mixed-mode RET layout when the current
    /// instruction is suffixed, else a plain mode-selected `pop_addr`. Reverses
    /// [`Cpu::call_mixed`]'s push order: mode byte first, then PCL/PCH, then
    /// PCU if the saved mode had `ADL = 1`. Restores `ADL` from the saved mode.
    pub(super) fn return_mixed<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.suffix {
            let mode_byte = self.pop_byte_spl(bus);
            let prior_adl = mode_byte & 1 != 0;
            // Unlike call_mixed's push side, CEmu's cpu_return picks the
            // low-16 stack source from the CPU's current ADL alone, not IL/L.
            let via_spl = self.adl;
            let pcl = if via_spl {
                self.pop_byte_spl(bus)
            } else {
                self.pop_byte_sps(bus)
            } as u32;
            let pch = if via_spl {
                self.pop_byte_spl(bus)
            } else {
                self.pop_byte_sps(bus)
            } as u32;
            let mut addr = (pch << 8) | pcl;
            if prior_adl {
                addr |= (self.pop_byte_spl(bus) as u32) << 16;
            }
            self.adl = prior_adl;
            addr
        } else {
            self.pop_addr(bus)
        }
    }

    // ========== ALU Operations ==========
    // Undocumented bits 5/3 of F are preserved from the prior F on every
    // arithmetic op that does not explicitly compute them.

    pub(super) fn alu_add(&mut self, val: u8, carry: bool) -> u8 {
        let c = if carry && self.flag_c() { 1u16 } else { 0 };
        let result = self.a as u16 + val as u16 + c;

        let half = ((self.a & 0x0F) + (val & 0x0F) + c as u8) > 0x0F;
        let overflow = ((self.a ^ val) & 0x80 == 0) && ((self.a ^ result as u8) & 0x80 != 0);

        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.f = 0;
        self.set_sz_flags(result as u8);
        self.f |= old_f3f5;
        self.set_flag_c(result > 0xFF);
        self.set_flag_h(half);
        self.set_flag_pv(overflow);
        self.set_flag_n(false);

        result as u8
    }

    pub(super) fn alu_sub(&mut self, val: u8, carry: bool) -> u8 {
        let c = if carry && self.flag_c() { 1u16 } else { 0 };
        let result = (self.a as u16).wrapping_sub(val as u16).wrapping_sub(c);

        let half = (self.a & 0x0F) < (val & 0x0F) + c as u8;
        let overflow = ((self.a ^ val) & 0x80 != 0) && ((self.a ^ result as u8) & 0x80 != 0);

        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.f = 0;
        self.set_sz_flags(result as u8);
        self.f |= old_f3f5;
        self.set_flag_c(result > 0xFF);
        self.set_flag_h(half);
        self.set_flag_pv(overflow);
        self.set_flag_n(true);

        result as u8
    }

    pub(super) fn alu_and(&mut self, val: u8) {
        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.a &= val;
        self.f = 0;
        if self.a == 0 {
            self.f |= flags::Z;
        }
        if self.a & 0x80 != 0 {
            self.f |= flags::S;
        }
        self.f |= old_f3f5;
        self.set_flag_h(true);
        self.set_flag_pv(Self::parity(self.a));
    }

    pub(super) fn alu_or(&mut self, val: u8) {
        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.a |= val;
        self.f = 0;
        if self.a == 0 {
            self.f |= flags::Z;
        }
        if self.a & 0x80 != 0 {
            self.f |= flags::S;
        }
        self.f |= old_f3f5;
        self.set_flag_pv(Self::parity(self.a));
    }

    pub(super) fn alu_xor(&mut self, val: u8) {
        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.a ^= val;
        self.f = 0;
        if self.a == 0 {
            self.f |= flags::Z;
        }
        if self.a & 0x80 != 0 {
            self.f |= flags::S;
        }
        self.f |= old_f3f5;
        self.set_flag_pv(Self::parity(self.a));
    }

    pub(super) fn alu_inc(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let half = (val & 0x0F) == 0x0F;
        let overflow = val == 0x7F;

        let old_c = self.flag_c();
        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.f = 0;
        if result == 0 {
            self.f |= flags::Z;
        }
        if result & 0x80 != 0 {
            self.f |= flags::S;
        }
        self.f |= old_f3f5;
        self.set_flag_h(half);
        self.set_flag_pv(overflow);
        self.set_flag_c(old_c);

        result
    }

    pub(super) fn alu_dec(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let half = (val & 0x0F) == 0x00;
        let overflow = val == 0x80;

        let old_c = self.flag_c();
        let old_f3f5 = self.f & (flags::F5 | flags::F3);
        self.f = 0;
        if result == 0 {
            self.f |= flags::Z;
        }
        if result & 0x80 != 0 {
            self.f |= flags::S;
        }
        self.f |= old_f3f5;
        self.set_flag_h(half);
        self.set_flag_pv(overflow);
        self.set_flag_n(true);
        self.set_flag_c(old_c);

        result
    }

    // ========== Register Access by Index ==========
    //
    // A pending DD/FD PREFIX substitutes IX/IY for HL everywhere HL would
    // otherwise be read or written — register-pair ops, PUSH/POP, JP (HL),
    // LD SP,HL, and the r[y]/r[z] slots 4 (H), 5 (L), 6 ((HL)) — except the
    // DDCB/FDCB register-copy target, which is always the plain register
    // (see `execute_index_cb`). `EX DE,HL` and `EXX` are never substituted.

    /// Displacement-relative address for the current PREFIX's index register.
    #[inline]
    pub(super) fn index_addr(&self, base: u32) -> u32 {
        self.wrap_data((base as i64 + self.disp as i64) as u32)
    }

    /// HL, or the PREFIX-substituted index register if one is pending.
    #[inline]
    pub(super) fn idx_hl(&self) -> u32 {
        match self.prefix {
            2 => self.ix,
            3 => self.iy,
            _ => self.hl,
        }
    }

    #[inline]
    pub(super) fn set_idx_hl(&mut self, val: u32) {
        match self.prefix {
            2 => self.ix = val,
            3 => self.iy = val,
            _ => self.hl = val,
        }
    }

    /// The plain (never PREFIX-substituted) r[i] table, i ∈ {0,1,2,3,4,5,7}.
    #[inline]
    pub(super) fn reg8_direct(&self, idx: u8) -> u8 {
        match idx {
            0 => self.b(),
            1 => self.c(),
            2 => self.d(),
            3 => self.e(),
            4 => self.h(),
            5 => self.l(),
            7 => self.a,
            _ => 0,
        }
    }

    #[inline]
    pub(super) fn set_reg8_direct(&mut self, idx: u8, val: u8) {
        match idx {
            0 => self.set_b(val),
            1 => self.set_c(val),
            2 => self.set_d(val),
            3 => self.set_e(val),
            4 => self.set_h(val),
            5 => self.set_l(val),
            7 => self.a = val,
            _ => {}
        }
    }

    /// 8-bit register by `r[i]` index: 0=B,1=C,2=D,3=E,4=H,5=L,6=(HL),7=A,
    /// with indices 4/5/6 substituted per the pending PREFIX.
    pub(super) fn get_reg8<B: Bus>(&mut self, bus: &mut B, idx: u8) -> u8 {
        match (self.prefix, idx) {
            (2, 4) => self.ixh(),
            (2, 5) => self.ixl(),
            (3, 4) => self.iyh(),
            (3, 5) => self.iyl(),
            (2, 6) => {
                let addr = self.mask_addr(self.index_addr(self.ix));
                bus.read_byte(addr)
            }
            (3, 6) => {
                let addr = self.mask_addr(self.index_addr(self.iy));
                bus.read_byte(addr)
            }
            (_, 6) => bus.read_byte(self.mask_addr(self.hl)),
            (_, i) => self.reg8_direct(i),
        }
    }

    pub(super) fn set_reg8<B: Bus>(&mut self, bus: &mut B, idx: u8, val: u8) {
        match (self.prefix, idx) {
            (2, 4) => self.set_ixh(val),
            (2, 5) => self.set_ixl(val),
            (3, 4) => self.set_iyh(val),
            (3, 5) => self.set_iyl(val),
            (2, 6) => {
                let addr = self.mask_addr(self.index_addr(self.ix));
                bus.write_byte(addr, val);
            }
            (3, 6) => {
                let addr = self.mask_addr(self.index_addr(self.iy));
                bus.write_byte(addr, val);
            }
            (_, 6) => bus.write_byte(self.mask_addr(self.hl), val),
            (_, i) => self.set_reg8_direct(i, val),
        }
    }

    /// `rp[p]` register pair: 0=BC, 1=DE, 2=HL (PREFIX-substituted), 3=SP (mode-selected).
    pub(super) fn get_rp(&self, idx: u8) -> u32 {
        let mask = if self.l { 0xFFFFFF } else { 0xFFFF };
        match idx {
            0 => self.bc & mask,
            1 => self.de & mask,
            2 => self.idx_hl() & mask,
            3 => {
                if self.l {
                    self.spl & mask
                } else {
                    self.sps as u32
                }
            }
            _ => 0,
        }
    }

    pub(super) fn set_rp(&mut self, idx: u8, val: u32) {
        let masked = if self.l { val & 0xFFFFFF } else { val & 0xFFFF };
        match idx {
            0 => self.bc = masked,
            1 => self.de = masked,
            2 => self.set_idx_hl(masked),
            3 => {
                if self.l {
                    self.spl = masked;
                } else {
                    self.sps = masked as u16;
                }
            }
            _ => {}
        }
    }

    /// `rp2[p]` register pair (PUSH/POP): 0=BC, 1=DE, 2=HL (PREFIX-substituted), 3=AF.
    /// AF is always 16-bit; BC/DE/HL follow the L-selected width.
    pub(super) fn get_rp2(&self, idx: u8) -> u32 {
        if idx == 3 {
            return ((self.a as u32) << 8) | (self.f as u32);
        }
        let mask = if self.l { 0xFFFFFF } else { 0xFFFF };
        match idx {
            0 => self.bc & mask,
            1 => self.de & mask,
            2 => self.idx_hl() & mask,
            _ => 0,
        }
    }

    pub(super) fn set_rp2(&mut self, idx: u8, val: u32) {
        if idx == 3 {
            let v = val & 0xFFFF;
            self.a = (v >> 8) as u8;
            self.f = v as u8;
            return;
        }
        let mask = if self.l { 0xFFFFFF } else { 0xFFFF };
        let v = val & mask;
        match idx {
            0 => self.bc = v,
            1 => self.de = v,
            2 => self.set_idx_hl(v),
            _ => {}
        }
    }

    /// Condition code: 0=NZ,1=Z,2=NC,3=C,4=PO,5=PE,6=P,7=M.
    pub(super) fn check_cc(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag_z(),
            1 => self.flag_z(),
            2 => !self.flag_c(),
            3 => self.flag_c(),
            4 => !self.flag_pv(),
            5 => self.flag_pv(),
            6 => !self.flag_s(),
            7 => self.flag_s(),
            _ => false,
        }
    }
}
