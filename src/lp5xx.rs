//! The 3000-series line printer: 501/512 print head × 3152/3555 controller,
//! preprint/postprint spacing, latched interrupts, a fill-image-memory side
//! channel, VFU no-ops, and the paper-removal rename cycle.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use log::warn;

use crate::chars::bcd_to_ascii;
use crate::channel::Channel;
use crate::clock::{Clock, SystemClock};
use crate::config::{CarriageMode, ControllerType, LpInitParams};
use crate::device::{Device, FuncResult, IoOutcome};
use crate::error::PpResult;
use crate::paper::{remove_paper, write_or_log};
use crate::printapp::{NoPrintApp, PrintApp};

pub const ST_PRINT_READY: u16 = 0o4000;

bitflags! {
    /// Model bits, the fill-image-memory latch, and the four interrupt bits
    /// (latched and enable, ready and end) all live in one word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u16 {
        const HEAD_501       = 0o0001;
        const HEAD_512       = 0o0002;
        const CTRL_3152      = 0o0004;
        const CTRL_3555      = 0o0010;
        const FILL_IMAGE_MEM = 0o0020;
        const INT_READY      = 0o0040;
        const INT_END        = 0o0100;
        const INT_READY_ENA  = 0o0200;
        const INT_END_ENA    = 0o0400;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Head {
    H501,
    H512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    C3152,
    C3555,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceOpt {
    Single,
    Double,
}

// Common function codes (0-7, shared by both controllers), plus the
// data-transfer and status codes every 3000-series printer answers to
// regardless of controller.
pub const FC_RELEASE: u16 = 0o00;
pub const FC_SINGLE: u16 = 0o01;
pub const FC_DOUBLE: u16 = 0o02;
pub const FC_LAST_LINE: u16 = 0o03;
pub const FC_EJECT: u16 = 0o04;
pub const FC_AUTO_EJECT: u16 = 0o05;
pub const FC_NO_SPACE: u16 = 0o06;
pub const FC_MASTER_CLEAR: u16 = 0o07;
pub const FC_OUTPUT: u16 = 0o10;
pub const FC_STATUS_REQ: u16 = 0o11;

// Shared across both controllers: select/release interrupts, preprint mode.
pub const FC_CLEAR_FORMAT: u16 = 0o12;
pub const FC_SELECT_PREPRINT: u16 = 0o13;
pub const FC_SEL_INT_READY: u16 = 0o14;
pub const FC_SEL_INT_END: u16 = 0o15;
pub const FC_REL_INT_READY: u16 = 0o16;
pub const FC_REL_INT_END: u16 = 0o17;
pub const FC_SEL_INT_ERROR: u16 = 0o20;
pub const FC_REL_INT_ERROR: u16 = 0o21;

// 3152-specific.
pub const FC_RELEASE2: u16 = 0o22;
const FC_3152_VFU_PRE_BASE: u16 = 0o30; // pre VFU 1..6 -> 0o30..0o35
const FC_3152_VFU_POST_BASE: u16 = 0o40; // post VFU 1..6 -> 0o40..0o45

// 3555-specific.
pub const FC_LPI6: u16 = 0o23;
pub const FC_LPI8: u16 = 0o24;
pub const FC_FILL_MEMORY: u16 = 0o25;
pub const FC_EXT_ARRAY_SELECT: u16 = 0o26;
pub const FC_EXT_ARRAY_CLEAR: u16 = 0o27;
pub const FC_RELOAD_MEMORY_ENABLE: u16 = 0o32;
pub const FC_MAINT_STATUS: u16 = 0o33;
pub const FC_MAINT_CLEAR: u16 = 0o34;
const FC_3555_VFU_PRE_BASE: u16 = 0o50; // pre VFU 1..12 -> 0o50..0o61
const FC_3555_VFU_POST_BASE: u16 = 0o62; // post VFU 1..12 -> 0o62..0o73

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Output,
    OutputDiscard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastTransaction {
    None,
    Output,
}

pub struct Lp5xx {
    head: Head,
    controller: Controller,
    flags: Flags,
    printed: bool,
    keep_int: bool,
    space_opt: SpaceOpt,
    lpi: u8,
    cur_line: u16,
    pub use_ansi: bool,
    suppress_next: bool,
    postprint: bool,
    pending: Option<Pending>,
    last_transaction: LastTransaction,
    dir: PathBuf,
    active_path: PathBuf,
    file: Option<File>,
    clock: Box<dyn Clock>,
    print_app: Box<dyn PrintApp>,
}

impl Lp5xx {
    pub fn init(
        dir: &str,
        chan: u8,
        eq: u8,
        head: Head,
        controller: Controller,
        use_ansi: bool,
    ) -> PpResult<Self> {
        let dir_path = PathBuf::from(dir);
        let active_path = dir_path.join(format!("LP5xx_C{chan:02o}_E{eq:01o}"));
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&active_path)?;

        let mut flags = Flags::empty();
        flags.insert(match head {
            Head::H501 => Flags::HEAD_501,
            Head::H512 => Flags::HEAD_512,
        });
        flags.insert(match controller {
            Controller::C3152 => Flags::CTRL_3152,
            Controller::C3555 => Flags::CTRL_3555,
        });

        Ok(Lp5xx {
            head,
            controller,
            flags,
            printed: false,
            keep_int: false,
            space_opt: SpaceOpt::Single,
            lpi: 6,
            cur_line: 1,
            use_ansi,
            suppress_next: false,
            postprint: true,
            pending: None,
            last_transaction: LastTransaction::None,
            dir: dir_path,
            active_path,
            file: Some(file),
            clock: Box::new(SystemClock),
            print_app: Box::new(NoPrintApp),
        })
    }

    /// Construct from the device-initialization parameter string
    /// `"path,controllerType,mode"`, consumed once at setup. The print head
    /// isn't part of that string — it's a property of which physical unit
    /// the operator wired to this equipment, supplied separately by the
    /// caller.
    pub fn init_from_string(raw: &str, chan: u8, eq: u8, head: Head) -> PpResult<Self> {
        let params = LpInitParams::parse(raw)?;
        let controller = match params.controller {
            ControllerType::C3152 => Controller::C3152,
            ControllerType::C3555 => Controller::C3555,
        };
        let use_ansi = params.mode == CarriageMode::Ansi;
        Self::init(&params.path, chan, eq, head, controller, use_ansi)
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    pub fn set_print_app(&mut self, print_app: Box<dyn PrintApp>) {
        self.print_app = print_app;
    }

    pub fn capture_path(&self) -> &Path {
        &self.active_path
    }

    pub fn controller(&self) -> Controller {
        self.controller
    }

    pub fn cur_line(&self) -> u16 {
        self.cur_line
    }

    pub fn lpp(&self) -> u16 {
        11 * self.lpi as u16
    }

    fn write_control(&mut self, ascii: &'static [u8], ansi: &'static [u8]) {
        let bytes = if self.use_ansi { ansi } else { ascii };
        write_or_log(&mut self.file, bytes, "lp5xx");
    }

    fn master_clear(&mut self) {
        self.postprint = true;
        self.space_opt = SpaceOpt::Single;
        self.suppress_next = false;
        self.cur_line = 1;
        self.lpi = 6;
        self.printed = false;
        self.keep_int = false;
        self.flags
            .remove(Flags::INT_READY | Flags::INT_END | Flags::INT_READY_ENA | Flags::INT_END_ENA | Flags::FILL_IMAGE_MEM);
        self.write_control(b"\x0c", b"\n1");
    }

    fn eject(&mut self) {
        self.cur_line = 1;
        self.write_control(b"\x0c", b"\n1");
    }

    fn single_or_double(&mut self, opt: SpaceOpt) {
        self.space_opt = opt;
        if !self.postprint {
            match opt {
                SpaceOpt::Single => self.write_control(b"\n", b"\n "),
                SpaceOpt::Double => self.write_control(b"\n\n", b"\n0"),
            }
            let advance = match opt {
                SpaceOpt::Single => 1,
                SpaceOpt::Double => 2,
            };
            if self.cur_line + advance > self.lpp() {
                self.eject();
            } else {
                self.cur_line += advance;
            }
        }
    }

    fn recompute_summary(&mut self) -> u16 {
        let mut s = 0u16;
        if self.flags.contains(Flags::INT_READY) && self.flags.contains(Flags::INT_READY_ENA) {
            s |= 0o01;
        }
        if self.flags.contains(Flags::INT_END) && self.flags.contains(Flags::INT_END_ENA) {
            s |= 0o02;
        }
        s
    }

    fn sel_int(&mut self, latched: Flags, ena: Flags) {
        self.flags.insert(ena);
        if self.keep_int {
            self.keep_int = false;
        } else {
            self.flags.remove(latched);
        }
        self.recompute_summary();
    }

    fn rel_int(&mut self, latched: Flags, ena: Flags) {
        self.flags.remove(latched | ena);
        self.recompute_summary();
    }

    fn handle_output(&mut self) -> FuncResult {
        self.flags.remove(Flags::INT_READY | Flags::INT_END);
        if self.flags.contains(Flags::INT_READY_ENA) {
            self.flags.insert(Flags::INT_READY);
        }
        if self.flags.contains(Flags::INT_END_ENA) {
            self.flags.insert(Flags::INT_END);
        }
        self.recompute_summary();

        if self.flags.contains(Flags::FILL_IMAGE_MEM) {
            self.pending = Some(Pending::OutputDiscard);
            self.flags.remove(Flags::FILL_IMAGE_MEM);
        } else {
            self.pending = Some(Pending::Output);
        }
        self.last_transaction = LastTransaction::Output;
        FuncResult::Accepted
    }

    fn status_reply(&mut self, channel: &mut Channel) {
        let summary = self.recompute_summary();
        channel.set_data(ST_PRINT_READY | summary);
    }

    /// Operator command: flush, archive, and reopen the capture file.
    pub fn remove_paper(&mut self) -> PpResult<()> {
        let had_printed = self.printed;
        remove_paper(
            &self.dir,
            &self.active_path,
            "LP5xx",
            ".txt",
            &mut self.file,
            self.clock.as_ref(),
            self.print_app.as_ref(),
        )?;
        if had_printed {
            self.printed = false;
        }
        Ok(())
    }

    fn release(&mut self) {
        self.flags.remove(Flags::INT_READY | Flags::INT_END);
        self.recompute_summary();
        if self.printed {
            if let Err(e) = self.remove_paper() {
                warn!("lp5xx: paper removal on Release failed: {e}");
            }
        }
    }
}

impl Device for Lp5xx {
    fn func(&mut self, channel: &mut Channel, code: u16) -> FuncResult {
        match code {
            FC_RELEASE | FC_RELEASE2 => {
                self.release();
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_SINGLE => {
                self.single_or_double(SpaceOpt::Single);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_DOUBLE => {
                self.single_or_double(SpaceOpt::Double);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_LAST_LINE => {
                self.single_or_double(SpaceOpt::Single);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_EJECT | FC_AUTO_EJECT => {
                self.eject();
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_NO_SPACE => {
                self.suppress_next = true;
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_MASTER_CLEAR => {
                self.master_clear();
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_OUTPUT => self.handle_output(),
            FC_STATUS_REQ => {
                self.status_reply(channel);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_CLEAR_FORMAT => {
                self.postprint = true;
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_SELECT_PREPRINT => {
                self.postprint = false;
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_SEL_INT_READY => {
                self.sel_int(Flags::INT_READY, Flags::INT_READY_ENA);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_SEL_INT_END => {
                self.sel_int(Flags::INT_END, Flags::INT_END_ENA);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_REL_INT_READY => {
                self.rel_int(Flags::INT_READY, Flags::INT_READY_ENA);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_REL_INT_END => {
                self.rel_int(Flags::INT_END, Flags::INT_END_ENA);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_SEL_INT_ERROR | FC_REL_INT_ERROR => {
                // Error interrupts track through the same latch/enable
                // scheme as ready/end, but nothing downstream distinguishes
                // them yet; treat as bookkeeping-only no-ops.
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_LPI6 if self.controller == Controller::C3555 => {
                self.lpi = 6;
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_LPI8 if self.controller == Controller::C3555 => {
                self.lpi = 8;
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_FILL_MEMORY if self.controller == Controller::C3555 => {
                self.flags.insert(Flags::FILL_IMAGE_MEM);
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            FC_EXT_ARRAY_SELECT | FC_EXT_ARRAY_CLEAR | FC_RELOAD_MEMORY_ENABLE
            | FC_MAINT_STATUS | FC_MAINT_CLEAR
                if self.controller == Controller::C3555 =>
            {
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            c if self.controller == Controller::C3555
                && (FC_3555_VFU_PRE_BASE..FC_3555_VFU_PRE_BASE + 12).contains(&c) =>
            {
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            c if self.controller == Controller::C3555
                && (FC_3555_VFU_POST_BASE..FC_3555_VFU_POST_BASE + 12).contains(&c) =>
            {
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            c if self.controller == Controller::C3152
                && (FC_3152_VFU_PRE_BASE..FC_3152_VFU_PRE_BASE + 6).contains(&c) =>
            {
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            c if self.controller == Controller::C3152
                && (FC_3152_VFU_POST_BASE..FC_3152_VFU_POST_BASE + 6).contains(&c) =>
            {
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
            other => {
                // Unknown codes return Processed, not Declined, so drivers
                // see forward progress instead of stalling on this slot.
                warn!("lp5xx: unknown function code {other:#o}, treating as no-op");
                self.last_transaction = LastTransaction::None;
                FuncResult::Processed
            }
        }
    }

    fn io(&mut self, channel: &mut Channel) -> IoOutcome {
        match self.pending {
            Some(Pending::Output) => {
                let word = channel.take_data();
                match self.head {
                    Head::H501 => {
                        let hi = bcd_to_ascii(((word >> 6) & 0o77) as u8);
                        let lo = bcd_to_ascii((word & 0o77) as u8);
                        write_or_log(&mut self.file, &[hi, lo], "lp5xx");
                    }
                    Head::H512 => {
                        write_or_log(&mut self.file, &[(word & 0xff) as u8], "lp5xx");
                    }
                }
                self.printed = true;
                self.keep_int = true;
                IoOutcome::Continue
            }
            Some(Pending::OutputDiscard) => {
                channel.take_data();
                IoOutcome::Continue
            }
            None => {
                warn!("lp5xx: io() called with nothing latched");
                IoOutcome::Continue
            }
        }
    }

    fn disconnect(&mut self, _channel: &mut Channel) {
        if self.last_transaction == LastTransaction::Output {
            if self.suppress_next {
                self.write_control(b"\r", b"\n+");
                self.suppress_next = false;
            } else if self.postprint {
                match self.space_opt {
                    SpaceOpt::Single => self.write_control(b"\n", b"\n "),
                    SpaceOpt::Double => self.write_control(b"\n\n", b"\n0"),
                }
                self.space_opt = SpaceOpt::Single;
            } else {
                #[cfg(feature = "preprint_debug_tab")]
                {
                    // Experimental: some drivers emit a tab after a
                    // preprint-mode transaction instead of nothing.
                    self.write_control(b"\t", b"\t");
                }
            }
        }
        self.pending = None;
        self.last_transaction = LastTransaction::None;
    }

    fn remove_paper(&mut self) -> PpResult<()> {
        Lp5xx::remove_paper(self)
    }
}
