//! The 1612 line printer: one function code at a time, ASCII or ANSI
//! carriage-control output.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::warn;

use crate::chars::ext_bcd_to_ascii;
use crate::channel::Channel;
use crate::clock::{Clock, SystemClock};
use crate::device::{Device, FuncResult, IoOutcome};
use crate::error::PpResult;
use crate::paper::{remove_paper, write_or_log};
use crate::printapp::{NoPrintApp, PrintApp};

/// Status bit 12: Ready.
pub const ST_PRINT_READY: u16 = 0o4000;

pub const FC_SELECT: u16 = 0o0;
pub const FC_SINGLE_SPACE: u16 = 0o1;
pub const FC_DOUBLE_SPACE: u16 = 0o2;
pub const FC_MOVE_CH7: u16 = 0o3;
pub const FC_MOVE_TOF: u16 = 0o4;
pub const FC_PRINT: u16 = 0o5;
pub const FC_SUPPRESS_LF: u16 = 0o6;
pub const FC_STATUS_REQ: u16 = 0o7;
const FC_FORMAT_LO: u16 = 0o10;
const FC_FORMAT_HI: u16 = 0o16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Text,
    Status,
}

pub struct Lp1612 {
    pub use_ansi: bool,
    dir: PathBuf,
    active_path: PathBuf,
    file: Option<File>,
    pending: Option<Pending>,
    clock: Box<dyn Clock>,
    print_app: Box<dyn PrintApp>,
}

impl Lp1612 {
    /// Open (or create/truncate) the active capture file for channel
    /// `chan` under `dir` and return a ready device:
    /// `<dir>/LP1612_C<CC>` with `CC` a 2-digit octal channel number.
    pub fn init(dir: &str, chan: u8, use_ansi: bool) -> PpResult<Self> {
        let dir_path = PathBuf::from(dir);
        let active_path = dir_path.join(format!("LP1612_C{chan:02o}"));
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&active_path)?;
        Ok(Lp1612 {
            use_ansi,
            dir: dir_path,
            active_path,
            file: Some(file),
            pending: None,
            clock: Box::new(SystemClock),
            print_app: Box::new(NoPrintApp),
        })
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    pub fn set_print_app(&mut self, print_app: Box<dyn PrintApp>) {
        self.print_app = print_app;
    }

    fn write_control(&mut self, ascii: &'static [u8], ansi: &'static [u8]) {
        let bytes = if self.use_ansi { ansi } else { ascii };
        write_or_log(&mut self.file, bytes, "lp1612");
    }

    /// Operator command: flush, archive, and reopen the capture file.
    /// No `.txt` suffix on the archive name for the 1612 family.
    pub fn remove_paper(&mut self) -> PpResult<()> {
        remove_paper(
            &self.dir,
            &self.active_path,
            "LP1612",
            "",
            &mut self.file,
            self.clock.as_ref(),
            self.print_app.as_ref(),
        )
    }

    pub fn capture_path(&self) -> &Path {
        &self.active_path
    }
}

impl Device for Lp1612 {
    fn func(&mut self, _channel: &mut Channel, code: u16) -> FuncResult {
        match code {
            FC_SELECT => {
                self.pending = Some(Pending::Text);
                FuncResult::Accepted
            }
            FC_SINGLE_SPACE | FC_MOVE_CH7 | FC_PRINT => {
                self.write_control(b"\n", b"\n ");
                self.pending = Some(Pending::Text);
                FuncResult::Accepted
            }
            FC_DOUBLE_SPACE => {
                self.write_control(b"\n\n", b"\n0");
                self.pending = Some(Pending::Text);
                FuncResult::Accepted
            }
            FC_MOVE_TOF => {
                self.write_control(b"\x0c", b"\n1");
                self.pending = Some(Pending::Text);
                FuncResult::Accepted
            }
            FC_SUPPRESS_LF => {
                self.write_control(b"\r", b"\n+");
                FuncResult::Processed
            }
            FC_STATUS_REQ => {
                self.pending = Some(Pending::Status);
                FuncResult::Accepted
            }
            c if (FC_FORMAT_LO..=FC_FORMAT_HI).contains(&c) => {
                self.pending = Some(Pending::Text);
                FuncResult::Accepted
            }
            other => {
                warn!("lp1612: declined unknown function code {other:#o}");
                FuncResult::Declined
            }
        }
    }

    fn io(&mut self, channel: &mut Channel) -> IoOutcome {
        match self.pending {
            Some(Pending::Status) => {
                // Returns the channel's *previous* status, not a freshly
                // computed one — status is only ever set by this same code
                // path, so the very first transaction sees whatever the
                // channel started with (zero).
                channel.set_data(channel.status);
                channel.status = ST_PRINT_READY;
                self.pending = None;
                IoOutcome::Complete
            }
            _ => {
                let word = channel.take_data();
                let byte = ext_bcd_to_ascii((word & 0o77) as u8);
                write_or_log(&mut self.file, &[byte], "lp1612");
                IoOutcome::Continue
            }
        }
    }

    fn disconnect(&mut self, _channel: &mut Channel) {
        self.pending = None;
    }

    fn remove_paper(&mut self) -> PpResult<()> {
        Lp1612::remove_paper(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn contents(printer: &Lp1612) -> String {
        fs::read_to_string(printer.capture_path()).unwrap()
    }

    #[test]
    fn single_line_prints_then_advances_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Lp1612::init(dir.path().to_str().unwrap(), 0, false).unwrap();
        let mut chan = Channel::new(0);

        assert_eq!(p.func(&mut chan, FC_SELECT), FuncResult::Accepted);
        // The 1612 carries one character per word in the low 6 bits; feed
        // 'H' then 'I' as separate words.
        chan.set_data(0o30); // 'H' in external BCD
        p.io(&mut chan);
        chan.set_data(0o31); // 'I' in external BCD
        p.io(&mut chan);
        assert_eq!(p.func(&mut chan, FC_SINGLE_SPACE), FuncResult::Accepted);
        p.disconnect(&mut chan);

        assert_eq!(contents(&p), "HI\n");
    }

    #[test]
    fn single_line_prints_then_advances_ansi() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Lp1612::init(dir.path().to_str().unwrap(), 0, true).unwrap();
        let mut chan = Channel::new(0);

        p.func(&mut chan, FC_SELECT);
        chan.set_data(0o30);
        p.io(&mut chan);
        chan.set_data(0o31);
        p.io(&mut chan);
        p.func(&mut chan, FC_SINGLE_SPACE);
        p.disconnect(&mut chan);

        assert_eq!(contents(&p), "HI\n ");
    }

    #[test]
    fn suppress_lf_is_processed_not_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Lp1612::init(dir.path().to_str().unwrap(), 1, false).unwrap();
        let mut chan = Channel::new(1);
        assert_eq!(p.func(&mut chan, FC_SUPPRESS_LF), FuncResult::Processed);
        assert_eq!(contents(&p), "\r");
    }

    #[test]
    fn status_quirk_first_transaction_returns_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Lp1612::init(dir.path().to_str().unwrap(), 2, false).unwrap();
        let mut chan = Channel::new(2);

        p.func(&mut chan, FC_STATUS_REQ);
        let outcome = p.io(&mut chan);
        assert_eq!(outcome, IoOutcome::Complete);
        assert_eq!(chan.data, 0); // channel.status started at 0

        // Second status request now observes StPrintReady, set as a side
        // effect of the first.
        p.func(&mut chan, FC_STATUS_REQ);
        p.io(&mut chan);
        assert_eq!(chan.data, ST_PRINT_READY);
    }

    #[test]
    fn declines_unknown_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Lp1612::init(dir.path().to_str().unwrap(), 3, false).unwrap();
        let mut chan = Channel::new(3);
        assert_eq!(p.func(&mut chan, 0o77), FuncResult::Declined);
    }
}
