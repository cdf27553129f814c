//! The 6612 operator console: character/dot-mode screen rendering, a merged
//! host-keycode + ring-buffer keyboard, and the "autodate" pattern-matching
//! injector.

use log::warn;

use crate::chars::{ascii_to_console, bcd_to_ascii};
use crate::channel::Channel;
use crate::clock::{Clock, SystemClock};
use crate::device::{Device, FuncResult, IoOutcome};
use crate::keyring::{key_ring, KeyConsumer, KeyProducer};
use crate::screen::{Font, Screen, ScreenOffset};

pub const ST_PRINT_READY: u16 = 0o4000;

pub const FC_SEL_DOT: u16 = 0o0;
pub const FC_SEL_64_CHAR_LEFT: u16 = 0o1;
pub const FC_SEL_64_CHAR_RIGHT: u16 = 0o2;
pub const FC_SEL_32_CHAR_LEFT: u16 = 0o3;
pub const FC_SEL_32_CHAR_RIGHT: u16 = 0o4;
pub const FC_SEL_16_CHAR_LEFT: u16 = 0o5;
pub const FC_SEL_16_CHAR_RIGHT: u16 = 0o6;
pub const FC_SEL_KEY_IN: u16 = 0o7;
pub const FC_WRITE: u16 = 0o10;
pub const FC_STATUS_REQ: u16 = 0o11;

const COORD_V_HI: u16 = 0o70;
const CHAR_HI_MAX: u16 = 0o60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Write,
    KeyIn,
}

pub struct Console6612 {
    screen: Box<dyn Screen>,
    font: Font,
    offset: ScreenOffset,
    last_h: u16,
    /// Starts true; cleared the moment a transaction actually draws
    /// something, so a disconnect with nothing drawn still forces a
    /// repaint.
    empty_drop: bool,
    pending: Option<Pending>,

    pp_key_in: u16,
    key_producer: KeyProducer,
    key_consumer: KeyConsumer,
    get_key_counter: u32,

    auto_date: bool,
    auto_date_string: Vec<u8>,
    auto_year_string: Vec<u8>,
    auto_pos: usize,
    clock: Box<dyn Clock>,
}

impl Console6612 {
    pub fn new(screen: Box<dyn Screen>) -> Self {
        let (key_producer, key_consumer) = key_ring();
        Console6612 {
            screen,
            font: Font::Dot,
            offset: ScreenOffset::Left,
            last_h: 0,
            empty_drop: true,
            pending: None,
            pp_key_in: 0,
            key_producer,
            key_consumer,
            get_key_counter: 0,
            auto_date: false,
            auto_date_string: Vec::new(),
            auto_year_string: Vec::new(),
            auto_pos: 0,
            clock: Box::new(SystemClock),
        }
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    /// A producer handle for the windowing layer to push keys from a
    /// separate host thread.
    pub fn key_producer(&self) -> KeyProducer {
        self.key_producer.clone_handle()
    }

    /// `consoleQueueKey`: enqueue one 6-bit console keycode.
    pub fn queue_key(&self, console_code: u8) {
        self.key_producer.push(console_code);
    }

    /// The host window pushed a raw ASCII keycode into the scalar
    /// `ppKeyIn`, mapped through the ASCII-to-console table.
    pub fn set_pp_key_in(&mut self, ascii: u8) {
        self.pp_key_in = ascii_to_console(ascii) as u16;
    }

    /// Configure the autodate pattern matcher.
    pub fn configure_autodate(&mut self, pattern: &str, year: &str) {
        self.auto_date = true;
        self.auto_date_string = pattern.as_bytes().to_vec();
        self.auto_year_string = year.as_bytes().to_vec();
        self.auto_pos = 0;
    }

    pub fn auto_date_enabled(&self) -> bool {
        self.auto_date
    }

    pub fn key_consumer(&self) -> &KeyConsumer {
        &self.key_consumer
    }

    fn set_font(&mut self, font: Font, offset: ScreenOffset) {
        self.font = font;
        self.offset = offset;
        self.screen.set_font(font, offset);
    }

    /// `consoleGetKey`: throttles to one real key every 3rd call — the
    /// counter increments on every call, not every character.
    fn console_get_key(&mut self) -> u16 {
        self.get_key_counter = self.get_key_counter.wrapping_add(1);
        if self.get_key_counter % 3 == 1 {
            self.key_consumer.pop().unwrap_or(0) as u16
        } else {
            0
        }
    }

    fn autodate_check(&mut self, chars: [u8; 2]) {
        if !self.auto_date {
            return;
        }
        let remaining = &self.auto_date_string[self.auto_pos..];
        if remaining.len() >= 2 && remaining[0] == chars[0] && remaining[1] == chars[1] {
            if remaining.len() == 2 {
                if self.key_consumer.is_empty() {
                    self.auto_date = false;
                    self.inject_datetime();
                } else {
                    self.auto_pos = 0;
                }
            } else {
                self.auto_pos += 2;
            }
        } else {
            self.auto_pos = 0;
        }
    }

    fn inject_datetime(&mut self) {
        let now = self.clock.now();
        let mut s = now.format("%y%m%d\n%H%M%S\n").to_string();
        let year = String::from_utf8_lossy(&self.auto_year_string).to_string();
        if year.len() == 2 {
            s.replace_range(0..2, &year);
        }
        for b in s.into_bytes() {
            self.key_producer.push(b);
        }
    }

    fn status_reply(&self, channel: &mut Channel) {
        channel.set_data(ST_PRINT_READY);
    }
}

impl Device for Console6612 {
    fn func(&mut self, channel: &mut Channel, code: u16) -> FuncResult {
        match code {
            FC_SEL_DOT => {
                self.set_font(Font::Dot, self.offset);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_64_CHAR_LEFT => {
                self.set_font(Font::Small, ScreenOffset::Left);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_64_CHAR_RIGHT => {
                self.set_font(Font::Small, ScreenOffset::Right);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_32_CHAR_LEFT => {
                self.set_font(Font::Medium, ScreenOffset::Left);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_32_CHAR_RIGHT => {
                self.set_font(Font::Medium, ScreenOffset::Right);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_16_CHAR_LEFT => {
                self.set_font(Font::Large, ScreenOffset::Left);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_16_CHAR_RIGHT => {
                self.set_font(Font::Large, ScreenOffset::Right);
                self.pending = None;
                FuncResult::Accepted
            }
            FC_SEL_KEY_IN => {
                self.pending = Some(Pending::KeyIn);
                FuncResult::Accepted
            }
            FC_WRITE => {
                self.pending = Some(Pending::Write);
                FuncResult::Accepted
            }
            FC_STATUS_REQ => {
                self.status_reply(channel);
                self.pending = None;
                FuncResult::Processed
            }
            other => {
                warn!("console6612: unknown function code {other:#o}, treating as no-op");
                self.pending = None;
                FuncResult::Processed
            }
        }
    }

    fn io(&mut self, channel: &mut Channel) -> IoOutcome {
        match self.pending {
            Some(Pending::KeyIn) => {
                let key = if self.pp_key_in != 0 {
                    let k = self.pp_key_in;
                    self.pp_key_in = 0;
                    k
                } else {
                    self.console_get_key()
                };
                channel.set_data(key);
                self.pending = None;
                IoOutcome::Complete
            }
            Some(Pending::Write) => {
                let word = channel.take_data();
                let hi = (word >> 6) & 0o77;
                if hi < CHAR_HI_MAX {
                    let lo = word & 0o77;
                    let c1 = bcd_to_ascii(hi as u8);
                    let c2 = bcd_to_ascii(lo as u8);
                    self.screen.put_char(self.offset, c1);
                    self.screen.put_char(self.offset, c2);
                    self.empty_drop = false;
                    if self.font == Font::Medium {
                        self.autodate_check([c1, c2]);
                    }
                } else if hi < COORD_V_HI {
                    let coord = word & 0o777;
                    self.last_h = coord;
                    self.screen.set_h_coord(self.offset, coord);
                    self.empty_drop = false;
                } else {
                    let coord = word & 0o777;
                    self.screen.set_v_coord(self.offset, coord);
                    if self.font == Font::Dot {
                        self.screen.put_dot(self.offset, self.last_h, coord);
                        self.screen.put_char(self.offset, b'.');
                    }
                    self.empty_drop = false;
                }
                IoOutcome::Continue
            }
            None => {
                warn!("console6612: io() called with nothing latched");
                IoOutcome::Continue
            }
        }
    }

    fn disconnect(&mut self, _channel: &mut Channel) {
        if self.empty_drop {
            self.screen.flush();
        }
        self.empty_drop = true;
        self.pending = None;
    }
}
