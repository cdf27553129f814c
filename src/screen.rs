//! The console's abstract screen interface: this core renders to a trait
//! object, not a concrete window.
//!
//! The teacher crate's `Monitor` device (`devices.rs`) owns a concrete
//! `minifb::Window` directly; `Screen` is the trait object seam a host
//! application implements instead, with `NullScreen` standing in for
//! headless operation and tests.

/// Which of the two logical side-by-side screens a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenOffset {
    Left,
    Right,
}

/// Character rendering mode, selected by `Fc6612Sel*` function codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Dot,
    Small,
    Medium,
    Large,
}

pub trait Screen {
    /// Plot a single dot at the current position. Dot-mode vertical-coord
    /// writes additionally enqueue a '.' character.
    fn put_dot(&mut self, offset: ScreenOffset, x: u16, y: u16);

    /// Enqueue an ASCII character to the current row at the given offset.
    fn put_char(&mut self, offset: ScreenOffset, ch: u8);

    /// The font/offset selection has changed.
    fn set_font(&mut self, font: Font, offset: ScreenOffset);

    /// Move the write cursor horizontally (low 9 bits of an `Fc6612HCoord`
    /// word, relative to `offset`).
    fn set_h_coord(&mut self, offset: ScreenOffset, x: u16);

    /// Move the write cursor vertically.
    fn set_v_coord(&mut self, offset: ScreenOffset, y: u16);

    /// The device has disconnected and an `emptyDrop` refresh is due.
    fn flush(&mut self) {}
}

/// A screen that discards everything written to it. Used for headless
/// operation and in tests that only care about the keyboard/autodate side
/// of the console.
#[derive(Default)]
pub struct NullScreen;

impl Screen for NullScreen {
    fn put_dot(&mut self, _offset: ScreenOffset, _x: u16, _y: u16) {}
    fn put_char(&mut self, _offset: ScreenOffset, _ch: u8) {}
    fn set_font(&mut self, _font: Font, _offset: ScreenOffset) {}
    fn set_h_coord(&mut self, _offset: ScreenOffset, _x: u16) {}
    fn set_v_coord(&mut self, _offset: ScreenOffset, _y: u16) {}
}
