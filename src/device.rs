//! The four-callback device contract every peripheral implements.
//!
//! Grounded in the teacher crate's `Device` trait (`update`/`read`/`write`):
//! the shape survives, the semantics become the PP channel protocol instead
//! of a 68k memory-mapped bus.

use crate::channel::Channel;
use crate::error::PpResult;

/// Outcome of handing a function code to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncResult {
    /// The code was latched; subsequent `io` calls will service it.
    Accepted,
    /// The code was fully handled synchronously; nothing is latched.
    Processed,
    /// The device does not recognize this code.
    Declined,
}

/// Outcome of one `io` cycle. Most transactions run until `disconnect`
/// clears the latch; a few codes (the 1612's status request, the console's
/// key-in) complete in a single `io` call instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOutcome {
    Continue,
    Complete,
}

/// A PP transaction begins with `func`, proceeds through zero or more `io`
/// cycles alternating producer/consumer on `channel.full`, and ends with
/// `disconnect`. Implementations must be re-entrant across transactions but
/// are only ever driven single-threaded within one.
pub trait Device {
    fn func(&mut self, channel: &mut Channel, code: u16) -> FuncResult;

    fn io(&mut self, channel: &mut Channel) -> IoOutcome;

    /// The channel has been selected by a PP instruction. May be a no-op.
    fn activate(&mut self, channel: &mut Channel) {
        let _ = channel;
    }

    /// The PP has released the channel. Devices finalize deferred work
    /// (postprint spacing, line termination, screen flush).
    fn disconnect(&mut self, channel: &mut Channel);

    /// Most devices have no capture file and accept this no-op; the printer
    /// families override it.
    fn remove_paper(&mut self) -> PpResult<()> {
        Ok(())
    }
}
