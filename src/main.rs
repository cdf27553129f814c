//! `ppdemo`: a tiny host wiring a PP executive to a 1612 printer and
//! exercising it the way a real Peripheral Processor driver would — one
//! function call, a handful of I/O cycles, a disconnect.

use pp6000_core::device::{Device, FuncResult};
use pp6000_core::lp1612::{self, Lp1612};

fn main() {
    env_logger::init();

    let mut printer = Lp1612::init("/tmp", 0, false).expect("failed to open capture file");
    let mut chan = pp6000_core::channel::Channel::new(0);

    if printer.func(&mut chan, lp1612::FC_SELECT) != FuncResult::Accepted {
        eprintln!("printer declined select");
        return;
    }
    for ch in b"HELLO" {
        // External BCD has no inverse table of its own in this demo; feed
        // the low 6 bits of the ASCII byte directly, which is sufficient
        // for the all-caps alphabetic range the printer actually renders.
        chan.set_data(*ch as u16 & 0o77);
        printer.io(&mut chan);
    }
    printer.func(&mut chan, lp1612::FC_SINGLE_SPACE);
    printer.disconnect(&mut chan);

    println!("wrote {:?}", printer.capture_path());
}
