//! The driving executive: owns the channel fabric and the slot registry,
//! and dispatches PP operations to devices.
//!
//! Grounded in the teacher crate's `Emulator` (`src/lib.rs`): there, a
//! single struct owns the CPU and drives its clock cycle; here a single
//! struct owns the channel fabric and slot registry and drives the four
//! device callbacks. The model is single-threaded cooperative — one
//! callback per step, no suspension points inside a callback.

use log::warn;

use crate::channel::ChannelFabric;
use crate::device::{FuncResult, IoOutcome};
use crate::slot::SlotRegistry;

pub struct Executive {
    pub channels: ChannelFabric,
    pub slots: SlotRegistry,
}

impl Executive {
    pub fn new(max_channels: usize) -> Self {
        Executive {
            channels: ChannelFabric::new(max_channels),
            slots: SlotRegistry::new(),
        }
    }

    /// A PP instruction selects a channel: notify the attached device, if
    /// any.
    pub fn activate(&mut self, chan: u8, eq: u8) {
        let Some(channel) = self.channels.get_mut(chan) else {
            warn!("activate: no such channel {chan}");
            return;
        };
        match self.slots.get_mut(chan, eq) {
            Some(slot) => slot.device.activate(channel),
            None => warn!("activate: no device at chan {chan} eq {eq}"),
        }
    }

    /// A PP issues a 12-bit function code. Latches the slot's `fcode` on
    /// `Accepted`, clears it on `Processed`/`Declined`.
    pub fn func(&mut self, chan: u8, eq: u8, code: u16) -> FuncResult {
        let Some(channel) = self.channels.get_mut(chan) else {
            warn!("func: no such channel {chan}");
            return FuncResult::Declined;
        };
        let Some(slot) = self.slots.get_mut(chan, eq) else {
            warn!("func: no device at chan {chan} eq {eq}, code {code:#o}");
            return FuncResult::Declined;
        };
        let result = slot.device.func(channel, code);
        match result {
            FuncResult::Accepted => slot.fcode = code,
            FuncResult::Processed | FuncResult::Declined => slot.fcode = 0,
        }
        result
    }

    /// The channel has work to do for the attached device: move one word.
    pub fn io(&mut self, chan: u8, eq: u8) {
        let Some(channel) = self.channels.get_mut(chan) else {
            warn!("io: no such channel {chan}");
            return;
        };
        match self.slots.get_mut(chan, eq) {
            Some(slot) => {
                if slot.device.io(channel) == IoOutcome::Complete {
                    slot.fcode = 0;
                }
            }
            None => warn!("io: no device at chan {chan} eq {eq}"),
        }
    }

    /// The PP releases the channel; finalize any deferred device work and
    /// clear the latched function code.
    pub fn disconnect(&mut self, chan: u8, eq: u8) {
        let Some(channel) = self.channels.get_mut(chan) else {
            warn!("disconnect: no such channel {chan}");
            return;
        };
        match self.slots.get_mut(chan, eq) {
            Some(slot) => {
                slot.device.disconnect(channel);
                slot.fcode = 0;
            }
            None => warn!("disconnect: no device at chan {chan} eq {eq}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::device::Device;
    use crate::slot::{DeviceSlot, DeviceType};

    struct Counter(u32);
    impl Device for Counter {
        fn func(&mut self, _c: &mut Channel, code: u16) -> FuncResult {
            if code == 1 {
                FuncResult::Accepted
            } else {
                FuncResult::Declined
            }
        }
        fn io(&mut self, _c: &mut Channel) -> IoOutcome {
            self.0 += 1;
            IoOutcome::Continue
        }
        fn disconnect(&mut self, _c: &mut Channel) {}
    }

    #[test]
    fn fcode_latches_on_accept_and_clears_on_disconnect() {
        let mut exec = Executive::new(4);
        exec.slots
            .attach(DeviceSlot::new(0, 0, 0, DeviceType::Lp1612, Box::new(Counter(0))))
            .unwrap();
        assert_eq!(exec.func(0, 0, 1), FuncResult::Accepted);
        assert_eq!(exec.slots.get(0, 0).unwrap().fcode, 1);
        exec.disconnect(0, 0);
        assert_eq!(exec.slots.get(0, 0).unwrap().fcode, 0);
    }

    #[test]
    fn declined_does_not_latch() {
        let mut exec = Executive::new(4);
        exec.slots
            .attach(DeviceSlot::new(0, 0, 0, DeviceType::Lp1612, Box::new(Counter(0))))
            .unwrap();
        assert_eq!(exec.func(0, 0, 99), FuncResult::Declined);
        assert_eq!(exec.slots.get(0, 0).unwrap().fcode, 0);
    }
}
