//! The device-slot registry: (channel, equipment) → attached device.
//!
//! Slots are built by the `init` functions in [`crate::lp1612`],
//! [`crate::lp5xx`] and [`crate::console6612`] and attached once at startup;
//! the registry owns lifecycle from there on but never constructs a device
//! itself.

use std::collections::HashMap;

use crate::device::Device;
use crate::error::{PpError, PpResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Console6612,
    Lp1612,
    Lp5xx,
}

/// A single attached peripheral, plus the protocol bookkeeping the channel
/// layer needs regardless of which device is plugged in.
pub struct DeviceSlot {
    pub chan: u8,
    pub eq: u8,
    pub unit: u8,
    pub device_type: DeviceType,
    pub selected_unit: u8,
    /// The currently latched function code; 0 when idle. Owned by the slot
    /// rather than the device, since it's channel-protocol bookkeeping, not
    /// device semantics.
    pub fcode: u16,
    pub device: Box<dyn Device>,
}

impl DeviceSlot {
    pub fn new(chan: u8, eq: u8, unit: u8, device_type: DeviceType, device: Box<dyn Device>) -> Self {
        DeviceSlot {
            chan,
            eq,
            unit,
            device_type,
            selected_unit: unit,
            fcode: 0,
            device,
        }
    }
}

/// The table of every attached device, keyed by (channel, equipment).
#[derive(Default)]
pub struct SlotRegistry {
    slots: HashMap<(u8, u8), DeviceSlot>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        SlotRegistry {
            slots: HashMap::new(),
        }
    }

    /// Attach a device, failing if the (channel, equipment) pair is already
    /// occupied.
    pub fn attach(&mut self, slot: DeviceSlot) -> PpResult<()> {
        let key = (slot.chan, slot.eq);
        if self.slots.contains_key(&key) {
            return Err(PpError::DuplicateUnit {
                chan: slot.chan,
                eq: slot.eq,
                unit: slot.unit,
            });
        }
        self.slots.insert(key, slot);
        Ok(())
    }

    pub fn get(&self, chan: u8, eq: u8) -> Option<&DeviceSlot> {
        self.slots.get(&(chan, eq))
    }

    pub fn get_mut(&mut self, chan: u8, eq: u8) -> Option<&mut DeviceSlot> {
        self.slots.get_mut(&(chan, eq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::device::{Device, FuncResult, IoOutcome};

    struct Stub;
    impl Device for Stub {
        fn func(&mut self, _c: &mut Channel, _code: u16) -> FuncResult {
            FuncResult::Declined
        }
        fn io(&mut self, _c: &mut Channel) -> IoOutcome {
            IoOutcome::Continue
        }
        fn disconnect(&mut self, _c: &mut Channel) {}
    }

    #[test]
    fn rejects_duplicate_attach() {
        let mut reg = SlotRegistry::new();
        reg.attach(DeviceSlot::new(1, 0, 0, DeviceType::Lp1612, Box::new(Stub)))
            .unwrap();
        let err = reg
            .attach(DeviceSlot::new(1, 0, 0, DeviceType::Lp1612, Box::new(Stub)))
            .unwrap_err();
        assert!(matches!(err, PpError::DuplicateUnit { .. }));
    }
}
