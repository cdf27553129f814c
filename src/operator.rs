//! The operator interface to paper removal: parses the `"chan,eq"`
//! argument, locates the slot, and invokes the device's own paper-removal
//! cycle through the generic [`Device`] capability — no family-specific
//! downcasting needed, since the callback is part of the same capability
//! set every device already implements.

use log::warn;

use crate::error::{PpError, PpResult};
use crate::executive::Executive;
use crate::paper::parse_chan_eq;
use crate::slot::DeviceType;

/// `removePaper(kind, "chan,eq")`. Invalid channel/equipment numbers,
/// non-numeric input, or a null device slot all produce a log line and
/// return without side effect.
pub fn remove_paper(exec: &mut Executive, kind: DeviceType, arg: &str) -> PpResult<()> {
    let Some((chan, eq)) = parse_chan_eq(arg) else {
        warn!("removePaper: malformed argument {arg:?}");
        return Err(PpError::BadPaperArg(arg.to_string()));
    };
    let Some(slot) = exec.slots.get_mut(chan, eq) else {
        warn!("removePaper: no device slot at chan {chan} eq {eq}");
        return Err(PpError::NoSuchSlot { chan, eq });
    };
    if slot.device_type != kind {
        warn!(
            "removePaper: chan {chan} eq {eq} is a {:?}, not a {:?}",
            slot.device_type, kind
        );
        return Err(PpError::Config(format!(
            "device kind mismatch at chan {chan} eq {eq}"
        )));
    }
    slot.device.remove_paper()
}
