//! Integration tests driving the channel/device-slot protocol end to end
//! through `Executive`, the way a real PP driver would.

use pp6000_core::console6612::{self, Console6612};
use pp6000_core::executive::Executive;
use pp6000_core::lp1612::{self, Lp1612};
use pp6000_core::lp5xx::{self, Controller, Head, Lp5xx};
use pp6000_core::screen::NullScreen;
use pp6000_core::slot::{DeviceSlot, DeviceType};

fn read_capture(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn lp1612_func_latches_and_disconnect_clears_fcode() {
    let dir = tempfile::tempdir().unwrap();
    let printer = Lp1612::init(dir.path().to_str().unwrap(), 0, false).unwrap();
    let capture = printer.capture_path().to_path_buf();

    let mut exec = Executive::new(4);
    exec.slots
        .attach(DeviceSlot::new(0, 0, 0, DeviceType::Lp1612, Box::new(printer)))
        .unwrap();

    exec.activate(0, 0);
    assert_eq!(exec.func(0, 0, lp1612::FC_SELECT), pp6000_core::device::FuncResult::Accepted);
    // fcode latches on Accepted.
    assert_eq!(exec.slots.get(0, 0).unwrap().fcode, lp1612::FC_SELECT);

    exec.channels.get_mut(0).unwrap().set_data(0o30);
    exec.io(0, 0);
    exec.channels.get_mut(0).unwrap().set_data(0o31);
    exec.io(0, 0);
    exec.func(0, 0, lp1612::FC_SINGLE_SPACE);
    exec.disconnect(0, 0);

    // fcode clears on disconnect.
    assert_eq!(exec.slots.get(0, 0).unwrap().fcode, 0);
    assert_eq!(read_capture(&capture), "HI\n");
}

#[test]
fn paper_removal_archives_then_a_second_immediate_removal_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut printer = Lp5xx::init(
        dir.path().to_str().unwrap(),
        0,
        0,
        Head::H512,
        Controller::C3555,
        false,
    )
    .unwrap();
    let mut chan = pp6000_core::channel::Channel::new(0);

    assert_eq!(printer.func(&mut chan, lp5xx::FC_OUTPUT), pp6000_core::device::FuncResult::Accepted);
    for b in b"hello" {
        chan.set_data(*b as u16);
        printer.io(&mut chan);
    }
    printer.remove_paper().unwrap();

    // Original path is empty and reopened for writing.
    assert_eq!(read_capture(printer.capture_path()), "");

    let archived: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path() != printer.capture_path())
        .collect();
    assert_eq!(archived.len(), 1);
    let name = archived[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("LP5xx_"));
    assert!(name.ends_with("_00.txt"));
    assert_eq!(
        std::fs::read_to_string(archived[0].path()).unwrap(),
        "hello"
    );

    // A second immediate removal with nothing printed since is a no-op.
    printer.remove_paper().unwrap();
    let archived_after: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path() != printer.capture_path())
        .collect();
    assert_eq!(archived_after.len(), 1, "no second archive should appear");
}

#[test]
fn status_request_reflects_ready_after_the_first_call_opens_it() {
    let dir = tempfile::tempdir().unwrap();
    let mut printer = Lp1612::init(dir.path().to_str().unwrap(), 5, false).unwrap();
    let mut chan = pp6000_core::channel::Channel::new(5);

    printer.func(&mut chan, lp1612::FC_STATUS_REQ);
    printer.io(&mut chan); // first call observes the pre-existing (zero) status
    printer.func(&mut chan, lp1612::FC_STATUS_REQ);
    printer.io(&mut chan);
    assert_eq!(chan.data, lp1612::ST_PRINT_READY);
}

#[test]
fn console6612_key_in_through_executive() {
    let console = Console6612::new(Box::new(NullScreen));
    console.queue_key(7);

    let mut exec = Executive::new(1);
    exec.slots
        .attach(DeviceSlot::new(0, 1, 0, DeviceType::Console6612, Box::new(console)))
        .unwrap();

    assert_eq!(
        exec.func(0, 1, console6612::FC_SEL_KEY_IN),
        pp6000_core::device::FuncResult::Accepted
    );
    exec.io(0, 1);
    // Throttled: first consoleGetKey call (counter==1) returns the real key.
    assert_eq!(exec.channels.get(0).unwrap().data, 7);
    // A single-io transaction completes and clears fcode without a
    // separate disconnect.
    assert_eq!(exec.slots.get(0, 1).unwrap().fcode, 0);
}

#[test]
fn declined_func_does_not_latch_through_executive() {
    let dir = tempfile::tempdir().unwrap();
    let printer = Lp1612::init(dir.path().to_str().unwrap(), 1, false).unwrap();

    let mut exec = Executive::new(2);
    exec.slots
        .attach(DeviceSlot::new(1, 0, 0, DeviceType::Lp1612, Box::new(printer)))
        .unwrap();

    assert_eq!(exec.func(1, 0, 0o77), pp6000_core::device::FuncResult::Declined);
    assert_eq!(exec.slots.get(1, 0).unwrap().fcode, 0);
}
