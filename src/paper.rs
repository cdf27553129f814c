//! Operator-driven paper removal: flush, close, timestamp-rename, reopen.
//!
//! Shared by the 1612 and 3000-series printers: both families go through
//! the identical flush/close/rename/reopen cycle, only the archive
//! filename prefix and extension differ.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{error, warn};

use crate::clock::Clock;
use crate::error::PpResult;
use crate::printapp::PrintApp;

/// Rename attempts are bounded to 100, surfacing the final error to the
/// operator without aborting the emulator.
const MAX_RENAME_ATTEMPTS: u32 = 100;

/// Flush, close, rename (bounded retries against collisions), then reopen
/// `active_path` in write-truncate mode.
///
/// `family` and `ext` pick the archive name: `"<dir>/<family>_<ts>_<NN><ext>"`.
/// Idempotent on an empty capture file: if nothing has been written, this
/// is a no-op and `file` stays open.
pub fn remove_paper(
    dir: &Path,
    active_path: &Path,
    family: &str,
    ext: &str,
    file: &mut Option<File>,
    clock: &dyn Clock,
    print_app: &dyn PrintApp,
) -> PpResult<()> {
    let Some(mut open_file) = file.take() else {
        warn!("removePaper: {active_path:?} has no open capture file");
        return Ok(());
    };

    open_file.flush()?;
    let len = open_file.metadata()?.len();
    if len == 0 {
        warn!("removePaper: {active_path:?} has no output to remove, skipping");
        *file = Some(open_file);
        return Ok(());
    }
    drop(open_file);

    let archived = find_archive_name(dir, family, ext, clock);
    match archived {
        Some(dest) => {
            fs::rename(active_path, &dest)?;
            print_app.handle(&dest);
        }
        None => {
            error!(
                "removePaper: exhausted {MAX_RENAME_ATTEMPTS} rename attempts for {active_path:?}"
            );
        }
    }

    *file = Some(
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(active_path)?,
    );
    Ok(())
}

fn find_archive_name(dir: &Path, family: &str, ext: &str, clock: &dyn Clock) -> Option<PathBuf> {
    for _ in 0..MAX_RENAME_ATTEMPTS {
        let now = clock.now();
        let stamp = now.format("%Y%m%d_%H%M%S");
        for n in 0..100u32 {
            let candidate = dir.join(format!("{family}_{stamp}_{n:02}{ext}"));
            if !candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Parse the operator's `"chan,eq"` argument.
pub fn parse_chan_eq(arg: &str) -> Option<(u8, u8)> {
    let mut parts = arg.split(',');
    let chan = parts.next()?.trim().parse::<u8>().ok()?;
    let eq = parts.next()?.trim().parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((chan, eq))
}

/// Write `bytes` to `file`, logging and returning silently (not an error)
/// if the slot's file handle is null — a failed reopen leaves it that way,
/// and every caller must tolerate it rather than crash.
pub fn write_or_log(file: &mut Option<File>, bytes: &[u8], context: &str) {
    match file {
        Some(f) => {
            if let Err(e) = f.write_all(bytes) {
                warn!("{context}: write failed: {e}");
            }
        }
        None => warn!("{context}: no open capture file"),
    }
}
