//! Parsing for the 3000-series printer's device-initialization parameter
//! string: `"path,controllerType,mode"`.
//!
//! Taken by value and parsed non-destructively, the way the teacher crate's
//! `atari.rs` builds its device list from plain literals rather than poking
//! at shared mutable state.

use crate::error::{PpError, PpResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerType {
    C3152,
    C3555,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarriageMode {
    Ascii,
    Ansi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpInitParams {
    /// Output directory, always non-empty and trailing-slash-terminated
    /// when the configured path was non-empty.
    pub path: String,
    pub controller: ControllerType,
    pub mode: CarriageMode,
}

impl LpInitParams {
    /// Parse `"path,controllerType,mode"`. `controllerType` defaults to
    /// 3555 when absent; `mode` defaults to ascii when absent.
    pub fn parse(raw: &str) -> PpResult<Self> {
        let mut parts = raw.split(',');
        let path_part = parts.next().unwrap_or("");
        let controller_part = parts.next().unwrap_or("");
        let mode_part = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(PpError::BadInitString(raw.to_string()));
        }

        let path = if path_part.is_empty() {
            String::new()
        } else if path_part.ends_with('/') {
            path_part.to_string()
        } else {
            format!("{path_part}/")
        };

        let controller = match controller_part {
            "3152" => ControllerType::C3152,
            "3555" | "" => ControllerType::C3555,
            other => return Err(PpError::UnknownController(other.to_string())),
        };

        let mode = match mode_part {
            "ansi" => CarriageMode::Ansi,
            "ascii" | "" => CarriageMode::Ascii,
            _ => return Err(PpError::BadInitString(raw.to_string())),
        };

        Ok(LpInitParams {
            path,
            controller,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_absent() {
        let p = LpInitParams::parse("/tmp").unwrap();
        assert_eq!(p.path, "/tmp/");
        assert_eq!(p.controller, ControllerType::C3555);
        assert_eq!(p.mode, CarriageMode::Ascii);
    }

    #[test]
    fn empty_path_stays_empty() {
        let p = LpInitParams::parse(",3152,ansi").unwrap();
        assert_eq!(p.path, "");
        assert_eq!(p.controller, ControllerType::C3152);
        assert_eq!(p.mode, CarriageMode::Ansi);
    }

    #[test]
    fn trailing_slash_not_duplicated() {
        let p = LpInitParams::parse("/tmp/,3555,ascii").unwrap();
        assert_eq!(p.path, "/tmp/");
    }

    #[test]
    fn unknown_controller_is_an_error() {
        assert!(matches!(
            LpInitParams::parse("/tmp,9999,ascii"),
            Err(PpError::UnknownController(_))
        ));
    }

    #[test]
    fn too_many_fields_is_an_error() {
        assert!(LpInitParams::parse("/tmp,3555,ascii,extra").is_err());
    }
}
