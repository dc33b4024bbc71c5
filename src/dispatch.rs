// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The GPIO control ioctls.
//!
//! Each function issues one ioctl against a descriptor: a chip control
//! descriptor for the `get_*`, `request_*` and `*watch*` calls, a line
//! handle descriptor for the value and config calls.  The kernel holds
//! all line state; nothing here is cached.
//!
//! Records passed by `&mut` are only updated when the ioctl succeeds, so
//! a failed call leaves the caller's record as it was.

use std::os::unix::io::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::errno::Errno;

use crate::errors::{ioctl_err, too_many_err, Result};
use crate::ffi::{
    self, ChipInfo, EventRequest, HandleConfig, HandleData, HandleRequest, LineInfo,
    GPIOHANDLES_MAX,
};
use crate::IoctlKind;

fn raw<F: AsFd>(fd: &F) -> RawFd {
    fd.as_fd().as_raw_fd()
}

fn check(
    kind: IoctlKind,
    fd: RawFd,
    offset: Option<u32>,
    res: nix::Result<libc::c_int>,
) -> Result<()> {
    match res {
        Ok(_) => {
            log::trace!("{} on fd {}", kind, fd);
            Ok(())
        }
        Err(cause) => {
            log::debug!("{} on fd {} failed: {}", kind, fd, cause);
            Err(ioctl_err(kind, cause, offset))
        }
    }
}

/// Take ownership of a descriptor the kernel handed back in a record.
fn adopt(kind: IoctlKind, fd: libc::c_int) -> Result<OwnedFd> {
    if fd < 0 {
        return Err(ioctl_err(kind, Errno::EBADF, None));
    }
    // The kernel installed `fd` for this process and nothing else refers to it.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

pub fn get_chip_info<F: AsFd>(ctrl: &F) -> Result<ChipInfo> {
    let fd = raw(ctrl);
    let mut info = ChipInfo::default();
    check(IoctlKind::ChipInfo, fd, None, unsafe {
        ffi::gpio_get_chipinfo_ioctl(fd, &mut info)
    })?;
    Ok(info)
}

/// Get a snapshot of the info for the line at `offset`.
pub fn get_line_info<F: AsFd>(ctrl: &F, offset: u32) -> Result<LineInfo> {
    let fd = raw(ctrl);
    let mut info = LineInfo::new(offset);
    check(IoctlKind::LineInfo, fd, Some(offset), unsafe {
        ffi::gpio_get_lineinfo_ioctl(fd, &mut info)
    })?;
    Ok(info)
}

/// Request the lines in `request` for value access.
///
/// On success `request.fd` is set to the new descriptor, which the
/// returned `OwnedFd` owns; dropping it releases the lines.
///
/// More than [`GPIOHANDLES_MAX`] lines fails with
/// [`ErrorKind::TooManyLines`](crate::ErrorKind::TooManyLines) without a
/// system call; [`Error::is_invalid_argument`](crate::Error::is_invalid_argument)
/// covers it along with the kernel's own EINVAL.
///
/// Duplicate offsets are passed through to the kernel, which may or may
/// not reject them depending on its version.
pub fn request_line_handle<F: AsFd>(ctrl: &F, request: &mut HandleRequest) -> Result<OwnedFd> {
    if request.lines as usize > GPIOHANDLES_MAX {
        return Err(too_many_err(request.lines as usize));
    }
    let fd = raw(ctrl);
    let mut req = *request;
    check(IoctlKind::LineHandle, fd, None, unsafe {
        ffi::gpio_get_linehandle_ioctl(fd, &mut req)
    })?;
    let handle = adopt(IoctlKind::LineHandle, req.fd)?;
    *request = req;
    Ok(handle)
}

/// Request edge events for the line in `request`.
///
/// The returned descriptor delivers [`EventData`](crate::EventData)
/// records; it does not support setting values.
pub fn request_line_event<F: AsFd>(ctrl: &F, request: &mut EventRequest) -> Result<OwnedFd> {
    let fd = raw(ctrl);
    let mut req = *request;
    check(IoctlKind::LineEvent, fd, Some(req.offset), unsafe {
        ffi::gpio_get_lineevent_ioctl(fd, &mut req)
    })?;
    let events = adopt(IoctlKind::LineEvent, req.fd)?;
    *request = req;
    Ok(events)
}

/// Start watching `offset` for info changes on this control descriptor.
///
/// Returns the line info as of registration.  Changes are then queued on
/// `ctrl` as [`LineInfoChanged`](crate::LineInfoChanged) records.
pub fn watch_line_info<F: AsFd>(ctrl: &F, offset: u32) -> Result<LineInfo> {
    let fd = raw(ctrl);
    let mut info = LineInfo::new(offset);
    check(IoctlKind::WatchLineInfo, fd, Some(offset), unsafe {
        ffi::gpio_get_lineinfo_watch_ioctl(fd, &mut info)
    })?;
    Ok(info)
}

/// Stop watching `offset` on this control descriptor.
///
/// Watches on other descriptors are unaffected.  Unwatching a line that
/// isn't watched fails with [`ErrorKind::NotWatching`](crate::ErrorKind).
pub fn unwatch_line_info<F: AsFd>(ctrl: &F, offset: u32) -> Result<()> {
    let fd = raw(ctrl);
    let mut line = offset;
    check(IoctlKind::UnwatchLineInfo, fd, Some(offset), unsafe {
        ffi::gpio_get_lineinfo_unwatch_ioctl(fd, &mut line)
    })
}

/// Read the values of every line on a line handle descriptor.
pub fn get_line_values<F: AsFd>(handle: &F) -> Result<HandleData> {
    let fd = raw(handle);
    let mut data = HandleData::default();
    check(IoctlKind::GetLine, fd, None, unsafe {
        ffi::gpiohandle_get_line_values_ioctl(fd, &mut data)
    })?;
    Ok(data)
}

/// Set the values of the lines on a line handle descriptor.
///
/// The handle must have been requested as output.
pub fn set_line_values<F: AsFd>(handle: &F, data: &HandleData) -> Result<()> {
    let fd = raw(handle);
    let mut data = *data;
    check(IoctlKind::SetLine, fd, None, unsafe {
        ffi::gpiohandle_set_line_values_ioctl(fd, &mut data)
    })
}

/// Reconfigure the lines on a line handle descriptor (Linux 5.5+).
pub fn set_line_config<F: AsFd>(handle: &F, config: &HandleConfig) -> Result<()> {
    let fd = raw(handle);
    let mut config = *config;
    check(IoctlKind::SetConfig, fd, None, unsafe {
        ffi::gpiohandle_set_config_ioctl(fd, &mut config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::ffi::HandleFlags;
    use std::fs::File;

    // None of these descriptors is a GPIO chip; the kernel rejects the
    // requests and the caller's records must come back untouched.

    #[test]
    fn failed_request_leaves_record_unchanged() {
        let file = File::open("/dev/null").unwrap();
        let mut request =
            HandleRequest::new(&[1, 2], HandleFlags::OUTPUT, &[1, 0], "test").unwrap();
        request.fd = -7;
        let before = request;
        let err = request_line_handle(&file, &mut request).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AbiMismatch { .. }));
        assert_eq!(request, before);
    }

    #[test]
    fn failed_event_request_leaves_record_unchanged() {
        let file = File::open("/dev/null").unwrap();
        let mut request = EventRequest::new(
            4,
            HandleFlags::INPUT,
            crate::ffi::EventFlags::RISING_EDGE,
            "test",
        );
        let before = request;
        assert!(request_line_event(&file, &mut request).is_err());
        assert_eq!(request, before);
    }

    #[test]
    fn oversized_request_is_rejected_locally() {
        let file = File::open("/dev/null").unwrap();
        let mut request = HandleRequest::default();
        request.lines = GPIOHANDLES_MAX as u32 + 1;
        let err = request_line_handle(&file, &mut request).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TooManyLines(65)));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn non_gpio_descriptor_is_abi_mismatch() {
        let file = File::open("/dev/null").unwrap();
        let err = get_line_info(&file, 0).unwrap_err();
        match err.kind() {
            ErrorKind::AbiMismatch { kind, size } => {
                assert_eq!(*kind, IoctlKind::LineInfo);
                assert_eq!(*size, 72);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(get_chip_info(&file).is_err());
        assert!(unwatch_line_info(&file, 0).is_err());
    }
}
