// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors returned by this crate.
//!
//! Kernel failures are classified by the errno of the failed ioctl and the
//! kind of request that produced it.  A timeout is never an error; the
//! reading functions report it as `None` or an empty batch instead.

use crate::ffi::Record;
use crate::IoctlKind;
use nix::errno::Errno;
use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Error as IOError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Debug)]
pub enum ErrorKind {
    /// The kernel rejected the record contents, or the descriptor was not
    /// requested for the attempted operation.
    InvalidArgument { kind: IoctlKind, cause: Errno },
    /// The offset does not exist on the chip.
    NotFound(u32),
    PermissionDenied { kind: IoctlKind, cause: Errno },
    /// The line is already requested.
    Busy { kind: IoctlKind, cause: Errno },
    /// A watch is already registered for the offset on this descriptor.
    AlreadyWatching(u32),
    /// No watch is registered for the offset on this descriptor.
    NotWatching(u32),
    /// The running kernel doesn't recognise the request; `size` is the
    /// size of the record compiled into this crate.
    AbiMismatch { kind: IoctlKind, size: usize },
    /// Any other ioctl failure, as reported by the kernel.
    Ioctl { kind: IoctlKind, cause: Errno },
    /// The descriptor was closed, hung up or the device went away.
    Io(IOError),
    /// A read ended in the middle of a record.  `complete` holds the whole
    /// records taken from the descriptor before the stray bytes; see
    /// [`Error::complete_records`].
    PartialRecord {
        expected: usize,
        got: usize,
        complete: Vec<u8>,
    },
    /// More values than requested lines.  Rejected before the kernel is
    /// asked, in the same class as `InvalidArgument`.
    InvalidRequest(usize, usize),
    /// More than [`GPIOHANDLES_MAX`](crate::GPIOHANDLES_MAX) lines.  The
    /// kernel answers EINVAL for the same request; this is the check made
    /// locally, in the same class as `InvalidArgument`.
    TooManyLines(usize),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// True for failures of the descriptor itself rather than of a request.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io(_) | ErrorKind::PartialRecord { .. })
    }

    /// True if the request itself was malformed, whether the kernel or the
    /// local checks rejected it.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidArgument { .. }
                | ErrorKind::InvalidRequest(..)
                | ErrorKind::TooManyLines(_)
        )
    }

    /// The whole records read before a trailing partial record.
    ///
    /// Those records have already been taken from the descriptor, so this is
    /// the only place they can be recovered from.  Empty for every other
    /// kind of error.
    pub fn complete_records<T: Record>(&self) -> Vec<T> {
        match &self.kind {
            ErrorKind::PartialRecord { complete, .. } => complete
                .chunks_exact(T::SIZE)
                .map(T::decode_from)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Classify the errno of a failed ioctl.
///
/// `offset` is the line the request addressed, where there is exactly one.
pub(crate) fn ioctl_err(kind: IoctlKind, cause: Errno, offset: Option<u32>) -> Error {
    let kind = match (kind, cause, offset) {
        (_, Errno::ENOTTY, _) => ErrorKind::AbiMismatch {
            kind,
            size: kind.record_size(),
        },
        (IoctlKind::LineInfo, Errno::EINVAL, Some(offset))
        | (IoctlKind::WatchLineInfo, Errno::EINVAL, Some(offset))
        | (IoctlKind::UnwatchLineInfo, Errno::EINVAL, Some(offset)) => ErrorKind::NotFound(offset),
        (IoctlKind::WatchLineInfo, Errno::EBUSY, Some(offset)) => {
            ErrorKind::AlreadyWatching(offset)
        }
        (IoctlKind::UnwatchLineInfo, Errno::EBUSY, Some(offset)) => ErrorKind::NotWatching(offset),
        // Setting values on a handle not requested as output.
        (IoctlKind::SetLine, Errno::EPERM, _) | (_, Errno::EINVAL, _) => {
            ErrorKind::InvalidArgument { kind, cause }
        }
        (_, Errno::EPERM, _) | (_, Errno::EACCES, _) => ErrorKind::PermissionDenied { kind, cause },
        (_, Errno::EBUSY, _) => ErrorKind::Busy { kind, cause },
        (_, Errno::EBADF, _) | (_, Errno::EIO, _) | (_, Errno::ENODEV, _) | (_, Errno::ENXIO, _) => {
            ErrorKind::Io(IOError::from_raw_os_error(cause as i32))
        }
        _ => ErrorKind::Ioctl { kind, cause },
    };
    Error { kind }
}

pub(crate) fn invalid_err(n_lines: usize, n_values: usize) -> Error {
    Error {
        kind: ErrorKind::InvalidRequest(n_lines, n_values),
    }
}

pub(crate) fn too_many_err(n_lines: usize) -> Error {
    Error {
        kind: ErrorKind::TooManyLines(n_lines),
    }
}

pub(crate) fn partial_err(expected: usize, got: usize, complete: Vec<u8>) -> Error {
    Error {
        kind: ErrorKind::PartialRecord {
            expected,
            got,
            complete,
        },
    }
}

pub(crate) fn closed_err() -> Error {
    Error {
        kind: ErrorKind::Io(IOError::new(
            io::ErrorKind::UnexpectedEof,
            "descriptor reached end of stream",
        )),
    }
}

impl fmt::Display for IoctlKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            IoctlKind::ChipInfo => write!(f, "get chip info"),
            IoctlKind::LineInfo => write!(f, "get line info"),
            IoctlKind::LineHandle => write!(f, "get line handle"),
            IoctlKind::LineEvent => write!(f, "get line event"),
            IoctlKind::GetLine => write!(f, "get line value"),
            IoctlKind::SetLine => write!(f, "set line value"),
            IoctlKind::SetConfig => write!(f, "set line config"),
            IoctlKind::WatchLineInfo => write!(f, "watch line info"),
            IoctlKind::UnwatchLineInfo => write!(f, "unwatch line info"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::InvalidArgument { kind, cause } => {
                write!(f, "Invalid argument to {}: {}", kind, cause)
            }
            ErrorKind::NotFound(offset) => write!(f, "Offset {} is out of range", offset),
            ErrorKind::PermissionDenied { kind, cause } => {
                write!(f, "Permission denied to {}: {}", kind, cause)
            }
            ErrorKind::Busy { kind, cause } => write!(f, "Line busy on {}: {}", kind, cause),
            ErrorKind::AlreadyWatching(offset) => {
                write!(f, "Line {} is already being watched", offset)
            }
            ErrorKind::NotWatching(offset) => write!(f, "Line {} is not being watched", offset),
            ErrorKind::AbiMismatch { kind, size } => write!(
                f,
                "Kernel does not support {} with a {} byte record",
                kind, size
            ),
            ErrorKind::Ioctl { kind, cause } => write!(f, "Ioctl to {} failed: {}", kind, cause),
            ErrorKind::Io(err) => err.fmt(f),
            ErrorKind::PartialRecord { expected, got, .. } => write!(
                f,
                "Read {} bytes, not a multiple of the {} byte record",
                got, expected
            ),
            ErrorKind::InvalidRequest(n_lines, n_values) => write!(
                f,
                "Invalid request: {} values requested to be set but only {} lines are open",
                n_values, n_lines
            ),
            ErrorKind::TooManyLines(n_lines) => write!(
                f,
                "Invalid request: {} lines exceeds the maximum of {}",
                n_lines,
                crate::GPIOHANDLES_MAX
            ),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::InvalidArgument { cause, .. }
            | ErrorKind::PermissionDenied { cause, .. }
            | ErrorKind::Busy { cause, .. }
            | ErrorKind::Ioctl { cause, .. } => Some(cause),
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IOError> for Error {
    fn from(err: IOError) -> Error {
        Error {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<Errno> for Error {
    fn from(err: Errno) -> Error {
        Error {
            kind: ErrorKind::Io(IOError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_info_einval_is_not_found() {
        let err = ioctl_err(IoctlKind::LineInfo, Errno::EINVAL, Some(99));
        assert!(matches!(err.kind(), ErrorKind::NotFound(99)));
        assert_eq!(err.to_string(), "Offset 99 is out of range");
    }

    #[test]
    fn watch_ebusy_is_already_watching() {
        let err = ioctl_err(IoctlKind::WatchLineInfo, Errno::EBUSY, Some(3));
        assert!(matches!(err.kind(), ErrorKind::AlreadyWatching(3)));
        let err = ioctl_err(IoctlKind::UnwatchLineInfo, Errno::EBUSY, Some(3));
        assert!(matches!(err.kind(), ErrorKind::NotWatching(3)));
    }

    #[test]
    fn request_errors() {
        let err = ioctl_err(IoctlKind::LineHandle, Errno::EINVAL, None);
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument {
                kind: IoctlKind::LineHandle,
                cause: Errno::EINVAL
            }
        ));
        assert!(err.source().is_some());

        let err = ioctl_err(IoctlKind::LineHandle, Errno::EBUSY, None);
        assert!(matches!(err.kind(), ErrorKind::Busy { .. }));

        let err = ioctl_err(IoctlKind::LineEvent, Errno::EACCES, Some(1));
        assert!(matches!(err.kind(), ErrorKind::PermissionDenied { .. }));
    }

    #[test]
    fn set_on_input_is_invalid_argument() {
        let err = ioctl_err(IoctlKind::SetLine, Errno::EPERM, None);
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        let err = ioctl_err(IoctlKind::GetLine, Errno::EPERM, None);
        assert!(matches!(err.kind(), ErrorKind::PermissionDenied { .. }));
    }

    #[test]
    fn oversized_sets_share_a_class() {
        let kernel = ioctl_err(IoctlKind::LineHandle, Errno::EINVAL, None);
        assert!(kernel.is_invalid_argument());
        assert!(too_many_err(65).is_invalid_argument());
        assert!(invalid_err(1, 2).is_invalid_argument());
        assert!(!ioctl_err(IoctlKind::LineHandle, Errno::EBUSY, None).is_invalid_argument());
    }

    #[test]
    fn enotty_is_abi_mismatch() {
        let err = ioctl_err(IoctlKind::SetConfig, Errno::ENOTTY, None);
        match err.kind() {
            ErrorKind::AbiMismatch { kind, size } => {
                assert_eq!(*kind, IoctlKind::SetConfig);
                assert_eq!(*size, 84);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn device_gone_is_io() {
        let err = ioctl_err(IoctlKind::GetLine, Errno::ENODEV, None);
        assert!(err.is_io());
        let err = ioctl_err(IoctlKind::ChipInfo, Errno::EFAULT, None);
        assert!(matches!(err.kind(), ErrorKind::Ioctl { .. }));
        assert!(!err.is_io());
    }
}
