// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Linux GPIO character device uAPI (v1), without the sugar.
//!
//! This crate speaks the control protocol of `/dev/gpiochipN` directly:
//!
//! - the kernel's fixed layout records ([`HandleRequest`], [`LineInfo`],
//!   [`EventData`], [`LineInfoChanged`], ...) with an explicit byte
//!   encoding through the [`Record`] trait,
//! - the ioctls that exchange them, as free functions in [`dispatch`],
//! - owned descriptors for requested lines ([`LineHandle`]) and edge
//!   events ([`LineEventHandle`]), closed when dropped,
//! - timeout bounded reads of edge events and line info change
//!   notifications, built on [`wait_readable`].
//!
//! Timeouts are not errors: a read that sees nothing within its deadline
//! returns `None`.  No call retries or hides a failure from the kernel.
//!
//! # Example
//!
//! Watch a line and report when someone else requests it.
//!
//! ```no_run
//! use std::time::Duration;
//! use gpio_uapi::{Chip, LineChangeType};
//!
//! # fn main() -> gpio_uapi::Result<()> {
//! let mut chip = Chip::new("/dev/gpiochip0")?;
//! let info = chip.watch_line_info(3)?;
//! println!("line 3 is {:?}", info.consumer());
//!
//! if let Some(change) = chip.read_line_info_changed(Duration::from_secs(1))? {
//!     if change.change_type() == Some(LineChangeType::Requested) {
//!         println!("requested by {}", change.info().consumer());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Kernel caveats
//!
//! Behaviour below is the kernel's and is passed through unchanged:
//!
//! - Whether duplicate offsets in one [`HandleRequest`] are rejected
//!   depends on the kernel version.
//! - Older kernels return one [`EventData`] per read, and rapid toggles
//!   may be coalesced into fewer events than edges.
//! - Watch isolation had bugs in early versions of the watch patches.

use std::fs::File;
use std::mem;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod errors;
mod ffi;

pub mod dispatch;
pub mod event;
pub mod handle;
pub mod poll;
pub mod watch;

#[cfg(feature = "async-tokio")]
mod async_tokio;

#[cfg(feature = "async-tokio")]
pub use crate::async_tokio::AsyncLineEventHandle;
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::event::{read_event_timeout, read_events_timeout, StreamConfig};
pub use crate::ffi::{
    decode_name, encode_name, ChipInfo, EventData, EventFlags, EventRequest, EventType,
    HandleConfig, HandleData, HandleFlags, HandleRequest, LineChangeType, LineFlags, LineInfo,
    LineInfoChanged, Record, GPIOHANDLES_MAX, GPIO_MAX_NAME_SIZE,
};
pub use crate::handle::{LineEventHandle, LineHandle};
pub use crate::poll::{wait_readable, Readiness};
pub use crate::watch::{read_line_info_changed_timeout, read_line_info_changes_timeout};

/// The request that failed, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoctlKind {
    ChipInfo,
    LineInfo,
    LineHandle,
    LineEvent,
    GetLine,
    SetLine,
    SetConfig,
    WatchLineInfo,
    UnwatchLineInfo,
}

impl IoctlKind {
    /// Size of the record this crate passes with the request.
    pub fn record_size(self) -> usize {
        match self {
            IoctlKind::ChipInfo => mem::size_of::<ChipInfo>(),
            IoctlKind::LineInfo | IoctlKind::WatchLineInfo => mem::size_of::<LineInfo>(),
            IoctlKind::LineHandle => mem::size_of::<HandleRequest>(),
            IoctlKind::LineEvent => mem::size_of::<EventRequest>(),
            IoctlKind::GetLine | IoctlKind::SetLine => mem::size_of::<HandleData>(),
            IoctlKind::SetConfig => mem::size_of::<HandleConfig>(),
            IoctlKind::UnwatchLineInfo => mem::size_of::<u32>(),
        }
    }
}

/// An open GPIO chip control descriptor.
///
/// All requests and watches go through this descriptor.  Watches
/// registered on it are dropped by the kernel when it is closed.
#[derive(Debug)]
pub struct Chip {
    file: File,
    path: Option<PathBuf>,
}

impl Chip {
    /// Open the GPIO Chip at the provided path (/dev/gpiochip<N>)
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Chip> {
        let path = path.as_ref();
        let file = File::open(path)?;
        log::trace!("opened {} as fd {}", path.display(), file.as_raw_fd());
        Ok(Chip {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// The path the chip was opened from, if it was opened by path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self) -> Result<ChipInfo> {
        dispatch::get_chip_info(&self.file)
    }

    pub fn line_info(&self, offset: u32) -> Result<LineInfo> {
        dispatch::get_line_info(&self.file, offset)
    }

    /// Request the lines described by `request`.
    ///
    /// On success `request.fd` holds the new descriptor, which is owned by
    /// the returned handle.
    pub fn request_lines(&self, request: &mut HandleRequest) -> Result<LineHandle> {
        let fd = dispatch::request_line_handle(&self.file, request)?;
        Ok(LineHandle::new(fd, request))
    }

    /// Request edge events on a single line.
    pub fn request_events(&self, request: &mut EventRequest) -> Result<LineEventHandle> {
        let fd = dispatch::request_line_event(&self.file, request)?;
        Ok(LineEventHandle::new(fd, request))
    }

    /// Watch `offset` for info changes, returning its current info.
    pub fn watch_line_info(&self, offset: u32) -> Result<LineInfo> {
        dispatch::watch_line_info(&self.file, offset)
    }

    pub fn unwatch_line_info(&self, offset: u32) -> Result<()> {
        dispatch::unwatch_line_info(&self.file, offset)
    }

    /// Wait up to `timeout` for the next change on any watched line.
    ///
    /// The read borrows the chip mutably, so it cannot be closed from
    /// another thread while the wait is pending.  A pending wait ends
    /// when `timeout` passes (`Ok(None)`), or with an I/O error when the
    /// device goes away or the other end of the descriptor hangs up.
    pub fn read_line_info_changed(&mut self, timeout: Duration) -> Result<Option<LineInfoChanged>> {
        watch::read_line_info_changed_timeout(&mut &self.file, timeout)
    }

    /// Wait up to `timeout`, then return every change already queued.
    ///
    /// Ends like [`read_line_info_changed`](Self::read_line_info_changed).
    pub fn read_line_info_changes(
        &mut self,
        timeout: Duration,
        config: StreamConfig,
    ) -> Result<Vec<LineInfoChanged>> {
        watch::read_line_info_changes_timeout(&mut &self.file, timeout, config)
    }
}

impl From<OwnedFd> for Chip {
    /// Adopt a control descriptor opened elsewhere, e.g. by a simulator.
    fn from(fd: OwnedFd) -> Chip {
        Chip {
            file: File::from(fd),
            path: None,
        }
    }
}

impl AsFd for Chip {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for Chip {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
