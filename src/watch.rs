// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Line info change notifications.
//!
//! After [`watch_line_info`](crate::dispatch::watch_line_info) the kernel
//! queues a [`LineInfoChanged`] record on that control descriptor each
//! time the line is requested, released or reconfigured, whoever did it.
//! A descriptor only sees changes for offsets it watches itself, and each
//! watching descriptor gets its own copy.  The request descriptor whose
//! creation or closing caused a change never receives one, and
//! unwatching on one descriptor leaves the watches of others intact.
//!
//! Timestamps are the kernel's monotonic clock, in nanoseconds.

use std::io::Read;
use std::os::unix::io::AsFd;
use std::time::Duration;

use crate::errors::Result;
use crate::event::{read_record_timeout, read_records_timeout, StreamConfig};
use crate::ffi::LineInfoChanged;

/// Wait up to `timeout` for the next change on a watching control descriptor.
///
/// Returns `Ok(None)` if no change arrived in time.
pub fn read_line_info_changed_timeout<R: Read + AsFd>(
    ctrl: &mut R,
    timeout: Duration,
) -> Result<Option<LineInfoChanged>> {
    read_record_timeout(ctrl, timeout)
}

/// Wait up to `timeout`, then read every change already queued.
pub fn read_line_info_changes_timeout<R: Read + AsFd>(
    ctrl: &mut R,
    timeout: Duration,
    config: StreamConfig,
) -> Result<Vec<LineInfoChanged>> {
    read_records_timeout(ctrl, timeout, config)
}
