// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Owned descriptors for requested lines.
//!
//! A line is requested for as long as the descriptor returned by the
//! request is open.  Dropping (or [`close`](LineHandle::close)-ing) a
//! handle releases its lines back to the kernel, which notifies every
//! other descriptor watching them.

use std::fs::File;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::time::Duration;

use crate::dispatch;
use crate::errors::{invalid_err, Result};
use crate::event::{self, StreamConfig};
use crate::ffi::{
    EventData, EventFlags, EventRequest, HandleConfig, HandleData, HandleFlags, HandleRequest,
};

/// Handle for reading and writing one or more requested lines.
///
/// Values are logical: with [`HandleFlags::ACTIVE_LOW`] a value of 1 drives
/// the line low.
#[derive(Debug)]
pub struct LineHandle {
    file: File,
    offsets: Vec<u32>,
    flags: HandleFlags,
}

impl LineHandle {
    /// Wrap a descriptor returned by [`dispatch::request_line_handle`]
    /// for `request`.
    pub fn new(fd: OwnedFd, request: &HandleRequest) -> LineHandle {
        LineHandle {
            file: File::from(fd),
            offsets: request.offsets().to_vec(),
            flags: request.flags(),
        }
    }

    /// Offsets of the lines, in request order.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn num_lines(&self) -> usize {
        self.offsets.len()
    }

    /// Flags as last requested or configured.
    pub fn flags(&self) -> HandleFlags {
        self.flags
    }

    /// Get the values of all lines, in request order.
    pub fn get_values(&self) -> Result<Vec<u8>> {
        let data = dispatch::get_line_values(&self.file)?;
        Ok(data.values(self.num_lines()).to_vec())
    }

    /// Get the value of the first line.
    pub fn get_value(&self) -> Result<u8> {
        let data = dispatch::get_line_values(&self.file)?;
        Ok(data.values[0])
    }

    /// Set the values of the first `values.len()` lines.
    ///
    /// Lines past the end of `values` are set to 0.  Fails with
    /// `InvalidArgument` if the lines were not requested as outputs.
    pub fn set_values(&self, values: &[u8]) -> Result<()> {
        if values.len() > self.num_lines() {
            return Err(invalid_err(self.num_lines(), values.len()));
        }
        dispatch::set_line_values(&self.file, &HandleData::from_values(values)?)
    }

    /// Set the value of a single line handle.
    pub fn set_value(&self, value: u8) -> Result<()> {
        self.set_values(&[value])
    }

    /// Change direction, drive and bias without releasing the lines.
    ///
    /// Watchers of the lines are notified with a reconfigured change.
    pub fn set_config(&mut self, flags: HandleFlags, default_values: &[u8]) -> Result<()> {
        if default_values.len() > self.num_lines() {
            return Err(invalid_err(self.num_lines(), default_values.len()));
        }
        dispatch::set_line_config(&self.file, &HandleConfig::new(flags, default_values)?)?;
        self.flags = flags;
        Ok(())
    }

    /// Release the lines.
    pub fn close(self) {
        drop(self)
    }
}

impl Drop for LineHandle {
    fn drop(&mut self) {
        log::trace!(
            "releasing lines {:?} on fd {}",
            self.offsets,
            self.file.as_raw_fd()
        );
    }
}

impl AsFd for LineHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for LineHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// Handle for the edge events of a single requested line.
///
/// The descriptor only delivers events; it has no value access.  Reads
/// take `&mut self` so that there is a single reader per descriptor.
///
/// That borrow also means the handle can't be closed from another thread
/// to interrupt a pending read.  A timed read ends when its timeout
/// passes (`Ok(None)` or an empty batch).  Any read, timed or blocking,
/// ends with an I/O error when the device goes away or the other end of
/// the descriptor hangs up.  Bound waits with
/// [`read_event`](Self::read_event) when they must be cancellable.
#[derive(Debug)]
pub struct LineEventHandle {
    file: File,
    offset: u32,
    event_flags: EventFlags,
    config: StreamConfig,
}

impl LineEventHandle {
    /// Wrap a descriptor returned by [`dispatch::request_line_event`]
    /// for `request`.
    pub fn new(fd: OwnedFd, request: &EventRequest) -> LineEventHandle {
        LineEventHandle {
            file: File::from(fd),
            offset: request.offset,
            event_flags: EventFlags::from_bits_retain(request.event_flags),
            config: StreamConfig::default(),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn event_flags(&self) -> EventFlags {
        self.event_flags
    }

    /// Set how many events [`read_events`](Self::read_events) asks for per read.
    pub fn set_stream_config(&mut self, config: StreamConfig) {
        self.config = config;
    }

    /// Wait up to `timeout` for the next event.
    pub fn read_event(&mut self, timeout: Duration) -> Result<Option<EventData>> {
        event::read_event_timeout(&mut self.file, timeout)
    }

    /// Wait up to `timeout`, then read every event already queued.
    pub fn read_events(&mut self, timeout: Duration) -> Result<Vec<EventData>> {
        event::read_events_timeout(&mut self.file, timeout, self.config)
    }

    /// Block until the next event.
    pub fn get_event(&mut self) -> Result<EventData> {
        event::read_record(&mut self.file)
    }

    #[cfg(feature = "async-tokio")]
    pub(crate) fn file(&self) -> &File {
        &self.file
    }

    /// Release the line.
    pub fn close(self) {
        drop(self)
    }
}

impl Drop for LineEventHandle {
    fn drop(&mut self) {
        log::trace!(
            "releasing line {} on fd {}",
            self.offset,
            self.file.as_raw_fd()
        );
    }
}

impl Iterator for LineEventHandle {
    type Item = Result<EventData>;

    /// Block until the next event; `None` once the stream is closed.
    fn next(&mut self) -> Option<Result<EventData>> {
        event::read_record_or_eof(&mut self.file).transpose()
    }
}

impl AsFd for LineEventHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for LineEventHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::ffi::{EventType, Record};
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    // A socket stands in for the kernel's event descriptor.
    fn event_pair() -> (LineEventHandle, UnixStream) {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let request = EventRequest::new(5, HandleFlags::INPUT, EventFlags::BOTH_EDGES, "test");
        (LineEventHandle::new(OwnedFd::from(ours), &request), theirs)
    }

    #[test]
    fn event_handle_reads_and_iterates() {
        let (mut handle, mut kernel) = event_pair();
        assert_eq!(handle.offset(), 5);
        assert_eq!(handle.event_flags(), EventFlags::BOTH_EDGES);
        assert!(handle.read_event(Duration::from_millis(10)).unwrap().is_none());

        for ts in 1..=3 {
            let event = EventData {
                timestamp: ts,
                id: EventType::RisingEdge as u32,
            };
            kernel.write_all(&event.encode()).unwrap();
        }
        let first = handle.read_event(Duration::from_secs(1)).unwrap().unwrap();
        assert_eq!(first.timestamp(), 1);
        let rest = handle.read_events(Duration::from_secs(1)).unwrap();
        let timestamps: Vec<u64> = rest.iter().map(|e| e.timestamp()).collect();
        assert_eq!(timestamps, vec![2, 3]);

        let event = EventData {
            timestamp: 4,
            id: EventType::FallingEdge as u32,
        };
        kernel.write_all(&event.encode()).unwrap();
        drop(kernel);
        let remaining: Vec<EventData> = handle.by_ref().map(|e| e.unwrap()).collect();
        assert_eq!(remaining, vec![event]);
    }

    #[test]
    fn blocking_read_on_closed_stream_fails() {
        let (mut handle, kernel) = event_pair();
        drop(kernel);
        let err = handle.get_event().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io(_)));
    }

    #[test]
    fn hang_up_ends_a_pending_timed_read() {
        let (mut events, kernel) = event_pair();
        let hangup = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(kernel);
        });
        let start = std::time::Instant::now();
        let err = events.read_event(Duration::from_secs(10)).unwrap_err();
        assert!(err.is_io());
        assert!(start.elapsed() < Duration::from_secs(10));
        hangup.join().unwrap();
    }

    #[test]
    fn too_many_values_rejected_locally() {
        let (ours, _theirs) = UnixStream::pair().unwrap();
        let request = HandleRequest::new(&[2], HandleFlags::OUTPUT, &[0], "test").unwrap();
        let handle = LineHandle::new(OwnedFd::from(ours), &request);
        assert_eq!(handle.offsets(), &[2]);
        assert_eq!(handle.flags(), HandleFlags::OUTPUT);
        let err = handle.set_values(&[1, 0]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidRequest(1, 2)));
    }
}
