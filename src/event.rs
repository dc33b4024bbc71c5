// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reading fixed size records from event descriptors.
//!
//! Line event descriptors deliver [`EventData`] records and chip
//! descriptors deliver [`LineInfoChanged`](crate::LineInfoChanged)
//! records; both are read the same way.  A read that ends part way
//! through a record is an error, never silently dropped, and a read of
//! zero bytes means the stream was closed.
//!
//! How many records a single read returns is up to the kernel.  Older
//! kernels return exactly one event per read however large the buffer,
//! and rapid edges may be coalesced into fewer events than actually
//! occurred.  [`StreamConfig`] only bounds how many are asked for.

use std::io::Read;
use std::os::unix::io::{AsFd, AsRawFd};
use std::time::Duration;

use crate::errors::{closed_err, partial_err, Result};
use crate::ffi::{EventData, Record};
use crate::poll::{wait_readable, Readiness};

/// Depth of the kernel's per-line event FIFO.
const KERNEL_FIFO_DEPTH: usize = 16;

/// Sizing of batched record reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    records_per_read: usize,
}

impl Default for StreamConfig {
    fn default() -> StreamConfig {
        StreamConfig {
            records_per_read: KERNEL_FIFO_DEPTH,
        }
    }
}

impl StreamConfig {
    /// Ask for at most `n` records per read.  Zero is treated as one.
    pub fn records_per_read(n: usize) -> StreamConfig {
        StreamConfig {
            records_per_read: n.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.records_per_read
    }
}

/// Decode the result of reading into a one record buffer; `None` at end of stream.
pub(crate) fn decode_read<T: Record>(buf: &[u8], n: usize) -> Result<Option<T>> {
    match n {
        0 => Ok(None),
        n if n == T::SIZE => Ok(Some(T::decode_from(&buf[..n]))),
        n => Err(partial_err(T::SIZE, n, Vec::new())),
    }
}

/// Read exactly one record, blocking if the descriptor is blocking.
///
/// `None` means the stream was closed.
pub(crate) fn read_record_or_eof<T: Record, R: Read>(src: &mut R) -> Result<Option<T>> {
    let mut buf = vec![0; T::SIZE];
    let n = src.read(&mut buf)?;
    decode_read(&buf, n)
}

pub(crate) fn read_record<T: Record, R: Read>(src: &mut R) -> Result<T> {
    read_record_or_eof(src)?.ok_or_else(closed_err)
}

pub(crate) fn read_record_timeout<T: Record, R: Read + AsFd>(
    src: &mut R,
    timeout: Duration,
) -> Result<Option<T>> {
    match wait_readable(&*src, timeout)? {
        Readiness::Timeout => Ok(None),
        Readiness::Ready => read_record(src).map(Some),
    }
}

/// Read every whole record that is available without blocking.
///
/// The caller must already know the descriptor is readable.
pub(crate) fn drain_records<T: Record, R: Read + AsFd>(
    src: &mut R,
    config: StreamConfig,
) -> Result<Vec<T>> {
    let mut buf = vec![0; T::SIZE * config.capacity()];
    let mut records = Vec::new();
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            if records.is_empty() {
                return Err(closed_err());
            }
            break;
        }
        if n % T::SIZE != 0 {
            // Whole records are already off the descriptor; hand them back
            // with the error.
            let whole = n - n % T::SIZE;
            let mut complete: Vec<u8> = records.iter().flat_map(T::encode).collect();
            complete.extend_from_slice(&buf[..whole]);
            log::debug!(
                "fd {} read {} stray bytes after {} whole records",
                src.as_fd().as_raw_fd(),
                n - whole,
                complete.len() / T::SIZE
            );
            return Err(partial_err(T::SIZE, n, complete));
        }
        records.extend(buf[..n].chunks_exact(T::SIZE).map(T::decode_from));

        match wait_readable(&*src, Duration::ZERO) {
            Ok(Readiness::Ready) => continue,
            Ok(Readiness::Timeout) => break,
            // Records already read are returned; the condition is still
            // there for the next wait to report.
            Err(e) => {
                log::debug!(
                    "fd {} stopped after {} records: {}",
                    src.as_fd().as_raw_fd(),
                    records.len(),
                    e
                );
                break;
            }
        }
    }
    log::trace!(
        "read {} records from fd {}",
        records.len(),
        src.as_fd().as_raw_fd()
    );
    Ok(records)
}

pub(crate) fn read_records_timeout<T: Record, R: Read + AsFd>(
    src: &mut R,
    timeout: Duration,
    config: StreamConfig,
) -> Result<Vec<T>> {
    match wait_readable(&*src, timeout)? {
        Readiness::Timeout => Ok(Vec::new()),
        Readiness::Ready => drain_records(src, config),
    }
}

/// Wait up to `timeout` for an edge event on a line event descriptor.
///
/// Returns `Ok(None)` if nothing arrived in time.  Once the descriptor is
/// readable exactly one record is read.
pub fn read_event_timeout<R: Read + AsFd>(
    src: &mut R,
    timeout: Duration,
) -> Result<Option<EventData>> {
    read_record_timeout(src, timeout)
}

/// Wait up to `timeout`, then read all queued edge events.
///
/// An empty result means the deadline passed with no events.
pub fn read_events_timeout<R: Read + AsFd>(
    src: &mut R,
    timeout: Duration,
    config: StreamConfig,
) -> Result<Vec<EventData>> {
    read_records_timeout(src, timeout, config)
}
