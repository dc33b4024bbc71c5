// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded waits for a descriptor to become readable.

use std::io;
use std::os::unix::io::{AsFd, AsRawFd};
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};

use crate::errors::Result;

/// Outcome of a wait that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Data can be read without blocking.
    Ready,
    /// The deadline passed with nothing to read.
    Timeout,
}

fn timeout_ms(timeout: Duration) -> libc::c_int {
    // Round up so a short non-zero wait never becomes a non-blocking poll.
    let ms = (timeout.as_nanos() + 999_999) / 1_000_000;
    ms.min(libc::c_int::MAX as u128) as libc::c_int
}

/// Wait up to `timeout` for `fd` to become readable.
///
/// Pending data is reported as [`Readiness::Ready`] even if the other end
/// has hung up, so that it can be drained.  A hang up or error with
/// nothing left to read, or a descriptor that is no longer open, is an
/// I/O error.  An interrupted wait is returned as `EINTR`.
pub fn wait_readable<F: AsFd>(fd: &F, timeout: Duration) -> Result<Readiness> {
    let fd = fd.as_fd();
    let mut fds = [PollFd::new(&fd, PollFlags::POLLIN | PollFlags::POLLPRI)];
    let n = poll(&mut fds, timeout_ms(timeout))?;
    if n == 0 {
        log::trace!("fd {} not readable within {:?}", fd.as_raw_fd(), timeout);
        return Ok(Readiness::Timeout);
    }

    let revents = fds[0].revents().unwrap_or_else(PollFlags::empty);
    if revents.intersects(PollFlags::POLLIN | PollFlags::POLLPRI) {
        Ok(Readiness::Ready)
    } else if revents.contains(PollFlags::POLLNVAL) {
        Err(Errno::EBADF.into())
    } else {
        log::debug!("fd {} hung up: {:?}", fd.as_raw_fd(), revents);
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "descriptor hung up").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn timeout_rounds_up() {
        assert_eq!(timeout_ms(Duration::ZERO), 0);
        assert_eq!(timeout_ms(Duration::from_micros(1)), 1);
        assert_eq!(timeout_ms(Duration::from_millis(250)), 250);
        assert_eq!(timeout_ms(Duration::from_secs(u64::MAX)), libc::c_int::MAX);
    }

    #[test]
    fn times_out_without_data() {
        let (reader, _writer) = UnixStream::pair().unwrap();
        let start = Instant::now();
        let readiness = wait_readable(&reader, Duration::from_millis(50)).unwrap();
        assert_eq!(readiness, Readiness::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn ready_with_data() {
        let (reader, mut writer) = UnixStream::pair().unwrap();
        writer.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(
            wait_readable(&reader, Duration::from_secs(1)).unwrap(),
            Readiness::Ready
        );
    }

    #[test]
    fn ready_before_hang_up_is_drained() {
        let (reader, mut writer) = UnixStream::pair().unwrap();
        writer.write_all(&[1]).unwrap();
        drop(writer);
        assert_eq!(
            wait_readable(&reader, Duration::ZERO).unwrap(),
            Readiness::Ready
        );
    }

    #[test]
    fn closing_the_peer_wakes_a_pending_wait() {
        let (reader, writer) = UnixStream::pair().unwrap();
        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            drop(writer);
        });
        // End of stream is readable; the read that follows reports it.
        let start = Instant::now();
        let readiness = wait_readable(&reader, Duration::from_secs(5)).unwrap();
        assert_eq!(readiness, Readiness::Ready);
        assert!(start.elapsed() < Duration::from_secs(5));
        closer.join().unwrap();
    }
}
