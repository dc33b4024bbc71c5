// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Wrapper for asynchronous programming using Tokio.

use futures::ready;
use futures::stream::Stream;
use futures::task::{Context, Poll};
use tokio::io::unix::AsyncFd;

use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::pin::Pin;

use crate::event::decode_read;
use crate::ffi::{EventData, Record};
use crate::handle::LineEventHandle;
use crate::Result;

/// Wrapper around a `LineEventHandle` which implements a `futures::stream::Stream` for edges.
///
/// The stream ends when the event descriptor reports end of stream.
///
/// # Example
///
/// The following example waits for state changes on an input line.
///
/// ```no_run
/// use futures::stream::StreamExt;
/// use gpio_uapi::{AsyncLineEventHandle, Chip, EventFlags, EventRequest, HandleFlags};
///
/// async fn print_events(offset: u32) -> gpio_uapi::Result<()> {
///     let chip = Chip::new("/dev/gpiochip0")?;
///     let mut request =
///         EventRequest::new(offset, HandleFlags::INPUT, EventFlags::BOTH_EDGES, "gpioevents");
///     let mut events = AsyncLineEventHandle::new(chip.request_events(&mut request)?)?;
///
///     while let Some(event) = events.next().await {
///         println!("{}", event?);
///     }
///
///     Ok(())
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// #     print_events(42).await.unwrap();
/// # }
/// ```
pub struct AsyncLineEventHandle {
    asyncfd: AsyncFd<LineEventHandle>,
}

impl AsyncLineEventHandle {
    /// Wraps the specified `LineEventHandle`.
    ///
    /// # Arguments
    ///
    /// * `handle` - handle to be wrapped.
    pub fn new(handle: LineEventHandle) -> Result<AsyncLineEventHandle> {
        // The file descriptor needs to be configured for non-blocking I/O for AsyncFd to work.
        let fd = handle.as_raw_fd();
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL, 0);
            if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                return Err(io::Error::last_os_error().into());
            }
        }

        Ok(AsyncLineEventHandle {
            asyncfd: AsyncFd::new(handle)?,
        })
    }
}

impl Stream for AsyncLineEventHandle {
    type Item = Result<EventData>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let mut guard = ready!(this.asyncfd.poll_read_ready_mut(cx))?;
            let mut buf = [0; EventData::SIZE];
            let res = guard.try_io(|inner| {
                let mut file = inner.get_ref().file();
                file.read(&mut buf)
            });
            match res {
                Ok(Ok(n)) => return Poll::Ready(decode_read(&buf, n).transpose()),
                Ok(Err(e)) => return Poll::Ready(Some(Err(e.into()))),
                // Readiness was stale; wait again.
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRef<LineEventHandle> for AsyncLineEventHandle {
    fn as_ref(&self) -> &LineEventHandle {
        self.asyncfd.get_ref()
    }
}
