// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Kernel GPIO uAPI (v1) records.
//!
//! Every record here is `#[repr(C)]` and mirrors the corresponding
//! structure in `include/uapi/linux/gpio.h`.  Field order and widths are
//! the ABI contract with the kernel and must only change together with
//! it.  The [`Record`] trait provides an explicit byte encoding of each
//! record, driven by the compiled field offsets, for the records that are
//! read from descriptors rather than exchanged through ioctls.

use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;
use std::mem::{self, offset_of};

use bitflags::bitflags;
use nix::{ioctl_read, ioctl_readwrite};

use crate::errors::{invalid_err, too_many_err, Result};

/// Maximum number of lines in a single handle request.
pub const GPIOHANDLES_MAX: usize = 64;

/// Width of every name and label field, including the terminating NUL.
pub const GPIO_MAX_NAME_SIZE: usize = 32;

bitflags! {
    /// Informational flags reported in [`LineInfo`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineFlags: u32 {
        /// The line is in use, either by the kernel or by a userspace request.
        const REQUESTED = 1 << 0;
        const IS_OUT = 1 << 1;
        const ACTIVE_LOW = 1 << 2;
        const OPEN_DRAIN = 1 << 3;
        const OPEN_SOURCE = 1 << 4;
        const BIAS_PULL_UP = 1 << 5;
        const BIAS_PULL_DOWN = 1 << 6;
        const BIAS_DISABLE = 1 << 7;
        /// Name used by the kernel headers for [`LineFlags::REQUESTED`].
        const KERNEL = Self::REQUESTED.bits();
    }
}

bitflags! {
    /// Flags used when requesting or reconfiguring a line handle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandleFlags: u32 {
        const INPUT = 1 << 0;
        const OUTPUT = 1 << 1;
        const ACTIVE_LOW = 1 << 2;
        const OPEN_DRAIN = 1 << 3;
        const OPEN_SOURCE = 1 << 4;
        const BIAS_PULL_UP = 1 << 5;
        const BIAS_PULL_DOWN = 1 << 6;
        const BIAS_DISABLE = 1 << 7;
    }
}

bitflags! {
    /// Edges to report on an event request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u32 {
        const RISING_EDGE = 1 << 0;
        const FALLING_EDGE = 1 << 1;
        const BOTH_EDGES = Self::RISING_EDGE.bits() | Self::FALLING_EDGE.bits();
    }
}

/// Edge reported in an [`EventData`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventType {
    RisingEdge = 0x01,
    FallingEdge = 0x02,
}

impl TryFrom<u32> for EventType {
    type Error = u32;

    fn try_from(id: u32) -> std::result::Result<Self, u32> {
        match id {
            0x01 => Ok(EventType::RisingEdge),
            0x02 => Ok(EventType::FallingEdge),
            other => Err(other),
        }
    }
}

/// Kind of transition reported in a [`LineInfoChanged`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LineChangeType {
    Requested = 1,
    Released = 2,
    Reconfigured = 3,
}

impl TryFrom<u32> for LineChangeType {
    type Error = u32;

    fn try_from(id: u32) -> std::result::Result<Self, u32> {
        match id {
            1 => Ok(LineChangeType::Requested),
            2 => Ok(LineChangeType::Released),
            3 => Ok(LineChangeType::Reconfigured),
            other => Err(other),
        }
    }
}

// struct gpiochip_info
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipInfo {
    pub name: [u8; GPIO_MAX_NAME_SIZE],
    pub label: [u8; GPIO_MAX_NAME_SIZE],
    pub lines: u32,
}

// struct gpioline_info
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo {
    pub offset: u32,
    pub flags: u32,
    pub name: [u8; GPIO_MAX_NAME_SIZE],
    pub consumer: [u8; GPIO_MAX_NAME_SIZE],
}

// struct gpioline_info_changed
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfoChanged {
    pub info: LineInfo,
    pub timestamp: u64,
    pub event_type: u32,
    pub padding: [u32; 5],
}

// struct gpiohandle_request
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRequest {
    pub offsets: [u32; GPIOHANDLES_MAX],
    pub flags: u32,
    pub default_values: [u8; GPIOHANDLES_MAX],
    pub consumer: [u8; GPIO_MAX_NAME_SIZE],
    pub lines: u32,
    pub fd: i32,
}

// struct gpiohandle_config
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleConfig {
    pub flags: u32,
    pub default_values: [u8; GPIOHANDLES_MAX],
    pub padding: [u32; 4],
}

// struct gpiohandle_data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleData {
    pub values: [u8; GPIOHANDLES_MAX],
}

// struct gpioevent_request
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventRequest {
    pub offset: u32,
    pub handle_flags: u32,
    pub event_flags: u32,
    pub consumer: [u8; GPIO_MAX_NAME_SIZE],
    pub fd: i32,
}

// struct gpioevent_data
//
// The trailing padding after `id` is implicit, as in the kernel header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventData {
    pub timestamp: u64,
    pub id: u32,
}

// The layouts below are fixed by the kernel; a mismatch here is a build
// failure rather than a runtime surprise.
const _: () = assert!(mem::size_of::<ChipInfo>() == 68);
const _: () = assert!(mem::size_of::<LineInfo>() == 72);
const _: () = assert!(mem::size_of::<HandleRequest>() == 364);
const _: () = assert!(mem::size_of::<HandleConfig>() == 84);
const _: () = assert!(mem::size_of::<HandleData>() == 64);
const _: () = assert!(mem::size_of::<EventRequest>() == 48);
#[cfg(target_pointer_width = "64")]
const _: () = assert!(mem::size_of::<EventData>() == 16);
#[cfg(target_pointer_width = "64")]
const _: () = assert!(mem::size_of::<LineInfoChanged>() == 104);

ioctl_read!(gpio_get_chipinfo_ioctl, 0xB4, 0x01, ChipInfo);
ioctl_readwrite!(gpio_get_lineinfo_ioctl, 0xB4, 0x02, LineInfo);
ioctl_readwrite!(gpio_get_linehandle_ioctl, 0xB4, 0x03, HandleRequest);
ioctl_readwrite!(gpio_get_lineevent_ioctl, 0xB4, 0x04, EventRequest);

ioctl_readwrite!(gpiohandle_get_line_values_ioctl, 0xB4, 0x08, HandleData);
ioctl_readwrite!(gpiohandle_set_line_values_ioctl, 0xB4, 0x09, HandleData);
ioctl_readwrite!(gpiohandle_set_config_ioctl, 0xB4, 0x0a, HandleConfig);

ioctl_readwrite!(gpio_get_lineinfo_watch_ioctl, 0xB4, 0x0b, LineInfo);
ioctl_readwrite!(gpio_get_lineinfo_unwatch_ioctl, 0xB4, 0x0c, u32);

/// Copy `label` into a fixed width kernel name field.
///
/// The label is silently truncated so that a terminating NUL always fits.
pub fn encode_name(field: &mut [u8; GPIO_MAX_NAME_SIZE], label: &str) {
    *field = [0; GPIO_MAX_NAME_SIZE];
    let len = label.len().min(GPIO_MAX_NAME_SIZE - 1);
    field[..len].copy_from_slice(&label.as_bytes()[..len]);
}

/// Decode a NUL terminated kernel name field.
pub fn decode_name(field: &[u8]) -> Cow<'_, str> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end])
}

impl ChipInfo {
    pub fn name(&self) -> Cow<'_, str> {
        decode_name(&self.name)
    }

    pub fn label(&self) -> Cow<'_, str> {
        decode_name(&self.label)
    }

    pub fn num_lines(&self) -> u32 {
        self.lines
    }
}

impl LineInfo {
    pub fn new(offset: u32) -> LineInfo {
        LineInfo {
            offset,
            ..Default::default()
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Flags reported by the kernel; unknown bits are preserved.
    pub fn flags(&self) -> LineFlags {
        LineFlags::from_bits_retain(self.flags)
    }

    pub fn name(&self) -> Cow<'_, str> {
        decode_name(&self.name)
    }

    pub fn consumer(&self) -> Cow<'_, str> {
        decode_name(&self.consumer)
    }

    pub fn is_requested(&self) -> bool {
        self.flags().contains(LineFlags::REQUESTED)
    }
}

impl LineInfoChanged {
    pub fn info(&self) -> &LineInfo {
        &self.info
    }

    /// Monotonic time of the change in nanoseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// `None` when the kernel reports a change type this crate doesn't know.
    pub fn change_type(&self) -> Option<LineChangeType> {
        LineChangeType::try_from(self.event_type).ok()
    }
}

impl Default for HandleRequest {
    fn default() -> HandleRequest {
        HandleRequest {
            offsets: [0; GPIOHANDLES_MAX],
            flags: 0,
            default_values: [0; GPIOHANDLES_MAX],
            consumer: [0; GPIO_MAX_NAME_SIZE],
            lines: 0,
            fd: 0,
        }
    }
}

impl HandleRequest {
    /// Build a request for `offsets`.
    ///
    /// `default_values` may be shorter than `offsets`; missing values are
    /// zero.  Offsets are passed to the kernel as given, duplicates
    /// included.
    pub fn new(
        offsets: &[u32],
        flags: HandleFlags,
        default_values: &[u8],
        consumer: &str,
    ) -> Result<HandleRequest> {
        if offsets.len() > GPIOHANDLES_MAX {
            return Err(too_many_err(offsets.len()));
        }
        if default_values.len() > offsets.len() {
            return Err(invalid_err(offsets.len(), default_values.len()));
        }
        let mut request = HandleRequest {
            flags: flags.bits(),
            lines: offsets.len() as u32,
            ..Default::default()
        };
        request.offsets[..offsets.len()].copy_from_slice(offsets);
        request.default_values[..default_values.len()].copy_from_slice(default_values);
        encode_name(&mut request.consumer, consumer);
        Ok(request)
    }

    pub fn offsets(&self) -> &[u32] {
        let lines = (self.lines as usize).min(GPIOHANDLES_MAX);
        &self.offsets[..lines]
    }

    pub fn flags(&self) -> HandleFlags {
        HandleFlags::from_bits_retain(self.flags)
    }

    pub fn consumer(&self) -> Cow<'_, str> {
        decode_name(&self.consumer)
    }
}

impl Default for HandleConfig {
    fn default() -> HandleConfig {
        HandleConfig {
            flags: 0,
            default_values: [0; GPIOHANDLES_MAX],
            padding: [0; 4],
        }
    }
}

impl HandleConfig {
    pub fn new(flags: HandleFlags, default_values: &[u8]) -> Result<HandleConfig> {
        if default_values.len() > GPIOHANDLES_MAX {
            return Err(too_many_err(default_values.len()));
        }
        let mut config = HandleConfig {
            flags: flags.bits(),
            ..Default::default()
        };
        config.default_values[..default_values.len()].copy_from_slice(default_values);
        Ok(config)
    }
}

impl Default for HandleData {
    fn default() -> HandleData {
        HandleData {
            values: [0; GPIOHANDLES_MAX],
        }
    }
}

impl HandleData {
    pub fn from_values(values: &[u8]) -> Result<HandleData> {
        if values.len() > GPIOHANDLES_MAX {
            return Err(too_many_err(values.len()));
        }
        let mut data = HandleData::default();
        data.values[..values.len()].copy_from_slice(values);
        Ok(data)
    }

    /// Values of the first `lines` lines of the handle.
    pub fn values(&self, lines: usize) -> &[u8] {
        &self.values[..lines.min(GPIOHANDLES_MAX)]
    }
}

impl EventRequest {
    pub fn new(
        offset: u32,
        handle_flags: HandleFlags,
        event_flags: EventFlags,
        consumer: &str,
    ) -> EventRequest {
        let mut request = EventRequest {
            offset,
            handle_flags: handle_flags.bits(),
            event_flags: event_flags.bits(),
            ..Default::default()
        };
        encode_name(&mut request.consumer, consumer);
        request
    }

    pub fn consumer(&self) -> Cow<'_, str> {
        decode_name(&self.consumer)
    }
}

impl EventData {
    /// Best estimate of the time of the edge, in nanoseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// `None` when the kernel reports an id this crate doesn't know.
    pub fn event_type(&self) -> Option<EventType> {
        EventType::try_from(self.id).ok()
    }
}

impl fmt::Display for EventData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.event_type() {
            Some(EventType::RisingEdge) => write!(f, "{} rising", self.timestamp),
            Some(EventType::FallingEdge) => write!(f, "{} falling", self.timestamp),
            None => write!(f, "{} unknown({})", self.timestamp, self.id),
        }
    }
}

/// A fixed size record with an explicit native-endian byte encoding.
///
/// Encoding covers the whole compiled record, implicit padding included
/// (written as zero), so the encoded length always equals what the kernel
/// reads or writes for the same record.
pub trait Record: Sized {
    const SIZE: usize;

    /// Encode into `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`Record::SIZE`].
    fn encode_into(&self, buf: &mut [u8]);

    /// Decode from `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`Record::SIZE`].
    fn decode_from(buf: &[u8]) -> Self;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0; Self::SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Decode exactly one record; `None` unless `buf` is exactly one record long.
    fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() == Self::SIZE {
            Some(Self::decode_from(buf))
        } else {
            None
        }
    }
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_ne_bytes());
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_ne_bytes(bytes)
}

fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_ne_bytes());
}

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_ne_bytes(bytes)
}

fn put_bytes(buf: &mut [u8], at: usize, bytes: &[u8]) {
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

fn get_bytes<const N: usize>(buf: &[u8], at: usize) -> [u8; N] {
    let mut bytes = [0; N];
    bytes.copy_from_slice(&buf[at..at + N]);
    bytes
}

fn put_u32s(buf: &mut [u8], at: usize, values: &[u32]) {
    for (i, value) in values.iter().enumerate() {
        put_u32(buf, at + i * 4, *value);
    }
}

fn get_u32s<const N: usize>(buf: &[u8], at: usize) -> [u32; N] {
    let mut values = [0; N];
    for (i, value) in values.iter_mut().enumerate() {
        *value = get_u32(buf, at + i * 4);
    }
    values
}

fn zeroed(buf: &mut [u8], size: usize) -> &mut [u8] {
    let buf = &mut buf[..size];
    buf.fill(0);
    buf
}

impl Record for ChipInfo {
    const SIZE: usize = mem::size_of::<ChipInfo>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_bytes(buf, offset_of!(ChipInfo, name), &self.name);
        put_bytes(buf, offset_of!(ChipInfo, label), &self.label);
        put_u32(buf, offset_of!(ChipInfo, lines), self.lines);
    }

    fn decode_from(buf: &[u8]) -> ChipInfo {
        ChipInfo {
            name: get_bytes(buf, offset_of!(ChipInfo, name)),
            label: get_bytes(buf, offset_of!(ChipInfo, label)),
            lines: get_u32(buf, offset_of!(ChipInfo, lines)),
        }
    }
}

impl Record for LineInfo {
    const SIZE: usize = mem::size_of::<LineInfo>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_u32(buf, offset_of!(LineInfo, offset), self.offset);
        put_u32(buf, offset_of!(LineInfo, flags), self.flags);
        put_bytes(buf, offset_of!(LineInfo, name), &self.name);
        put_bytes(buf, offset_of!(LineInfo, consumer), &self.consumer);
    }

    fn decode_from(buf: &[u8]) -> LineInfo {
        LineInfo {
            offset: get_u32(buf, offset_of!(LineInfo, offset)),
            flags: get_u32(buf, offset_of!(LineInfo, flags)),
            name: get_bytes(buf, offset_of!(LineInfo, name)),
            consumer: get_bytes(buf, offset_of!(LineInfo, consumer)),
        }
    }
}

impl Record for LineInfoChanged {
    const SIZE: usize = mem::size_of::<LineInfoChanged>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        let info = offset_of!(LineInfoChanged, info);
        self.info.encode_into(&mut buf[info..info + LineInfo::SIZE]);
        put_u64(buf, offset_of!(LineInfoChanged, timestamp), self.timestamp);
        put_u32(buf, offset_of!(LineInfoChanged, event_type), self.event_type);
        put_u32s(buf, offset_of!(LineInfoChanged, padding), &self.padding);
    }

    fn decode_from(buf: &[u8]) -> LineInfoChanged {
        let info = offset_of!(LineInfoChanged, info);
        LineInfoChanged {
            info: LineInfo::decode_from(&buf[info..info + LineInfo::SIZE]),
            timestamp: get_u64(buf, offset_of!(LineInfoChanged, timestamp)),
            event_type: get_u32(buf, offset_of!(LineInfoChanged, event_type)),
            padding: get_u32s(buf, offset_of!(LineInfoChanged, padding)),
        }
    }
}

impl Record for HandleRequest {
    const SIZE: usize = mem::size_of::<HandleRequest>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_u32s(buf, offset_of!(HandleRequest, offsets), &self.offsets);
        put_u32(buf, offset_of!(HandleRequest, flags), self.flags);
        put_bytes(buf, offset_of!(HandleRequest, default_values), &self.default_values);
        put_bytes(buf, offset_of!(HandleRequest, consumer), &self.consumer);
        put_u32(buf, offset_of!(HandleRequest, lines), self.lines);
        put_u32(buf, offset_of!(HandleRequest, fd), self.fd as u32);
    }

    fn decode_from(buf: &[u8]) -> HandleRequest {
        HandleRequest {
            offsets: get_u32s(buf, offset_of!(HandleRequest, offsets)),
            flags: get_u32(buf, offset_of!(HandleRequest, flags)),
            default_values: get_bytes(buf, offset_of!(HandleRequest, default_values)),
            consumer: get_bytes(buf, offset_of!(HandleRequest, consumer)),
            lines: get_u32(buf, offset_of!(HandleRequest, lines)),
            fd: get_u32(buf, offset_of!(HandleRequest, fd)) as i32,
        }
    }
}

impl Record for HandleConfig {
    const SIZE: usize = mem::size_of::<HandleConfig>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_u32(buf, offset_of!(HandleConfig, flags), self.flags);
        put_bytes(buf, offset_of!(HandleConfig, default_values), &self.default_values);
        put_u32s(buf, offset_of!(HandleConfig, padding), &self.padding);
    }

    fn decode_from(buf: &[u8]) -> HandleConfig {
        HandleConfig {
            flags: get_u32(buf, offset_of!(HandleConfig, flags)),
            default_values: get_bytes(buf, offset_of!(HandleConfig, default_values)),
            padding: get_u32s(buf, offset_of!(HandleConfig, padding)),
        }
    }
}

impl Record for HandleData {
    const SIZE: usize = mem::size_of::<HandleData>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_bytes(buf, offset_of!(HandleData, values), &self.values);
    }

    fn decode_from(buf: &[u8]) -> HandleData {
        HandleData {
            values: get_bytes(buf, offset_of!(HandleData, values)),
        }
    }
}

impl Record for EventRequest {
    const SIZE: usize = mem::size_of::<EventRequest>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_u32(buf, offset_of!(EventRequest, offset), self.offset);
        put_u32(buf, offset_of!(EventRequest, handle_flags), self.handle_flags);
        put_u32(buf, offset_of!(EventRequest, event_flags), self.event_flags);
        put_bytes(buf, offset_of!(EventRequest, consumer), &self.consumer);
        put_u32(buf, offset_of!(EventRequest, fd), self.fd as u32);
    }

    fn decode_from(buf: &[u8]) -> EventRequest {
        EventRequest {
            offset: get_u32(buf, offset_of!(EventRequest, offset)),
            handle_flags: get_u32(buf, offset_of!(EventRequest, handle_flags)),
            event_flags: get_u32(buf, offset_of!(EventRequest, event_flags)),
            consumer: get_bytes(buf, offset_of!(EventRequest, consumer)),
            fd: get_u32(buf, offset_of!(EventRequest, fd)) as i32,
        }
    }
}

impl Record for EventData {
    const SIZE: usize = mem::size_of::<EventData>();

    fn encode_into(&self, buf: &mut [u8]) {
        let buf = zeroed(buf, Self::SIZE);
        put_u64(buf, offset_of!(EventData, timestamp), self.timestamp);
        put_u32(buf, offset_of!(EventData, id), self.id);
    }

    fn decode_from(buf: &[u8]) -> EventData {
        EventData {
            timestamp: get_u64(buf, offset_of!(EventData, timestamp)),
            id: get_u32(buf, offset_of!(EventData, id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    fn reencode<T: Record>(bytes: &[u8]) -> Vec<u8> {
        T::decode(bytes).expect("record of the right size").encode()
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn field_offsets_match_kernel_headers() {
        assert_eq!(offset_of!(LineInfo, flags), 4);
        assert_eq!(offset_of!(LineInfo, name), 8);
        assert_eq!(offset_of!(LineInfo, consumer), 40);
        assert_eq!(offset_of!(ChipInfo, lines), 64);
        assert_eq!(offset_of!(HandleRequest, flags), 256);
        assert_eq!(offset_of!(HandleRequest, default_values), 260);
        assert_eq!(offset_of!(HandleRequest, consumer), 324);
        assert_eq!(offset_of!(HandleRequest, lines), 356);
        assert_eq!(offset_of!(HandleRequest, fd), 360);
        assert_eq!(offset_of!(HandleConfig, padding), 68);
        assert_eq!(offset_of!(EventRequest, consumer), 12);
        assert_eq!(offset_of!(EventRequest, fd), 44);
        assert_eq!(offset_of!(EventData, id), 8);
        assert_eq!(offset_of!(LineInfoChanged, timestamp), 72);
        assert_eq!(offset_of!(LineInfoChanged, event_type), 80);
        assert_eq!(offset_of!(LineInfoChanged, padding), 84);
        assert_eq!(EventData::SIZE, 16);
        assert_eq!(LineInfoChanged::SIZE, 104);
    }

    #[test]
    fn name_truncated_to_field_width() {
        let mut field = [0xff; GPIO_MAX_NAME_SIZE];
        let long = "a-consumer-label-well-beyond-thirty-two-bytes";
        encode_name(&mut field, long);
        assert_eq!(field[GPIO_MAX_NAME_SIZE - 1], 0);
        assert_eq!(decode_name(&field), &long[..31]);

        let exact = "0123456789012345678901234567890";
        assert_eq!(exact.len(), 31);
        encode_name(&mut field, exact);
        assert_eq!(decode_name(&field), exact);

        encode_name(&mut field, "");
        assert_eq!(field, [0; GPIO_MAX_NAME_SIZE]);
    }

    #[test]
    fn decode_name_without_terminator() {
        let field = [b'x'; GPIO_MAX_NAME_SIZE];
        assert_eq!(decode_name(&field).len(), GPIO_MAX_NAME_SIZE);
    }

    #[test]
    fn handle_request_zero_lines_round_trip() {
        let request = HandleRequest::new(&[], HandleFlags::INPUT, &[], "").unwrap();
        assert_eq!(request.lines, 0);
        assert!(request.offsets().is_empty());
        let bytes = request.encode();
        assert_eq!(bytes.len(), HandleRequest::SIZE);
        assert_eq!(reencode::<HandleRequest>(&bytes), bytes);
        assert_eq!(HandleRequest::decode(&bytes), Some(request));
    }

    #[test]
    fn handle_request_max_lines_round_trip() {
        let offsets: Vec<u32> = (0..GPIOHANDLES_MAX as u32).map(|o| o * 3 + 1).collect();
        let values: Vec<u8> = (0..GPIOHANDLES_MAX).map(|i| (i % 2) as u8).collect();
        let mut request = HandleRequest::new(
            &offsets,
            HandleFlags::OUTPUT | HandleFlags::OPEN_DRAIN | HandleFlags::ACTIVE_LOW,
            &values,
            "0123456789012345678901234567890",
        )
        .unwrap();
        request.fd = -1;
        let bytes = request.encode();
        assert_eq!(reencode::<HandleRequest>(&bytes), bytes);

        let decoded = HandleRequest::decode(&bytes).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.offsets(), &offsets[..]);
        assert_eq!(decoded.fd, -1);
        assert_eq!(decoded.consumer(), "0123456789012345678901234567890");
    }

    #[test]
    fn handle_request_rejects_oversized_sets() {
        let offsets = vec![0; GPIOHANDLES_MAX + 1];
        assert!(HandleRequest::new(&offsets, HandleFlags::INPUT, &[], "x").is_err());
        assert!(HandleRequest::new(&[1, 2], HandleFlags::OUTPUT, &[0, 1, 1], "x").is_err());
        // Shorter default values are fine.
        let request = HandleRequest::new(&[1, 2], HandleFlags::OUTPUT, &[1], "x").unwrap();
        assert_eq!(&request.default_values[..2], &[1, 0]);
    }

    #[test]
    fn handle_request_keeps_duplicate_offsets() {
        let request = HandleRequest::new(&[1, 1], HandleFlags::INPUT, &[], "dup").unwrap();
        assert_eq!(request.offsets(), &[1, 1]);
    }

    #[test]
    fn line_info_round_trip() {
        let mut info = LineInfo::new(u32::MAX);
        info.flags = (LineFlags::REQUESTED | LineFlags::IS_OUT | LineFlags::BIAS_DISABLE).bits();
        encode_name(&mut info.name, "gpio-mockup-A-3");
        encode_name(&mut info.consumer, "0123456789012345678901234567890");
        let bytes = info.encode();
        assert_eq!(reencode::<LineInfo>(&bytes), bytes);
        let decoded = LineInfo::decode(&bytes).unwrap();
        assert_eq!(decoded, info);
        assert!(decoded.is_requested());
        assert_eq!(decoded.name(), "gpio-mockup-A-3");
    }

    #[test]
    fn line_info_changed_round_trip() {
        let mut info = LineInfo::new(3);
        encode_name(&mut info.consumer, "watcher");
        let change = LineInfoChanged {
            info,
            timestamp: u64::MAX - 1,
            event_type: LineChangeType::Released as u32,
            padding: [0; 5],
        };
        let bytes = change.encode();
        assert_eq!(bytes.len(), LineInfoChanged::SIZE);
        assert_eq!(reencode::<LineInfoChanged>(&bytes), bytes);
        let decoded = LineInfoChanged::decode(&bytes).unwrap();
        assert_eq!(decoded, change);
        assert_eq!(decoded.change_type(), Some(LineChangeType::Released));
        assert_eq!(decoded.info().consumer(), "watcher");
    }

    #[test]
    fn chip_info_round_trip() {
        let mut info = ChipInfo::default();
        encode_name(&mut info.name, "gpiochip0");
        encode_name(&mut info.label, "gpio-mockup-A");
        info.lines = 8;
        let bytes = info.encode();
        assert_eq!(reencode::<ChipInfo>(&bytes), bytes);
        let decoded = ChipInfo::decode(&bytes).unwrap();
        assert_eq!(decoded.name(), "gpiochip0");
        assert_eq!(decoded.label(), "gpio-mockup-A");
        assert_eq!(decoded.num_lines(), 8);
    }

    #[test]
    fn handle_config_and_data_round_trip() {
        let config = HandleConfig::new(HandleFlags::OUTPUT, &[1; GPIOHANDLES_MAX]).unwrap();
        let bytes = config.encode();
        assert_eq!(reencode::<HandleConfig>(&bytes), bytes);
        assert_eq!(HandleConfig::decode(&bytes), Some(config));

        let empty = HandleData::default().encode();
        assert_eq!(empty, vec![0; HandleData::SIZE]);
        assert_eq!(reencode::<HandleData>(&empty), empty);

        let full = HandleData::from_values(&[1; GPIOHANDLES_MAX]).unwrap();
        assert_eq!(full.values(GPIOHANDLES_MAX), &[1; GPIOHANDLES_MAX][..]);
        assert!(HandleData::from_values(&[0; GPIOHANDLES_MAX + 1]).is_err());
    }

    #[test]
    fn event_request_round_trip() {
        let mut request = EventRequest::new(
            7,
            HandleFlags::INPUT | HandleFlags::ACTIVE_LOW,
            EventFlags::BOTH_EDGES,
            "0123456789012345678901234567890-overflow",
        );
        request.fd = 42;
        let bytes = request.encode();
        assert_eq!(reencode::<EventRequest>(&bytes), bytes);
        let decoded = EventRequest::decode(&bytes).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.consumer(), "0123456789012345678901234567890");
        assert_eq!(decoded.event_flags, 0b11);
    }

    #[test]
    fn event_data_round_trip() {
        let event = EventData {
            timestamp: 1_234_567_890,
            id: EventType::FallingEdge as u32,
        };
        let bytes = event.encode();
        assert_eq!(bytes.len(), EventData::SIZE);
        assert_eq!(reencode::<EventData>(&bytes), bytes);
        assert_eq!(EventData::decode(&bytes), Some(event));
        assert_eq!(event.event_type(), Some(EventType::FallingEdge));
        assert_eq!(EventData { timestamp: 0, id: 9 }.event_type(), None);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(EventData::decode(&[0; 3]).is_none());
        assert!(LineInfo::decode(&vec![0; LineInfo::SIZE + 1]).is_none());
    }

    #[test]
    fn flag_bits_match_kernel_values() {
        assert_eq!(LineFlags::KERNEL, LineFlags::REQUESTED);
        assert_eq!(LineFlags::BIAS_DISABLE.bits(), 0x80);
        assert_eq!(HandleFlags::OPEN_SOURCE.bits(), 0x10);
        assert_eq!(EventFlags::BOTH_EDGES.bits(), 0x03);
        assert_eq!(LineChangeType::try_from(3u32), Ok(LineChangeType::Reconfigured));
        assert_eq!(LineChangeType::try_from(0u32), Err(0));
    }
}
