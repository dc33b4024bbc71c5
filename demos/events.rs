// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Print edge events on an input line.

use std::time::Duration;

use gpio_uapi::{Chip, EventFlags, EventRequest, HandleFlags, StreamConfig};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: String,
    /// The offset of the GPIO line for the provided chip
    line: u32,
    /// Read one event per read, as pre-5.7 kernels hand them out
    #[structopt(long)]
    single: bool,
    /// Seconds to wait for each batch of events
    #[structopt(long, default_value = "5")]
    timeout: u64,
}

fn do_main(args: Cli) -> anyhow::Result<()> {
    let chip = Chip::new(args.chip)?;
    let mut request = EventRequest::new(
        args.line,
        HandleFlags::INPUT,
        EventFlags::BOTH_EDGES,
        "gpioevents",
    );
    let mut events = chip.request_events(&mut request)?;
    if args.single {
        events.set_stream_config(StreamConfig::records_per_read(1));
    }

    loop {
        let batch = events.read_events(Duration::from_secs(args.timeout))?;
        if batch.is_empty() {
            println!("Timeout");
            continue;
        }
        for event in batch {
            println!("[{}] {}", events.offset(), event);
        }
    }
}

fn main() -> anyhow::Result<()> {
    do_main(Cli::from_args())
}
