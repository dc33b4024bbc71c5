// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Drive an output line through a number of toggles, reading each value back.

use std::thread::sleep;
use std::time::Duration;

use gpio_uapi::{Chip, HandleFlags, HandleRequest};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: String,
    /// The offset of the GPIO line for the provided chip
    line: u32,
    /// Number of toggles
    #[structopt(long, default_value = "3")]
    count: u32,
    /// Period in milliseconds
    #[structopt(long, default_value = "500")]
    period: u64,
    /// Treat the line as active low
    #[structopt(long)]
    active_low: bool,
}

fn do_main(args: Cli) -> anyhow::Result<()> {
    let chip = Chip::new(args.chip)?;
    let mut flags = HandleFlags::OUTPUT;
    if args.active_low {
        flags |= HandleFlags::ACTIVE_LOW;
    }

    // The handle must stay alive for as long as the line is driven.
    let mut request = HandleRequest::new(&[args.line], flags, &[0], "toggle")?;
    let handle = chip.request_lines(&mut request)?;

    let mut value = 0;
    for _ in 0..args.count {
        value ^= 1;
        handle.set_value(value)?;
        println!("set {} read back {}", value, handle.get_value()?);
        sleep(Duration::from_millis(args.period));
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    do_main(Cli::from_args())
}
