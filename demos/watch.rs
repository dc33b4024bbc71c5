// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Report requests, releases and reconfigurations of lines.

use std::time::Duration;

use gpio_uapi::{Chip, LineChangeType};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: String,
    /// The offsets of the GPIO lines to watch
    lines: Vec<u32>,
    /// Give up after this many seconds without a change
    #[structopt(long, default_value = "10")]
    idle: u64,
}

fn do_main(args: Cli) -> anyhow::Result<()> {
    let mut chip = Chip::new(args.chip)?;
    for &offset in &args.lines {
        let info = chip.watch_line_info(offset)?;
        println!("[{}] watching, consumer {:?}", offset, info.consumer());
    }

    while let Some(change) = chip.read_line_info_changed(Duration::from_secs(args.idle))? {
        let what = match change.change_type() {
            Some(LineChangeType::Requested) => "requested",
            Some(LineChangeType::Released) => "released",
            Some(LineChangeType::Reconfigured) => "reconfigured",
            None => "changed",
        };
        println!(
            "[{}] {} {} by {:?}",
            change.info().offset(),
            change.timestamp(),
            what,
            change.info().consumer()
        );
    }
    println!("No changes for {}s", args.idle);

    Ok(())
}

fn main() -> anyhow::Result<()> {
    do_main(Cli::from_args())
}
