// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Print chip info and the info of every line, like lsgpio.

use gpio_uapi::{Chip, LineFlags};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: String,
}

fn do_main(args: Cli) -> anyhow::Result<()> {
    let chip = Chip::new(args.chip)?;
    let info = chip.info()?;
    println!(
        "GPIO chip: {}, \"{}\", {} GPIO Lines",
        info.name(),
        info.label(),
        info.num_lines()
    );

    for offset in 0..info.num_lines() {
        let line = chip.line_info(offset)?;
        let flags = line.flags();
        let mut usage = vec![];
        if flags.contains(LineFlags::REQUESTED) {
            usage.push("used");
        }
        if flags.contains(LineFlags::IS_OUT) {
            usage.push("output");
        }
        if flags.contains(LineFlags::ACTIVE_LOW) {
            usage.push("active-low");
        }
        if flags.contains(LineFlags::OPEN_DRAIN) {
            usage.push("open-drain");
        }
        if flags.contains(LineFlags::OPEN_SOURCE) {
            usage.push("open-source");
        }

        let name = line.name();
        let consumer = line.consumer();
        println!(
            "\tline {lineno:>3}: {name} {consumer} [{usage}]",
            lineno = offset,
            name = if name.is_empty() { "unnamed" } else { &*name },
            consumer = if consumer.is_empty() { "unused" } else { &*consumer },
            usage = usage.join(" "),
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    do_main(Cli::from_args())
}
