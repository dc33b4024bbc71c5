// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use futures::stream::StreamExt;
use gpio_uapi::{AsyncLineEventHandle, Chip, EventFlags, EventRequest, HandleFlags};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: String,
    /// The offset of the GPIO line for the provided chip
    line: u32,
}

async fn do_main(args: Cli) -> std::result::Result<(), gpio_uapi::Error> {
    let chip = Chip::new(args.chip)?;
    let mut request = EventRequest::new(
        args.line,
        HandleFlags::INPUT,
        EventFlags::BOTH_EDGES,
        "gpioevents",
    );
    let mut events = AsyncLineEventHandle::new(chip.request_events(&mut request)?)?;

    while let Some(event) = events.next().await {
        println!("{}", event?);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Cli::from_args();
    do_main(args).await.unwrap();
}
