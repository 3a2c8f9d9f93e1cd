use crate::output::print_json;
use fanout_core::clock::{Clock, SystemClock};
use fanout_core::config::Config;

pub fn run(config: &Config, precise: bool, json: bool) -> anyhow::Result<()> {
    let format = if precise {
        config.time.precise()?
    } else {
        config.time.standard()?
    };
    let snapshot = SystemClock.now(&format);

    if json {
        print_json(&snapshot)
    } else {
        println!("{}  ({} ms since epoch)", snapshot.formatted_time, snapshot.epoch_millis);
        Ok(())
    }
}
