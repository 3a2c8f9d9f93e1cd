use crate::output::{print_json, print_table};
use anyhow::Context;
use fanout_core::config::Config;
use fanout_core::{Orchestrator, ResultRecord};
use std::time::Instant;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchOutput<'a> {
    task_count: usize,
    failed: usize,
    elapsed_ms: u64,
    records: &'a [ResultRecord],
}

/// Run one batch in-process and print its records.
pub fn run(config: &Config, count: Option<i64>, json: bool) -> anyhow::Result<()> {
    let requested = count.unwrap_or(config.tasks.default_count as i64);
    let task_count = config.tasks.check_count(requested)?;
    let orchestrator =
        Orchestrator::from_config(config).context("failed to build orchestrator")?;

    let rt = tokio::runtime::Runtime::new()?;
    let started = Instant::now();
    let records = rt.block_on(orchestrator.run_all(task_count))?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let failed = records.iter().filter(|r| r.is_error()).count();

    if json {
        return print_json(&BatchOutput {
            task_count,
            failed,
            elapsed_ms,
            records: &records,
        });
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.index().to_string(),
                r.identity().to_string(),
                r.timestamp().to_string(),
            ]
        })
        .collect();
    print_table(&["INDEX", "IDENTITY", "TIMESTAMP"], &rows);
    println!();
    println!("{task_count} tasks in {elapsed_ms} ms ({failed} failed)");
    Ok(())
}
