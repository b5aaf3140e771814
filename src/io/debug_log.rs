use anyhow::Context;

use crate::model::series::TimeSeries;
use crate::scenario::{ModelKind, Scenario};

/// Write a plain-text record of one run: scenario metadata, then the series as CSV.
/// Returns the path of the file written (`<out_dir>/run_<run_id>.txt`).
pub fn write_run_log(
    out_dir: impl AsRef<std::path::Path>,
    run_id: &str,
    scenario: &Scenario,
    series: &TimeSeries,
) -> anyhow::Result<std::path::PathBuf> {
    use std::io::Write;

    anyhow::ensure!(
        series.days() == scenario.days as usize,
        "series has {} days, scenario has {}",
        series.days(),
        scenario.days
    );

    std::fs::create_dir_all(out_dir.as_ref()).context("create logs dir failed")?;
    let path = out_dir.as_ref().join(format!("run_{}.txt", run_id));
    let mut f = std::fs::File::create(&path)
        .with_context(|| format!("create run log file failed (path={:?})", path))?;

    let init = scenario.initial_compartments();
    writeln!(f, "run_id={}", run_id)?;
    writeln!(f, "model={:?}", scenario.model)?;
    writeln!(f, "population={:.3}", scenario.population)?;
    writeln!(f, "days={}", scenario.days)?;
    writeln!(f, "contact_rate={:.6}", scenario.contact_rate)?;
    writeln!(f, "recovery_rate={:.6}", scenario.recovery_rate)?;
    if scenario.model == ModelKind::Seir {
        writeln!(f, "incubation_rate={:.6}", scenario.incubation_rate)?;
    }
    writeln!(f, "initial=s:{:.3} e:{:.3} i:{:.3} r:{:.3}", init.s, init.e, init.i, init.r)?;
    writeln!(f, "events={}", scenario.events.len())?;
    for event in &scenario.events {
        writeln!(f, "  day {}: {}", event.day, event.action)?;
    }
    writeln!(f)?;

    let labels: Vec<&str> = series.compartments().iter().map(|c| c.label()).collect();
    writeln!(f, "day,{}", labels.join(","))?;
    for day in 0..series.days() {
        let values: Vec<String> = series.rows().iter().map(|row| format!("{:.3}", row[day])).collect();
        writeln!(f, "{},{}", day, values.join(","))?;
    }

    Ok(path)
}
