use std::path::Path;

use anyhow::Context;

use crate::model::series::TimeSeries;

/// Write `series` as CSV: a `day` column followed by one column per compartment.
pub fn write_series_csv<W: std::io::Write>(writer: W, series: &TimeSeries) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["day".to_string()];
    header.extend(series.compartments().iter().map(|c| c.label().to_string()));
    wtr.write_record(&header)?;

    for day in 0..series.days() {
        let mut record = vec![day.to_string()];
        record.extend(series.rows().iter().map(|row| format!("{:.6}", row[day])));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_series_csv(path: &Path, series: &TimeSeries) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create series CSV: {}", path.display()))?;
    write_series_csv(file, series).with_context(|| format!("Failed to write series CSV: {}", path.display()))
}
