use episim::io::series_csv::write_series_csv;
use episim::{ModelParams, SeirConfig, SeirModel, SeirState};

fn main() -> anyhow::Result<()> {
    let population = 1_000_000.0;

    let model = SeirModel::new(SeirConfig {
        params: ModelParams {
            population,
            days: 365,
            contact_rate: 1.0 / 4.0,
            recovery_rate: 1.0 / 10.0, // infectious mean 10 days
        },
        incubation_rate: 1.0 / 3.0, // incubation mean 3 days
        initial: SeirState { s: population - 1.0, e: 0.0, i: 1.0, r: 0.0 },
    })?;

    let series = model.get_data()?;
    write_series_csv(std::io::stdout().lock(), &series)?;

    Ok(())
}
