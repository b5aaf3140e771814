use episim::{Compartment, Event, ModelParams, SirConfig, SirModel, SirState};

fn main() -> anyhow::Result<()> {
    let population = 1_000_000.0;

    let mut model = SirModel::new(SirConfig {
        params: ModelParams { population, days: 365, contact_rate: 0.25, recovery_rate: 0.1 },
        initial: SirState { s: population - 1.0, i: 1.0, r: 0.0 },
    })?;

    let base = model.get_data()?;

    // Lockdown on day 60 holds R at 0.8; a partial reopening on day 150 raises it by half.
    model.add_events(vec![
        Event::set_effective_r(60, 0.8),
        Event::new(150, |r| r * 1.5),
    ])?;
    let lockdown = model.get_data()?;

    let base_i = base.get(Compartment::Infected).unwrap_or(&[]);
    let lockdown_i = lockdown.get(Compartment::Infected).unwrap_or(&[]);

    println!("day,I_base,I_lockdown");
    for (day, (b, l)) in base_i.iter().zip(lockdown_i).enumerate() {
        if day % 7 != 0 {
            continue;
        }
        println!("{},{:.0},{:.0}", day, b, l);
    }

    Ok(())
}
