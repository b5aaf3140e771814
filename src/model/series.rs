use serde::Serialize;

use super::Compartment;

/// Output of one run: a row per compartment, a column per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    compartments: Vec<Compartment>,
    rows: Vec<Vec<f64>>,
}

impl TimeSeries {
    /// Build from day-major states (one `Vec` per day).
    pub(crate) fn from_days(compartments: &[Compartment], days: &[Vec<f64>]) -> Self {
        let rows = (0..compartments.len())
            .map(|c| days.iter().map(|state| state[c]).collect())
            .collect();
        Self { compartments: compartments.to_vec(), rows }
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    /// Number of simulated days (columns).
    pub fn days(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, compartment: Compartment) -> Option<&[f64]> {
        let idx = self.compartments.iter().position(|c| *c == compartment)?;
        Some(&self.rows[idx])
    }

    /// State on `day`, in compartment order.
    pub fn day(&self, day: usize) -> Option<Vec<f64>> {
        if day >= self.days() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[day]).collect())
    }

    /// Sum over compartments on `day`.
    pub fn total(&self, day: usize) -> Option<f64> {
        self.day(day).map(|state| state.iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        TimeSeries::from_days(
            &[Compartment::Susceptible, Compartment::Infected, Compartment::Recovered],
            &[vec![9.0, 1.0, 0.0], vec![8.0, 1.5, 0.5]],
        )
    }

    #[test]
    fn transposes_days_into_rows() {
        let s = series();
        assert_eq!(s.days(), 2);
        assert_eq!(s.rows()[0], vec![9.0, 8.0]);
        assert_eq!(s.get(Compartment::Infected), Some(&[1.0, 1.5][..]));
        assert_eq!(s.get(Compartment::Exposed), None);
    }

    #[test]
    fn day_and_total() {
        let s = series();
        assert_eq!(s.day(1), Some(vec![8.0, 1.5, 0.5]));
        assert_eq!(s.total(1), Some(10.0));
        assert_eq!(s.day(2), None);
    }
}
