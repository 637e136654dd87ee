/*!
Control the appearance of simulation result data

# Working with [`ResultsBuilder`]

Creating a [`ResultsTable`] after running a simulation group:

```
use pool_sim::prelude::*;

let sim = SimulationBuilder::new()
    .pools(2)
    .agents(100)
    .rounds(50)
    .repeat_all(5)
    .occupancy_values([0.75, 0.25])
    .parameter_model(FixedParams::classic_two_pool())
    .seed(118)
    .build()
    .unwrap();

let results = sim
    .run_all()
    .unwrap()
    .average(Average::Median) // Take the median of repeated runs' results
    .counts()                 // Include the final per-pool agent counts
    .format(Format::CSV)      // Output results as CSV
    .build();

println!("{}", results);
```

For custom statistical analysis, extract the raw [`SimulationOutput`] data
with [`ResultsBuilder::data`] instead of building a table; each output holds
the full per-round counts history.
*/

use std::{collections::BTreeSet, fmt::Display, num::NonZeroUsize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    occupancy::Share,
    pool::PoolId,
    simulation::SimulationOutput,
    utils::{wrap, WrapFunc},
};

/// Floating point precision of results data.
pub const FLOAT_PRECISION_DIGITS: usize = 6;

/// Builder for [`ResultsTable`]. Typically produced by running a
/// [`SimulationGroup`](crate::simulation::SimulationGroup).
#[derive(Debug, Clone)]
pub struct ResultsBuilder {
    average: Average,
    columns: BTreeSet<Column>,
    data: Vec<SimulationOutput>,
    format: Format,
    repeated: NonZeroUsize,
}

/// Describes the appearance of a [`ResultsTable`] as given by its
/// [`Display`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub enum Format {
    /// Comma-separated, without extra whitespace.
    CSV,
    /// Human-readable.
    #[default]
    PrettyPrint,
}

impl ResultsBuilder {
    /// Create a new [`ResultsBuilder`].
    pub(crate) fn new(
        data: Vec<SimulationOutput>,
        repeated: NonZeroUsize,
    ) -> Self {
        Self {
            data,
            repeated,
            average: Average::default(),
            columns: BTreeSet::default(),
            format: Format::default(),
        }
    }

    /// Include the "Pool `X` Count", "Pool `X` Share", "Relocations",
    /// "Parameter Model", "Agents", and "Simulated Rounds" columns.
    ///
    /// [`ResultsBuilder::average`] must still be called separately to create
    /// averaged data.
    pub fn all(self) -> Self {
        self.counts()
            .shares()
            .relocations()
            .model_name()
            .num_agents()
            .rounds()
    }

    /// Average the results of repeated simulations based on the given
    /// [`Average`] type. For types other than [`Average::None`], a column
    /// describing the averaging method will be included in the results table.
    pub fn average(mut self, average: Average) -> Self {
        self.average = average;

        self
    }

    /// Include a "Pool `X` Count" column for each pool, holding the final
    /// per-pool agent counts.
    pub fn counts(mut self) -> Self {
        for pool in 0..self.num_pools() {
            self.columns.insert(Column::FinalCount(pool.into()));
        }

        self
    }

    /// Include a "Pool `X` Share" column for each pool, holding the final
    /// per-pool occupancy fractions.
    pub fn shares(mut self) -> Self {
        for pool in 0..self.num_pools() {
            self.columns.insert(Column::FinalShare(pool.into()));
        }

        self
    }

    /// Include the "Relocations" column: the total number of pool switches
    /// made over the course of a run.
    pub fn relocations(mut self) -> Self {
        self.columns.insert(Column::Relocations);

        self
    }

    /// Include the "Parameter Model" column in the results table.
    pub fn model_name(mut self) -> Self {
        self.columns.insert(Column::ModelName);

        self
    }

    /// Include the "Agents" column in the results table.
    pub fn num_agents(mut self) -> Self {
        self.columns.insert(Column::NumAgents);

        self
    }

    /// Include the "Simulated Rounds" column in the results table.
    pub fn rounds(mut self) -> Self {
        self.columns.insert(Column::Rounds);

        self
    }

    /// Include a column with title `title` which only contains the given
    /// value.
    pub fn constant<T>(mut self, title: T, value: f64) -> Self
    where
        T: Into<String>,
    {
        self.columns.insert(Column::Constant(wrap!(title, move |_| value)));

        self
    }

    /// Use pool `pool`'s final share as input to `func`, and present the
    /// output in a table column with the given title.
    pub fn share_func<T, F>(mut self, pool: PoolId, title: T, func: F) -> Self
    where
        T: Into<String>,
        F: Fn(Share) -> f64 + Send + Sync + 'static,
    {
        self.columns.insert(Column::ShareFunc(pool, wrap!(title, func)));

        self
    }

    /// Extract the raw [`SimulationOutput`] data from this
    /// [`ResultsBuilder`]. Useful for running custom statistical analysis.
    ///
    /// # Ordering
    /// Simulations are run in the same order their initial distributions are
    /// specified using
    /// [`SimulationBuilder`](crate::simulation::SimulationBuilder), with
    /// repeated runs being grouped together. The output data from this
    /// method follows this ordering as well.
    pub fn data(self) -> Vec<SimulationOutput> {
        self.data
    }

    /// Specify the [`Format`] of the results table.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;

        self
    }

    /// Create a new [`ResultsTable`].
    pub fn build(self) -> ResultsTable {
        let ResultsBuilder { average, mut columns, data, format, repeated } =
            self;

        let num_pools = data[0].final_counts().len();
        for pool in 0..num_pools {
            columns.insert(Column::InitialShare(pool.into()));
        }

        match average {
            Average::None => (),
            _ => {
                columns.insert(Column::AverageOf(average));
            }
        }

        let columns = Vec::from_iter(columns);
        let rows = match average {
            Average::None => data
                .iter()
                .map(|output| {
                    collect_row(&columns, |col| col.get_value(output))
                })
                .collect(),
            _ => data
                .chunks(repeated.get())
                .map(|outputs| {
                    collect_row(&columns, |col| {
                        col.get_average_value(average, outputs)
                    })
                })
                .collect(),
        };

        ResultsTable { columns, format, rows }
    }

    fn num_pools(&self) -> usize {
        self.data[0].final_counts().len()
    }
}

#[cfg(feature = "rayon")]
fn collect_row<F>(columns: &[Column], get: F) -> Vec<ColumnValue>
where
    F: Fn(&Column) -> ColumnValue + Send + Sync,
{
    columns.par_iter().map(get).collect()
}

#[cfg(not(feature = "rayon"))]
fn collect_row<F>(columns: &[Column], get: F) -> Vec<ColumnValue>
where
    F: Fn(&Column) -> ColumnValue,
{
    columns.iter().map(get).collect()
}

/// Formatted results from the completion of a
/// [`SimulationGroup`](crate::simulation::SimulationGroup). The results
/// table is given by the struct's [`Display`] implementation, as specified
/// by its [`Format`].
pub struct ResultsTable {
    columns: Vec<Column>,
    format: Format,
    rows: Vec<Vec<ColumnValue>>,
}

impl ResultsTable {
    const SEPARATOR_VERTICAL: char = '|';
    const SEPARATOR_HORIZONTAL: char = '-';

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }
}

impl Display for ResultsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let titles: Vec<_> =
            self.columns.iter().map(|col_type| col_type.to_string()).collect();

        match self.format {
            Format::CSV => {
                write!(f, "{}", titles.join(","))?;

                for row in self.rows.iter() {
                    writeln!(f)?;

                    let row: Vec<_> =
                        row.iter().map(|val| val.to_string()).collect();

                    write!(f, "{}", row.join(","))?;
                }
            }
            Format::PrettyPrint => {
                let mut text_widths: Vec<_> =
                    titles.iter().map(|title| title.len()).collect();

                for row in self.rows.iter() {
                    for (i, val) in row.iter().enumerate() {
                        let val = val.to_string();
                        text_widths[i] = text_widths[i].max(val.len());
                    }
                }

                for (i, title) in titles.into_iter().enumerate() {
                    write!(
                        f,
                        " {:1$} {2}",
                        title,
                        text_widths[i],
                        Self::SEPARATOR_VERTICAL
                    )?;
                }
                writeln!(f)?;

                let total_width = text_widths.iter().map(|x| x + 3).sum();
                for _ in 0..total_width {
                    write!(f, "{}", Self::SEPARATOR_HORIZONTAL)?;
                }

                for row in self.rows.iter() {
                    writeln!(f)?;

                    for (i, val) in row.iter().enumerate() {
                        write!(
                            f,
                            " {:1$} {2}",
                            val.to_string(),
                            text_widths[i],
                            Self::SEPARATOR_VERTICAL
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Methods of extracting an average/central value from a set of repeated
/// simulations.
///
/// In the process of creating a results table, the given averaging method is
/// only applied to the values of columns which change from run to run.
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Average {
    #[default]
    /// Include all repeated values.
    None,
    /// Arithmetic mean of all values.
    Mean,
    /// Median of all values.
    Median,
    /// Maximum of all values.
    Max,
    /// Minimum of all values.
    Min,
}

/// Type of column that can appear in a data table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Column {
    // Variant order determines the order of columns in results tables:
    // https://doc.rust-lang.org/stable/std/cmp/trait.PartialOrd.html#derivable
    ModelName,
    InitialShare(PoolId),
    FinalCount(PoolId),
    FinalShare(PoolId),
    ShareFunc(PoolId, WrapFunc<Share, f64>),
    Constant(WrapFunc<(), f64>),
    Relocations,
    NumAgents,
    Rounds,
    AverageOf(Average),
}

/// Value which corresponds to a [`Column`].
#[derive(Debug, Clone)]
enum ColumnValue {
    ModelName(String),
    InitialShare(Share),
    FinalCount(f64),
    FinalShare(f64),
    ShareFunc(f64),
    Constant(f64),
    Relocations(f64),
    NumAgents(usize),
    Rounds(usize),
    AverageOf(usize),
}

impl Column {
    fn get_value(&self, output: &SimulationOutput) -> ColumnValue {
        match &self {
            Self::ModelName => {
                let name = output.model.name();

                ColumnValue::ModelName(name)
            }
            Self::InitialShare(pool) => {
                // Safety: distributions are validated during the build step
                // of the simulation pipeline
                let share = unsafe {
                    output.distribution.share_of_unchecked(
                        *pool,
                        output.final_counts().len(),
                    )
                };

                ColumnValue::InitialShare(share)
            }
            Self::FinalCount(pool) => {
                let count = output.final_counts()[pool.get()] as f64;

                ColumnValue::FinalCount(count)
            }
            Self::FinalShare(pool) => {
                let share = output.final_shares()[pool.get()];

                ColumnValue::FinalShare(share)
            }
            Self::ShareFunc(pool, func) => {
                let value = func.call(output.final_shares()[pool.get()]);

                ColumnValue::ShareFunc(value)
            }
            Self::Constant(func) => {
                let value = func.call(());

                ColumnValue::Constant(value)
            }
            Self::Relocations => {
                let relocations = output.relocations as f64;

                ColumnValue::Relocations(relocations)
            }
            Self::NumAgents => {
                let num_agents = output.num_agents;

                ColumnValue::NumAgents(num_agents)
            }
            Self::Rounds => {
                let rounds = output.rounds;

                ColumnValue::Rounds(rounds)
            }
            Self::AverageOf(_) => unreachable!(
                "never need the single value of the average descriptor column"
            ),
        }
    }

    fn get_average_value(
        &self,
        method: Average,
        data: &[SimulationOutput],
    ) -> ColumnValue {
        match &self {
            Self::AverageOf(_) => return ColumnValue::AverageOf(data.len()),
            Self::ModelName
            | Self::InitialShare(_)
            | Self::Constant(_)
            | Self::NumAgents
            | Self::Rounds => return self.get_value(&data[0]),
            Self::FinalCount(_)
            | Self::FinalShare(_)
            | Self::ShareFunc(_, _)
            | Self::Relocations => (),
        }

        let vls: Vec<_> = match &self {
            Self::FinalCount(pool) => data
                .iter()
                .map(|output| output.final_counts()[pool.get()] as f64)
                .collect(),
            Self::FinalShare(pool) => data
                .iter()
                .map(|output| output.final_shares()[pool.get()])
                .collect(),
            Self::ShareFunc(pool, func) => data
                .iter()
                .map(|output| func.call(output.final_shares()[pool.get()]))
                .collect(),
            Self::Relocations => data
                .iter()
                .map(|output| output.relocations as f64)
                .collect(),
            _ => unreachable!(),
        };

        let avg = match method {
            Average::Mean => vls.into_iter().sum::<f64>() / data.len() as f64,
            Average::Median => crate::utils::median_of_floats(vls),
            Average::Max => vls.into_iter().reduce(|a, b| a.max(b)).unwrap(),
            Average::Min => vls.into_iter().reduce(|a, b| a.min(b)).unwrap(),
            Average::None => unreachable!(),
        };

        match &self {
            Self::FinalCount(_) => ColumnValue::FinalCount(avg),
            Self::FinalShare(_) => ColumnValue::FinalShare(avg),
            Self::ShareFunc(_, _) => ColumnValue::ShareFunc(avg),
            Self::Relocations => ColumnValue::Relocations(avg),
            _ => unreachable!(),
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::ModelName => {
                write!(f, "Parameter Model")
            }
            Self::InitialShare(pool) => {
                write!(f, "Pool {} Initial Share", pool)
            }
            Self::FinalCount(pool) => {
                write!(f, "Pool {} Count", pool)
            }
            Self::FinalShare(pool) => {
                write!(f, "Pool {} Share", pool)
            }
            Self::ShareFunc(_, func) => {
                write!(f, "{}", func.name())
            }
            Self::Constant(func) => {
                write!(f, "{}", func.name())
            }
            Self::Relocations => {
                write!(f, "Relocations")
            }
            Self::NumAgents => {
                write!(f, "Agents")
            }
            Self::Rounds => {
                write!(f, "Simulated Rounds")
            }
            Self::AverageOf(method) => match method {
                Average::Mean => write!(f, "Mean Of"),
                Average::Median => write!(f, "Median Of"),
                Average::Max => write!(f, "Max Of"),
                Average::Min => write!(f, "Min Of"),
                Average::None => unreachable!(),
            },
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::ModelName(name) => {
                write!(f, "{}", name)
            }
            Self::InitialShare(share) => {
                write!(f, "{:.1$}", share, FLOAT_PRECISION_DIGITS)
            }
            Self::FinalCount(count) => {
                write!(f, "{:.1$}", count, FLOAT_PRECISION_DIGITS)
            }
            Self::FinalShare(share) => {
                write!(f, "{:.1$}", share, FLOAT_PRECISION_DIGITS)
            }
            Self::ShareFunc(value) => {
                write!(f, "{:.1$}", value, FLOAT_PRECISION_DIGITS)
            }
            Self::Constant(value) => {
                write!(f, "{:.1$}", value, FLOAT_PRECISION_DIGITS)
            }
            Self::Relocations(relocations) => {
                write!(f, "{:.1$}", relocations, FLOAT_PRECISION_DIGITS)
            }
            Self::NumAgents(num_agents) => {
                write!(f, "{}", num_agents)
            }
            Self::Rounds(rounds) => {
                write!(f, "{}", rounds)
            }
            Self::AverageOf(repeats) => {
                write!(f, "{}", repeats)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{agent::FixedParams, simulation::SimulationBuilder};

    use super::{Average, Format};

    fn small_results() -> crate::results::ResultsBuilder {
        SimulationBuilder::new()
            .pools(2)
            .agents(20)
            .rounds(5)
            .repeat_all(3)
            .occupancy_values([0.5, 0.5])
            .parameter_model(FixedParams::classic_two_pool())
            .seed(42)
            .build()
            .unwrap()
            .run_all()
            .unwrap()
    }

    #[test]
    fn csv_table_has_one_row_per_run() {
        let table =
            small_results().counts().format(Format::CSV).build().to_string();

        // Header plus one row per repeated run.
        assert_eq!(table.lines().count(), 4);
        assert!(table.starts_with("Pool 0 Initial Share"));
        assert!(table.contains("Pool 1 Count"));
    }

    #[test]
    fn averaged_table_collapses_repeats() {
        let table = small_results()
            .average(Average::Mean)
            .counts()
            .format(Format::CSV)
            .build()
            .to_string();

        assert_eq!(table.lines().count(), 2);
        assert!(table.contains("Mean Of"));
    }
}
