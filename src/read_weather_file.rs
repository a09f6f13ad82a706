use crate::external_conditions::WeatherSeries;
use anyhow::{anyhow, Context};
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;

const COLUMN_AIR_TEMP: &str = "temperature"; // dry bulb temp in degrees
const COLUMN_IRRADIANCE: &str = "irradiance"; // global horizontal irradiance in kW/m2

/// Read an hourly weather CSV with `temperature` and `irradiance` header columns.
pub fn weather_data_to_series(file: impl Read) -> anyhow::Result<WeatherSeries> {
    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("Weather file is missing the '{name}' column"))
    };
    let air_temp_idx = column(COLUMN_AIR_TEMP)?;
    let irradiance_idx = column(COLUMN_IRRADIANCE)?;

    let mut air_temperatures = vec![];
    let mut irradiance = vec![];

    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Could not read weather row {i}"))?;
        let field = |idx: usize, name: &str| -> anyhow::Result<f64> {
            record
                .get(idx)
                .ok_or_else(|| anyhow!("Weather row {i} has no {name} value"))?
                .parse::<f64>()
                .with_context(|| format!("Weather row {i} has an unparseable {name} value"))
        };
        air_temperatures.push(field(air_temp_idx, COLUMN_AIR_TEMP)?);
        irradiance.push(field(irradiance_idx, COLUMN_IRRADIANCE)?);
    }

    WeatherSeries::new(air_temperatures, irradiance)
}
