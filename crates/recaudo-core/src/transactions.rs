use chrono::NaiveDate;
use polars::lazy::dsl::*;
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

const OUTPUT_COLUMNS: [&str; 8] = [
    "idnumerotarjeta",
    "datetime",
    "recaudoestacion",
    "idtipotarjeta",
    "idtipotarifa",
    "saldopreviotransaccion",
    "valor",
    "saldodespues_transaccion",
];

#[derive(Debug, Error)]
pub enum TransactionCleanError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("row {row}: missing packed date or time value")]
    MissingField { row: usize },

    #[error("row {row}: non-numeric {field} component {value:?} in packed date/time")]
    NonNumericComponent {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: date {date:?} / time {time:?} is out of calendar range")]
    OutOfRange {
        row: usize,
        date: String,
        time: String,
    },
}

/// Splits a packed `horatransaccion` value into (hour, minute, second). The
/// feed packs times right-aligned with no leading zeros, so the last two
/// digits are seconds, the two before are minutes, and whatever remains is
/// the hour: a three-digit "530" is 0h 5m 30s, not 5h 30m.
fn split_time(raw: &str) -> (&str, &str, &str) {
    let len = raw.len();
    let hour = &raw[..len.saturating_sub(4)];
    let minute = &raw[len.saturating_sub(4)..len.saturating_sub(2)];
    let second = &raw[len.saturating_sub(2)..];
    (hour, minute, second)
}

/// Splits a packed `fechatransaccion` value into (year, month, day) on the
/// fixed 4/2/2 layout. Short values produce short components, which fail
/// numeric parsing downstream.
fn split_date(raw: &str) -> (&str, &str, &str) {
    (
        clamp_slice(raw, 0, 4),
        clamp_slice(raw, 4, 6),
        clamp_slice(raw, 6, 8),
    )
}

fn clamp_slice(raw: &str, start: usize, end: usize) -> &str {
    let len = raw.len();
    &raw[start.min(len)..end.min(len)]
}

fn parse_component(
    raw: &str,
    row: usize,
    field: &'static str,
) -> Result<u32, TransactionCleanError> {
    raw.parse::<u32>()
        .map_err(|_| TransactionCleanError::NonNumericComponent {
            row,
            field,
            value: raw.to_string(),
        })
}

fn decode_timestamp_micros(
    date_raw: &str,
    time_raw: &str,
    row: usize,
) -> Result<i64, TransactionCleanError> {
    if !date_raw.is_ascii() {
        return Err(TransactionCleanError::NonNumericComponent {
            row,
            field: "date",
            value: date_raw.to_string(),
        });
    }
    if !time_raw.is_ascii() {
        return Err(TransactionCleanError::NonNumericComponent {
            row,
            field: "time",
            value: time_raw.to_string(),
        });
    }

    let (hour, minute, second) = split_time(time_raw);
    let hour = if hour.is_empty() { "0" } else { hour };
    let minute = if minute.is_empty() { "0" } else { minute };
    let (year, month, day) = split_date(date_raw);

    let year = parse_component(year, row, "year")? as i32;
    let month = parse_component(month, row, "month")?;
    let day = parse_component(day, row, "day")?;
    let hour = parse_component(hour, row, "hour")?;
    let minute = parse_component(minute, row, "minute")?;
    let second = parse_component(second, row, "second")?;

    let out_of_range = || TransactionCleanError::OutOfRange {
        row,
        date: date_raw.to_string(),
        time: time_raw.to_string(),
    };

    let datetime = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(out_of_range)?
        .and_hms_opt(hour, minute, second)
        .ok_or_else(out_of_range)?;

    Ok(datetime.and_utc().timestamp_micros())
}

/// Reconstructs a `datetime` column from the packed date and time fields,
/// resolves each transaction's station to its canonical `recaudoestacion`,
/// drops transactions referencing unknown stations, and returns the table
/// stably sorted by (`idnumerotarjeta`, `datetime`) with the eight output
/// columns in fixed order.
///
/// `stations` is any table exposing `idestacion` and `recaudoestacion`,
/// typically the output of [`crate::stations::clean_stations`]. Any packed
/// field that is null, non-numeric, or out of calendar range is a fatal
/// error; no best-effort timestamp is ever produced.
pub fn clean_transactions(
    transactions: &DataFrame,
    stations: &DataFrame,
) -> Result<DataFrame, TransactionCleanError> {
    let times = transactions.column("horatransaccion")?.str()?;
    let dates = transactions.column("fechatransaccion")?.str()?;

    let mut datetimes: Vec<i64> = Vec::with_capacity(transactions.height());
    for row in 0..transactions.height() {
        let (Some(date_raw), Some(time_raw)) = (dates.get(row), times.get(row)) else {
            return Err(TransactionCleanError::MissingField { row });
        };
        datetimes.push(decode_timestamp_micros(date_raw, time_raw, row)?);
    }

    let datetime_series = Series::new("datetime".into(), datetimes)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut data = transactions.clone();
    data.with_column(datetime_series)?;

    let lookup = stations.select(["idestacion", "recaudoestacion"])?;

    let joined = data
        .lazy()
        .join(
            lookup.lazy(),
            [col("idestacion")],
            [col("idestacion")],
            JoinArgs::new(JoinType::Left),
        )
        .filter(col("recaudoestacion").is_not_null())
        .collect()?;

    debug!(
        input = transactions.height(),
        kept = joined.height(),
        "dropped transactions referencing unknown stations"
    );

    let sorted = joined.sort(
        ["idnumerotarjeta", "datetime"],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;

    Ok(sorted.select(OUTPUT_COLUMNS)?)
}

#[cfg(test)]
mod tests {
    use super::{split_date, split_time};

    #[test]
    fn splits_full_and_short_packed_times() {
        assert_eq!(split_time("153045"), ("15", "30", "45"));
        assert_eq!(split_time("93045"), ("9", "30", "45"));
        assert_eq!(split_time("530"), ("", "5", "30"));
        assert_eq!(split_time("45"), ("", "", "45"));
        assert_eq!(split_time("5"), ("", "", "5"));
        assert_eq!(split_time(""), ("", "", ""));
    }

    #[test]
    fn splits_packed_dates_on_fixed_layout() {
        assert_eq!(split_date("20190315"), ("2019", "03", "15"));
        assert_eq!(split_date("2019"), ("2019", "", ""));
    }
}
