use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::geometry::encode_point;

/// Placeholder `recaudoestacion` values that never identify a real station.
pub const SENTINEL_STATION_CODES: [&str; 7] =
    ["", "0", "00000", "01234", "06112", "22000", "12345"];

/// Stations with missing or corrupted source coordinates, keyed by display
/// name exactly as it appears in `nombreestacion` (the feed uses both the
/// `(code) Name` and `Name(code)` forms). Values are (latitude, longitude).
pub const COORDINATE_OVERRIDES: [(&str, (f64, f64)); 29] = [
    ("(50001) Portal Eldorado[Intermedium]", (4.681520, -74.121143)),
    ("(40000) Cable Portal Tunal", (4.568481, -74.139379)),
    ("(40001) Juan Pablo II", (4.555476, -74.147523)),
    ("(40002) Manitas", (4.550445, -74.150598)),
    ("(40003) Mirador del Paraiso", (4.550019, -74.159009)),
    ("(40004) Bicicletero Mirador del Paraíso", (4.550019, -74.159009)),
    ("(08100) Portal Tunal Cable", (4.568481, -74.139379)),
    ("Cable Portal Tunal(40000)", (4.568481, -74.139379)),
    ("Juan Pablo II(40001)", (4.555476, -74.147523)),
    ("Manitas(40002)", (4.550445, -74.150598)),
    ("Mirador del Paraiso(40003)", (4.550019, -74.159009)),
    ("(14005) Las Aguas", (4.60255, -74.068687)),
    ("Ampliacion San Mateo(57503)", (4.589146, -74.199496)),
    ("Corral Molinos(50003)", (4.556805, -74.121705)),
    ("Corral Avenida Ciudad de Cali(50004)", (4.702865, -74.100733)),
    ("Corral Calle 40 Sur(50002)", (4.575937, -74.119233)),
    ("EL CAMPIN(07106)", (4.645663, -74.078697)),
    ("Corral General Santander(50007)", (4.593200, -74.128343)),
    ("Corral Carrera 77(50006)", (4.698383, -74.094176)),
    ("Centro Comercial Santa Fe(02001)", (4.763741, -74.044402)),
    ("Las Aguas(14005)", (4.60255, -74.068687)),
    ("(50007) Corral General Santander", (4.593200, -74.128343)),
    ("(07106) EL CAMPIN", (4.645663, -74.078697)),
    ("(02001) Centro Comercial Santa Fe", (4.763741, -74.044402)),
    ("(50003) Corral Molinos", (4.556805, -74.121705)),
    ("(50004) Corral Avenida Ciudad de Cali", (4.702865, -74.100733)),
    ("(50002) Corral Calle 40 Sur", (4.575937, -74.119233)),
    ("(57503) Ampliacion San Mateo", (4.589146, -74.199496)),
    ("(50006) Corral Carrera 77", (4.698383, -74.094176)),
];

#[derive(Debug, Error)]
pub enum StationCleanError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Drops placeholder station rows, patches known-bad coordinates from the
/// override table, and attaches a GeoJSON point `geometry` column built from
/// `(longitud, latitud)`.
///
/// A null `recaudoestacion` counts as the empty-string sentinel. Override
/// names absent from the input are skipped silently. If a name is duplicated
/// only the first matching row is patched; later rows keep their source
/// coordinates. Rows with unpatched null coordinates get a null geometry.
pub fn clean_stations(raw: &DataFrame) -> Result<DataFrame, StationCleanError> {
    let codes = raw.column("recaudoestacion")?.str()?;
    let mask: BooleanChunked = (0..raw.height())
        .map(|idx| {
            let code = codes.get(idx).unwrap_or("");
            !SENTINEL_STATION_CODES.contains(&code)
        })
        .collect();
    let mut df = raw.filter(&mask)?;

    let names = df.column("nombreestacion")?.str()?.clone();
    let mut latitudes: Vec<Option<f64>> = df.column("latitud")?.f64()?.into_iter().collect();
    let mut longitudes: Vec<Option<f64>> = df.column("longitud")?.f64()?.into_iter().collect();

    for (name, (latitude, longitude)) in COORDINATE_OVERRIDES {
        if let Some(idx) = (0..df.height()).find(|&idx| names.get(idx) == Some(name)) {
            latitudes[idx] = Some(latitude);
            longitudes[idx] = Some(longitude);
        }
    }

    let geometry: Vec<Option<String>> = latitudes
        .iter()
        .zip(&longitudes)
        .map(|pair| match pair {
            (Some(latitude), Some(longitude)) => Some(encode_point(*longitude, *latitude)),
            _ => None,
        })
        .collect();

    df.with_column(Series::new("latitud".into(), latitudes))?;
    df.with_column(Series::new("longitud".into(), longitudes))?;
    df.with_column(Series::new("geometry".into(), geometry))?;

    debug!(
        input = raw.height(),
        kept = df.height(),
        "dropped sentinel station codes"
    );

    Ok(df)
}
