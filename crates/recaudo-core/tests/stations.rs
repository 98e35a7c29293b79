use polars::df;
use polars::prelude::*;

use recaudo_core::geometry::decode_point;
use recaudo_core::stations::clean_stations;

fn raw_stations(
    codes: &[&str],
    names: &[&str],
    latitudes: &[Option<f64>],
    longitudes: &[Option<f64>],
) -> DataFrame {
    let ids: Vec<String> = (0..codes.len()).map(|i| format!("{}", 100 + i)).collect();
    df![
        "idestacion" => ids,
        "recaudoestacion" => codes.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "nombreestacion" => names.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "idlinea" => vec![1i64; codes.len()],
        "latitud" => latitudes.to_vec(),
        "longitud" => longitudes.to_vec(),
    ]
    .unwrap()
}

#[test]
fn sentinel_codes_are_dropped() -> PolarsResult<()> {
    let raw = raw_stations(
        &["07000", "", "0", "00000", "01234", "06112", "22000", "12345", "04000"],
        &["A", "B", "C", "D", "E", "F", "G", "H", "I"],
        &[Some(4.6); 9],
        &[Some(-74.1); 9],
    );

    let cleaned = clean_stations(&raw).unwrap();

    assert_eq!(cleaned.height(), 2);
    let codes = cleaned.column("recaudoestacion")?.str()?;
    assert_eq!(codes.get(0), Some("07000"));
    assert_eq!(codes.get(1), Some("04000"));
    Ok(())
}

#[test]
fn override_patches_literal_coordinates() -> PolarsResult<()> {
    let raw = raw_stations(
        &["14005", "07000"],
        &["(14005) Las Aguas", "Calle 100"],
        &[None, Some(4.683)],
        &[None, Some(-74.056)],
    );

    let cleaned = clean_stations(&raw).unwrap();

    let latitudes = cleaned.column("latitud")?.f64()?;
    let longitudes = cleaned.column("longitud")?.f64()?;
    assert_eq!(latitudes.get(0), Some(4.60255));
    assert_eq!(longitudes.get(0), Some(-74.068687));
    // Non-override rows keep their source coordinates.
    assert_eq!(latitudes.get(1), Some(4.683));
    assert_eq!(longitudes.get(1), Some(-74.056));
    Ok(())
}

#[test]
fn override_patches_first_occurrence_only() -> PolarsResult<()> {
    let raw = raw_stations(
        &["40002", "40002"],
        &["Manitas(40002)", "Manitas(40002)"],
        &[Some(0.0), Some(0.0)],
        &[Some(0.0), Some(0.0)],
    );

    let cleaned = clean_stations(&raw).unwrap();

    let latitudes = cleaned.column("latitud")?.f64()?;
    let longitudes = cleaned.column("longitud")?.f64()?;
    assert_eq!(latitudes.get(0), Some(4.550445));
    assert_eq!(longitudes.get(0), Some(-74.150598));
    assert_eq!(latitudes.get(1), Some(0.0));
    assert_eq!(longitudes.get(1), Some(0.0));
    Ok(())
}

#[test]
fn geometry_x_is_longitude() -> PolarsResult<()> {
    let raw = raw_stations(&["07000"], &["Calle 100"], &[Some(4.683)], &[Some(-74.056)]);

    let cleaned = clean_stations(&raw).unwrap();

    let geometry = cleaned.column("geometry")?.str()?;
    let point = decode_point(geometry.get(0).unwrap()).unwrap();
    assert_eq!(point.x(), -74.056);
    assert_eq!(point.y(), 4.683);
    Ok(())
}

#[test]
fn null_coordinates_yield_null_geometry() -> PolarsResult<()> {
    let raw = raw_stations(&["07000"], &["Sin Coordenadas"], &[None], &[Some(-74.056)]);

    let cleaned = clean_stations(&raw).unwrap();

    let geometry = cleaned.column("geometry")?.str()?;
    assert!(geometry.get(0).is_none());
    Ok(())
}

#[test]
fn rerun_is_idempotent() {
    let raw = raw_stations(
        &["07000", "00000", "40002"],
        &["Calle 100", "Placeholder", "Manitas(40002)"],
        &[Some(4.683), Some(0.0), None],
        &[Some(-74.056), Some(0.0), None],
    );

    let once = clean_stations(&raw).unwrap();
    let twice = clean_stations(&once).unwrap();

    assert!(once.equals_missing(&twice));
}
