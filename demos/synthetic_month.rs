use chrono::{Duration, TimeZone, Utc};
use fogverify::{
    FeatureVector, FogVerifier, FogVerifyError, GridFields, GridGeometry, GridLoader,
    GridSourceFile, LoadError, ModelError, ObservationSample, ObservationSet, Station,
    VerificationConfig, ALL_COMBINED,
};
use std::sync::Arc;

/// Generates a 20×20 grid over the Dutch coast with a fog patch that drifts east during
/// the first days of the month.
struct SyntheticLoader;

impl GridLoader for SyntheticLoader {
    fn load(&self, source: &GridSourceFile) -> Result<GridFields, LoadError> {
        let lats: Vec<f64> = (0..20).map(|i| 51.5 + i as f64 * 0.05).collect();
        let lons: Vec<f64> = (0..20).map(|j| 3.5 + j as f64 * 0.05).collect();
        let geometry = GridGeometry::from_axes(&lats, &lons)?;

        let start = Utc
            .with_ymd_and_hms(source.period.year(), source.period.month(), 1, 0, 0, 0)
            .single()
            .ok_or("invalid month")?;
        let times: Vec<_> = (0..24 * 7).map(|h| start + Duration::hours(h)).collect();

        let cells = geometry.len();
        let mut rh = Vec::with_capacity(times.len() * cells);
        for (t, _) in times.iter().enumerate() {
            let fog_col = (t / 6) % 20;
            for cell in 0..cells {
                let col = cell % 20;
                rh.push(if col.abs_diff(fog_col) <= 2 { 99.5 } else { 70.0 });
            }
        }
        let n = rh.len();
        Ok(GridFields::builder()
            .geometry(geometry)
            .times(times)
            .relative_humidity(rh)
            .specific_humidity(vec![0.008; n])
            .u_wind(vec![1.5; n])
            .v_wind(vec![-0.5; n])
            .w_wind(vec![0.0; n])
            .build()?)
    }
}

#[tokio::main]
async fn main() -> Result<(), FogVerifyError> {
    let stations = vec![
        Station::new("DEN HELDER", 52.0, 3.8),
        Station::new("SCHIPHOL", 52.3, 4.76),
        Station::new("OFFSHORE", 53.5, 3.0),
    ];

    let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
    let mut observations = Vec::new();
    for station in &stations {
        for step in 0..(24 * 7 * 3) {
            let time = start + Duration::minutes(step * 20 + 5);
            let foggy = (step / 18) % 20 < 3;
            observations.push(ObservationSample {
                station: station.name.clone(),
                time,
                visibility_m: if foggy { 400.0 } else { 8000.0 },
            });
        }
    }

    let model = Arc::new(|batch: &[FeatureVector]| {
        Ok::<_, ModelError>(
            batch
                .iter()
                .map(|f| if f[0] > 99.0 { 2e-4 } else { 0.0 })
                .collect(),
        )
    });

    let verifier = FogVerifier::builder()
        .config(VerificationConfig::builder().search_radius_km(5.0).build())
        .stations(stations)
        .observations(ObservationSet::from_samples(observations))
        .model(model)
        .build()?;

    let sources = vec![GridSourceFile {
        period: fogverify::Month::new(1, 2019),
        path: "January-2019.nc".into(),
    }];
    let run = verifier.verify_sources(Arc::new(SyntheticLoader), sources).await?;

    for (month, table) in &run.report.monthly {
        println!("{}", month.file_stem());
        for row in &table.rows {
            let marker = if row.station == ALL_COMBINED { "=" } else { " " };
            println!(
                "{} {:<14} TP={:<3} FP={:<3} FN={:<3} TN={:<3} POD={:6.2} FAR={:6.2} CSI={:6.2}",
                marker,
                row.station,
                row.matrix.tp,
                row.matrix.fp,
                row.matrix.fn_,
                row.matrix.tn,
                row.scores.pod,
                row.scores.far,
                row.scores.csi
            );
        }
    }

    let out_dir = std::env::temp_dir().join("fogverify-demo");
    let written = run.write_tables(&out_dir)?;
    println!("Wrote {} tables to {}", written.len(), out_dir.display());
    Ok(())
}
