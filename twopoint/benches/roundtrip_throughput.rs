use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::tempdir;
use twopoint::{
    CorrelationType, Measurement, NumberDensity, SpectrumMeasurement, TwoPointFile,
};

fn build_bundle(n_rows: usize) -> TwoPointFile {
    let n_z = 300;
    let step = 2.0 / n_z as f64;
    let z_lo: Vec<f64> = (0..n_z).map(|i| i as f64 * step).collect();
    let z_hi: Vec<f64> = (0..n_z).map(|i| (i + 1) as f64 * step).collect();
    let z_mid: Vec<f64> = z_lo.iter().zip(&z_hi).map(|(a, b)| 0.5 * (a + b)).collect();
    let curves: Vec<Vec<f64>> = (0..4)
        .map(|k| z_mid.iter().map(|z| (z * (k + 1) as f64).sin().abs()).collect())
        .collect();
    let nz = NumberDensity::new("nz_source", z_lo, z_mid, z_hi, curves).unwrap();

    let bin1: Vec<i64> = (0..n_rows).map(|i| (i / 16) as i64 % 4).collect();
    let bin2: Vec<i64> = (0..n_rows).map(|i| (i / 4) as i64 % 4).collect();
    let angular: Vec<i64> = (0..n_rows).map(|i| i as i64 % 16).collect();
    let value: Vec<f64> = (0..n_rows).map(|i| 1.0 / (i + 1) as f64).collect();
    let spectrum = SpectrumMeasurement::new(
        "xi_plus",
        (bin1, bin2),
        (
            CorrelationType::GalaxyShearPlusReal,
            CorrelationType::GalaxyShearPlusReal,
        ),
        ("nz_source", "nz_source"),
        "SAMPLE",
        angular,
        value,
    )
    .unwrap();

    TwoPointFile::new(vec![Measurement::from(spectrum)], vec![nz]).unwrap()
}

fn bench_roundtrip(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.2pt");
    let bundle = build_bundle(16_384);

    c.bench_function("write_16k_rows", |b| {
        b.iter(|| bundle.to_file(&path, true).unwrap())
    });

    bundle.to_file(&path, true).unwrap();
    c.bench_function("read_16k_rows", |b| {
        b.iter(|| TwoPointFile::from_file(&path, None).unwrap())
    });
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
