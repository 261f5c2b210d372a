//! Write a mock cluster-lensing bundle to a .2pt file

use rand::{rngs::StdRng, Rng, SeedableRng};
use twopoint::{
    ColumnData, CorrelationType, CountMeasurement, Measurement, NumberDensity,
    SpectrumMeasurement, TwoPointFile,
};

fn main() -> twopoint::Result<()> {
    let mut rng = StdRng::seed_from_u64(7);

    // Redshift grid: 199 bins on [0, 2].
    let n_z = 199;
    let step = 2.0 / n_z as f64;
    let z_lo: Vec<f64> = (0..n_z).map(|i| i as f64 * step).collect();
    let z_hi: Vec<f64> = (0..n_z).map(|i| (i + 1) as f64 * step).collect();
    let z_mid: Vec<f64> = z_lo.iter().zip(&z_hi).map(|(a, b)| 0.5 * (a + b)).collect();

    let gauss = |mu: f64, sigma: f64| -> Vec<f64> {
        z_mid
            .iter()
            .map(|z| (-((z - mu) * (z - mu)) / (2.0 * sigma * sigma)).exp())
            .collect()
    };

    let n_cluster_bin = 6;
    let n_source_bin = 2;
    let cluster_curves: Vec<Vec<f64>> =
        (0..n_cluster_bin).map(|k| gauss(if k < 3 { 0.1 } else { 0.3 }, 0.03)).collect();
    let nz_cluster =
        NumberDensity::new("nz_cluster", z_lo.clone(), z_mid.clone(), z_hi.clone(), cluster_curves)?;
    let nz_source =
        NumberDensity::new("nz_source", z_lo, z_mid.clone(), z_hi, vec![gauss(0.5, 0.2), gauss(0.9, 0.3)])?;

    // Counts per (cluster z bin, richness bin).
    let mut zcl_bin = Vec::new();
    let mut lambda_bin = Vec::new();
    let mut z_lims = Vec::new();
    let mut lambda_lims = Vec::new();
    let zbin_edges = [0.15, 0.3, 0.5];
    let lambda_edges = [5.0, 20.0, 50.0, 100.0];
    for zcl in 0..2usize {
        for lam in 0..3usize {
            zcl_bin.push(zcl as i64);
            lambda_bin.push(lam as i64);
            z_lims.push((zbin_edges[zcl], zbin_edges[zcl + 1]));
            lambda_lims.push((lambda_edges[lam], lambda_edges[lam + 1]));
        }
    }
    let count_vals: Vec<f64> = (0..n_cluster_bin).map(|_| rng.gen_range(10.0..100.0)).collect();
    let counts = CountMeasurement::new(
        "cluster_counts",
        "nz_cluster",
        count_vals,
        zcl_bin,
        lambda_bin,
        z_lims,
        lambda_lims,
    )?;

    // Tangential shear for every (cluster bin, source bin) pair.
    let n_theta = 10;
    let theta: Vec<f64> = (0..n_theta)
        .map(|i| {
            let frac = (i as f64 + 0.5) / n_theta as f64;
            (2.5f64.ln() + frac * (25.0f64.ln() - 2.5f64.ln())).exp()
        })
        .collect();
    let mut bin1 = Vec::new();
    let mut bin2 = Vec::new();
    let mut angular = Vec::new();
    let mut angle = Vec::new();
    let mut value = Vec::new();
    let mut zcl_col = Vec::new();
    for cl in 0..n_cluster_bin {
        for src in 0..n_source_bin {
            for (a, &t) in theta.iter().enumerate() {
                bin1.push(cl as i64);
                bin2.push(src as i64);
                angular.push(a as i64);
                angle.push(t);
                value.push(0.03 / t * (cl + 1) as f64 * (src + 1) as f64);
                zcl_col.push((cl / 3) as i64);
            }
        }
    }
    let gamma_t = SpectrumMeasurement::new(
        "cluster_gamma_t",
        (bin1, bin2),
        (
            CorrelationType::GalaxyPositionReal,
            CorrelationType::GalaxyShearPlusReal,
        ),
        ("nz_cluster", "nz_source"),
        "SAMPLE",
        angular,
        value,
    )?
    .with_angle(angle, "arcmin")?
    .with_extra_col("zcl_bin", ColumnData::from(zcl_col))?;

    let bundle = TwoPointFile::new(
        vec![Measurement::from(gamma_t), Measurement::from(counts)],
        vec![nz_cluster, nz_source],
    )?;

    let filename = "example_bundle.2pt";
    bundle.to_file(filename, true)?;
    println!(
        "Wrote {} measurements and {} kernels to '{filename}'",
        bundle.measurements().len(),
        bundle.kernels().len()
    );
    println!("Run 'cargo run --example read_bundle' to read it back!");
    Ok(())
}
