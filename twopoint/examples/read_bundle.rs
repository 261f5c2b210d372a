//! Read a bundle back and inspect its measurements

use twopoint::TwoPointFile;

fn main() -> twopoint::Result<()> {
    let filename = "example_bundle.2pt";

    if !std::path::Path::new(filename).exists() {
        println!("File '{filename}' not found!");
        println!("   Run 'cargo run --example write_bundle' first");
        return Ok(());
    }

    let bundle = TwoPointFile::from_file(filename, None)?;
    println!("Read '{filename}':");
    println!("   Data points: {}", bundle.n_data_points());
    for m in bundle.measurements() {
        println!("   Measurement '{}' with {} rows", m.name(), m.rows());
    }
    for k in bundle.kernels() {
        println!(
            "   Kernel '{}': {} bins on {} redshifts",
            k.name(),
            k.n_bin(),
            k.n_z()
        );
    }

    let gamma_t = bundle
        .get_measurement("cluster_gamma_t")?
        .as_spectrum()
        .expect("cluster_gamma_t is a spectrum");
    println!(
        "   cluster_gamma_t: {} cluster bins x {} source bins",
        gamma_t.num_bin1(),
        gamma_t.num_bin2()
    );

    // Pull one profile out of the concatenated vector.
    let bin1 = gamma_t.bin1().to_vec();
    let bin2 = gamma_t.bin2().to_vec();
    let profile = gamma_t.select(|i| bin1[i] == 0 && bin2[i] == 1);
    println!(
        "   profile for cluster bin 0, source bin 1: {} rows, first value {:.4e}",
        profile.rows(),
        profile.value()[0]
    );
    Ok(())
}
