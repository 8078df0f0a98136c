use anyhow::Result;

use rsbasin::analysis::basin::{self, PROJECT_ID};
use rsbasin::engine::session::Session;

fn try_main() -> Result<()> {
    let session = Session::connect(PROJECT_ID)?;
    let report = basin::run(&session, std::path::Path::new("."))?;

    println!(
        "Mean river distance to study point (km): {}",
        report.mean_distance_km
    );
    println!(
        "Main rivers as % of total river length: {}",
        report.main_channel_percentage
    );
    println!("Median riparian NDVI: {}", report.median_riparian_ndvi);
    println!("Median upland NDVI: {}", report.median_upland_ndvi);
    println!(
        "Saved charts: {}",
        report
            .charts
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
