use anyhow::{bail, Result};
use grid_dashboard::{
    loader, observability,
    report::{forecast_table_text, write_forecast_report},
    session::{DashboardSession, SessionParams},
};
use std::{env, path::PathBuf, sync::Arc};

fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        bail!("usage: forecast_report <csv_path> [horizon_days] [output_path]");
    }
    let csv_path = &args[1];

    let horizon_days = match args.get(2) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(h) => Some(h),
            Err(_) => bail!("horizon_days must be a positive integer, got '{raw}'"),
        },
        None => None,
    };
    let output = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("forecast_report.pdf"));

    let table = loader::load_readings(csv_path)?;

    // Full date span, Grid-only, as the dashboard opens.
    let session = DashboardSession::new(
        Arc::new(table),
        SessionParams {
            horizon_days,
            ..Default::default()
        },
    )?;
    let points = session.forecast()?;

    println!("{}", forecast_table_text(&points));
    write_forecast_report(&output, &points)?;

    Ok(())
}
