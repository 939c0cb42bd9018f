use std::time::Duration;

use mp71077x::{
    Error, Result,
    config::SessionConfig,
    mp71077x::Mp71077x,
    sweep::{SweepPlan, run_sweep},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key}=`{value}`: {e}"))),
        Err(_) => Ok(default),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let plan = SweepPlan {
        start: env_or("SWEEP_START_A", 0.0)?,
        end: env_or("SWEEP_END_A", 1.0)?,
        step: env_or("SWEEP_STEP_A", 0.05)?,
        delay: Duration::from_millis(env_or("SWEEP_DELAY_MS", 500)?),
    };

    let mut load = Mp71077x::new(SessionConfig::from_env()?);
    load.open().await?;

    let result = run_sweep(&mut load, &plan).await;
    load.close();
    info!("Connection closed");
    let points = result?;

    println!(
        "{:<12} | {:<12} | {:<12} | {:<12}",
        "Current (A)", "Voltage (V)", "Power (W)", "Resistance (Ω)"
    );
    for point in &points {
        println!(
            "{:<12.3} | {:<12.3} | {:<12.3} | {:<12.3}",
            point.current,
            point.voltage,
            point.power(),
            point.resistance()
        );
    }

    Ok(())
}
