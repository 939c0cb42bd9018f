use std::time::Duration;

use mp71077x::{Result, config::SessionConfig, mp71077x::Mp71077x};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Logs a rejected write and carries on; any other failure aborts.
fn expect_rejected(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_verification() => {
            warn!("{e}");
            Ok(())
        }
        Err(e) => Err(e),
        Ok(()) => {
            warn!("Out of range write was accepted");
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = SessionConfig::from_env()?.with_verbosity(true);
    let mut load = Mp71077x::new(config);
    load.open().await?;

    load.voltage().set_upper_limit(30.0, false).await?;
    load.current().set_upper_limit(30.0, false).await?;

    expect_rejected(load.current().set_value(40.0, true).await)?;
    load.current().set_upper_limit(40.0, false).await?;
    load.current().set_value(40.0, true).await?;

    sleep(Duration::from_secs(1)).await;

    expect_rejected(load.voltage().set_value(40.0, true).await)?;
    load.voltage().set_upper_limit(150.0, false).await?;
    load.voltage().set_value(150.0, true).await?;

    sleep(Duration::from_secs(1)).await;

    load.power().set_upper_limit(25.0, false).await?;
    expect_rejected(load.power().set_value(35.0, true).await)?;
    load.power().set_upper_limit(300.0, false).await?;
    load.power().set_value(300.0, true).await?;

    sleep(Duration::from_secs(1)).await;

    load.resistance().set_upper_limit(133.0, false).await?;
    expect_rejected(load.resistance().set_value(500.0, true).await)?;
    load.resistance().set_upper_limit(7500.0, false).await?;
    load.resistance().set_value(7500.0, true).await?;

    load.turn_input_on(true).await?;
    sleep(Duration::from_secs(2)).await;
    load.turn_input_off(true).await?;

    info!("Voltage limits {:?}", load.voltage().get_limits().await?);
    info!("Current limits {:?}", load.current().get_limits().await?);
    info!("Power limits {:?}", load.power().get_limits().await?);
    info!("Resistance limits {:?}", load.resistance().get_limits().await?);

    load.close();

    Ok(())
}
