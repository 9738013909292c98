use daikin_dsiot::{DaikinClient, MessageLogMode, DEFAULT_SCAN_INTERVAL};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> daikin_dsiot::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let ip = args.get(1).expect("usage: monitor <ip> [--log <path>]");
    let log_path = args
        .iter()
        .position(|a| a == "--log")
        .and_then(|i| args.get(i + 1));

    let mut builder = DaikinClient::builder(ip)
        .on_event(|event| {
            println!("{event:?}");
        })
        .on_snapshot(|state| {
            println!(
                "{} | fan: {} | swing: {} | indoor: {} | target: {} | outdoor: {} | humidity: {}%",
                state.hvac_mode.as_str(),
                state.fan_mode.label(),
                state.swing_mode.as_str(),
                fmt_temp(state.current_temperature),
                fmt_temp(state.target_temperature),
                fmt_temp(state.outside_temperature),
                state.humidity.map(|h| h.to_string()).unwrap_or_else(|| "-".into()),
            );
        });

    if let Some(path) = log_path {
        builder = builder.message_log(MessageLogMode::Diffed, path);
    }

    let mut client = builder.build()?;

    println!("Connecting to {ip}...");
    let mac = client.identify().await?;
    println!("Unit {mac}. Polling every {}s...", DEFAULT_SCAN_INTERVAL.as_secs());

    loop {
        if let Err(e) = client.refresh().await {
            eprintln!("Refresh error: {e}");
            tokio::time::sleep(Duration::from_secs(5)).await;
            continue;
        }
        tokio::time::sleep(DEFAULT_SCAN_INTERVAL).await;
    }
}

fn fmt_temp(t: Option<daikin_dsiot::Temperature>) -> String {
    t.map(|t| t.to_string()).unwrap_or_else(|| "-".into())
}
