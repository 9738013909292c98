use daikin_dsiot::{DaikinClient, FanMode, HvacMode, SwingMode, Temperature};
use std::env;

const USAGE: &str = "usage: control <ip> <mode|fan|swing|temp|on|off> [value]

  mode  off|heat|cool|auto|dry|fan_only
  fan   Quiet|Auto|\"Level 1\"..\"Level 5\"
  swing off|vertical|horizontal|both
  temp  celsius, e.g. 22.5";

#[tokio::main]
async fn main() -> daikin_dsiot::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let (Some(ip), Some(command)) = (args.get(1), args.get(2)) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let value = args.get(3).map(String::as_str).unwrap_or("");

    let mut client = DaikinClient::builder(ip).build()?;
    client.refresh().await?;
    println!("Before: {:?}", client.state());

    match command.as_str() {
        "on" => client.turn_on().await?,
        "off" => client.turn_off().await?,
        "mode" => client.set_hvac_mode(parse_or_exit(HvacMode::parse(value))).await?,
        "fan" => client.set_fan_mode(parse_or_exit(FanMode::from_label(value))).await?,
        "swing" => client.set_swing_mode(parse_or_exit(SwingMode::parse(value))).await?,
        "temp" => {
            let celsius: f64 = parse_or_exit(value.parse().ok());
            client.set_temperature(Temperature::from_celsius(celsius)).await?
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    println!("After:  {:?}", client.state());
    Ok(())
}

fn parse_or_exit<T>(parsed: Option<T>) -> T {
    parsed.unwrap_or_else(|| {
        eprintln!("{USAGE}");
        std::process::exit(2);
    })
}
