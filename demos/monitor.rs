use std::env;

use poolmath::{Config, Event, PoolIdentity, PoolMathClient, PoolMonitor, ShareResolver};

#[tokio::main]
async fn main() -> poolmath::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let identity = match (args.get(1), args.get(2)) {
        (Some(user), Some(pool)) => PoolIdentity::new(user.as_str(), pool.as_str())?,
        (Some(share_url), None) => ShareResolver::new().resolve(share_url).await?,
        _ => {
            eprintln!("usage: monitor <share-url> | monitor <user-id> <pool-id>");
            std::process::exit(2);
        }
    };

    let config = Config::new(identity);
    config.log_config();

    let client = PoolMathClient::builder(config.identity.clone())
        .timeout(config.timeout)
        .build()?;
    let unit = config.temperature_unit;
    let mut monitor = PoolMonitor::new(client)
        .target_profile(config.target_profile.clone())
        .name(config.name.clone())
        .on_event(|event| match event {
            Event::EnteredOutOfRange { key, value, min, max } => {
                println!("!! {key} = {value} is outside {min}..{max}");
            }
            Event::ReturnedInRange { key, value, .. } => {
                println!("ok {key} = {value} is back in range");
            }
        })
        .on_snapshot(move |snapshot| {
            println!("[{}]", snapshot.pool_name);
            for m in &snapshot.measurements {
                let flag = match m.in_range {
                    Some(true) => "",
                    Some(false) => " (out of range)",
                    None => " (no target)",
                };
                let value = if m.key == "waterTemp" {
                    format!("{:.1}{}", unit.convert_fahrenheit(m.value), unit.as_str())
                } else {
                    m.value.to_string()
                };
                println!("  {:<14} {value}{flag}", m.key);
            }
        });

    let mut interval = tokio::time::interval(config.poll_interval);
    loop {
        interval.tick().await;
        if let Err(e) = monitor.poll().await {
            eprintln!("Poll error ({:?}): {e}", e.kind());
        }
    }
}
