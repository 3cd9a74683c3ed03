//! Run one hypothesis through the research gate, end to end.
//!
//! Configuration comes from the environment (see `EngineConfig::from_env`);
//! the hypothesis comes from argv. `DATA_SOURCE=http` switches from the
//! seeded synthetic provider to the klines REST provider.

use anyhow::{bail, Result};

use factfin::config::EngineConfig;
use factfin::logging::{self, obj, v_str, Domain, Level};
use factfin::market::{HttpMarketData, MarketDataProvider, SyntheticMarketData};
use factfin::signals::FileSignals;
use factfin::workflow::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = EngineConfig::from_env();
    let hypothesis = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if hypothesis.trim().is_empty() {
        bail!("usage: factfin <hypothesis text>");
    }

    let provider: Box<dyn MarketDataProvider> =
        match std::env::var("DATA_SOURCE").as_deref() {
            Ok("http") => Box::new(HttpMarketData::new(&cfg.data_base_url)),
            _ => Box::new(SyntheticMarketData::new(cfg.data_seed)),
        };
    let signals = FileSignals::new(&cfg.pause_flag, &cfg.approval_flag);

    logging::log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("symbol", v_str(&cfg.symbol)),
            ("interval", v_str(&cfg.interval)),
            ("hypothesis", v_str(&hypothesis)),
        ]),
    );

    let max_retries = cfg.max_retries;
    let mut engine = Engine::new(cfg, provider, Box::new(signals))?;

    match engine.run(&hypothesis, max_retries).await {
        Ok(state) => {
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
        Err(failure) => {
            eprintln!("run failed: {}", failure.reason);
            std::process::exit(1);
        }
    }
}
