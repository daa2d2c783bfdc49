use anyhow::{Context, Result};
use clap::Parser;
use pyano_audio::{AudioError, SamplePlayer};
use pyano_config::{AppConfig, SensorConfig, SensorSource};
use pyano_gesture::Instrument;
use pyano_sensor::{FeedItem, SensorClient};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Gesture-controlled drum kit for armband sensors.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the event feed from this TCP address
    #[arg(long, conflicts_with_all = ["replay", "mock"])]
    connect: Option<String>,

    /// Replay a recorded event feed
    #[arg(long, conflicts_with = "mock")]
    replay: Option<PathBuf>,

    /// Replay speed multiplier (0 = as fast as possible)
    #[arg(long)]
    replay_speed: Option<f32>,

    /// Run without a sensor feed
    #[arg(long)]
    mock: bool,

    /// Exit immediately on error instead of waiting for Enter
    #[arg(long)]
    no_pause: bool,

    /// Write the default config to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

/// Application state.
struct App {
    config: AppConfig,
    instrument: Instrument,
    player: Box<dyn SamplePlayer>,
    sensor: SensorClient,
    tick_count: u64,
    strike_count: u64,
}

impl App {
    /// Drain pending events, evaluate gates, play strikes.
    /// Returns false once the feed has closed.
    fn tick(&mut self) -> bool {
        let mut open = true;
        while let Some(item) = self.sensor.try_recv() {
            match item {
                FeedItem::Event(event) => self.instrument.handle(&event),
                FeedItem::Closed => {
                    open = false;
                    break;
                }
            }
        }

        for strike in self.instrument.tick() {
            info!(
                device = strike.device,
                arm = %strike.arm,
                yaw = strike.yaw,
                zone = strike.zone,
                sample = %strike.sample,
                "Strike"
            );
            // Fire-and-forget: a failed play never stops the instrument.
            if let Err(e) = self.player.play(&strike.sample) {
                warn!(%e, sample = %strike.sample, "Playback failed");
            }
            self.strike_count += 1;
        }

        self.tick_count += 1;
        let every = u64::from(self.config.gesture.status_every_ticks);
        if self.tick_count == 1 || (every > 0 && self.tick_count % every == 0) {
            self.log_status();
        }
        if self.tick_count % 1200 == 0 {
            debug!(ticks = self.tick_count, strikes = self.strike_count, "Main loop heartbeat");
        }

        open
    }

    fn log_status(&self) {
        for (index, line) in self.instrument.collector().status_lines().iter().enumerate() {
            info!(device = index, "{line}");
        }
    }

    async fn run(&mut self) -> Result<()> {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.config.gesture.tick_hz));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    info!("Interrupted");
                    break;
                }
            }

            if !self.tick() {
                info!("Sensor feed ended");
                break;
            }
        }

        self.log_status();
        info!(ticks = self.tick_count, strikes = self.strike_count, "Stopped");
        Ok(())
    }
}

/// Fold command-line overrides into the loaded config.
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    let sensor = &mut config.sensor;
    if let Some(addr) = &args.connect {
        sensor.source = SensorSource::Tcp;
        sensor.address = addr.clone();
    }
    if let Some(path) = &args.replay {
        sensor.source = SensorSource::Replay;
        sensor.replay_path = Some(path.clone());
    }
    if let Some(speed) = args.replay_speed {
        sensor.replay_speed = speed;
    }
    if args.mock {
        sensor.source = SensorSource::Mock;
    }
}

async fn open_sensor(config: &SensorConfig) -> Result<SensorClient> {
    match config.source {
        SensorSource::Tcp => match SensorClient::connect(&config.address).await {
            Ok(client) => {
                info!("Connected to an armband feed");
                Ok(client)
            }
            Err(e) => {
                warn!(?e, "Armband feed not available, using mock (no gestures)");
                Ok(SensorClient::mock())
            }
        },
        SensorSource::Replay => {
            let path = config
                .replay_path
                .as_deref()
                .context("sensor.replay_path is not set")?;
            SensorClient::replay(path, config.replay_speed).await
        }
        SensorSource::Mock => Ok(SensorClient::mock()),
    }
}

async fn run(args: Args) -> Result<()> {
    if args.write_default_config {
        let path = match &args.config {
            Some(path) => {
                pyano_config::save_config_to(path, &AppConfig::default())?;
                path.clone()
            }
            None => pyano_config::save_config(&AppConfig::default())?,
        };
        info!(?path, "Default config written");
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => pyano_config::load_config_from(path)?,
        None => pyano_config::load_config().unwrap_or_else(|e| {
            warn!(?e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!(
        source = ?config.sensor.source,
        backend = ?config.audio.backend,
        tick_hz = config.gesture.tick_hz,
        "Config loaded"
    );

    let instrument = Instrument::from_config(&config)?;

    let player = match pyano_audio::open_player(&config.audio, &instrument.sample_names()) {
        Ok(player) => player,
        Err(AudioError::DeviceUnavailable(reason)) => {
            warn!(%reason, "Audio engine failed to start, exiting");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!("Attempting to find an armband...");
    let sensor = open_sensor(&config.sensor).await?;

    let mut app = App {
        config,
        instrument,
        player,
        sensor,
        tick_count: 0,
        strike_count: 0,
    };
    app.run().await
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "myo_pyano=info,pyano_sensor=info,pyano_gesture=info,pyano_audio=info,pyano_config=info"
                    .into()
            }),
        )
        .init();

    info!("MyoPyano starting");

    let args = Args::parse();
    let pause = !args.no_pause;

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        if pause {
            eprintln!("Press enter to continue.");
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_sensor_source() {
        let args = Args::parse_from(["myo-pyano", "--replay", "session.jsonl", "--replay-speed", "0"]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.sensor.source, SensorSource::Replay);
        assert_eq!(config.sensor.replay_path, Some(PathBuf::from("session.jsonl")));
        assert_eq!(config.sensor.replay_speed, 0.0);
        config.validate().unwrap();
    }

    #[test]
    fn cli_rejects_conflicting_sources() {
        assert!(Args::try_parse_from(["myo-pyano", "--connect", "1.2.3.4:5", "--mock"]).is_err());
    }

    #[tokio::test]
    async fn replayed_session_plays_strikes() {
        let path = std::env::temp_dir().join(format!("pyano-session-{}.jsonl", std::process::id()));
        let feed = [
            r#"{"type":"paired","myo":1}"#,
            r#"{"type":"arm_synced","myo":1,"arm":"right"}"#,
            r#"{"type":"orientation","myo":1,"orientation":{"w":1,"x":0,"y":0,"z":0}}"#,
            // Raised 30 degrees.
            r#"{"type":"orientation","myo":1,"orientation":{"w":0.9659258,"x":0,"y":0.2588190,"z":0}}"#,
        ];
        let lower = r#"{"type":"orientation","myo":1,"orientation":{"w":1,"x":0,"y":0,"z":0}}"#;
        std::fs::write(&path, format!("{}\n", feed.join("\n"))).unwrap();

        let mut config = AppConfig::default();
        config.sensor.source = SensorSource::Replay;
        config.sensor.replay_path = Some(path.clone());
        config.sensor.replay_speed = 0.0;
        let instrument = Instrument::from_config(&config).unwrap();
        let player = pyano_audio::open_player(&config.audio, &instrument.sample_names()).unwrap();
        let sensor = open_sensor(&config.sensor).await.unwrap();
        let mut app = App {
            config,
            instrument,
            player,
            sensor,
            tick_count: 0,
            strike_count: 0,
        };

        // Let the replay task deliver everything, then tick through it.
        while app.tick() {
            tokio::task::yield_now().await;
        }
        std::fs::remove_file(&path).ok();
        assert_eq!(app.strike_count, 0);

        // The arm is still up; one more sample brings it down.
        app.instrument
            .handle(&pyano_sensor::protocol::parse_line(lower).unwrap());
        app.tick();
        assert_eq!(app.strike_count, 1);
    }
}
