//! Desktop simulator for the nimbus environmental telemetry station.
//!
//! Drives a [`Station`] from a synthetic sensor on a simulated clock and
//! renders the dashboard with `embedded-graphics-simulator`. The textual
//! network page is logged from the shared snapshot.
//!
//! By default the simulator runs headless as fast as it can for a simulated
//! duration, optionally writing a PNG frame at every chart refresh. With the
//! `window` feature it opens an SDL2 window and runs in accelerated real time.
//!
//! # Options
//!
//! | Option              | Meaning                                           |
//! |---------------------|---------------------------------------------------|
//! | `--config <file>`   | JSON file with `station` and `network` sections   |
//! | `--minutes <n>`     | Simulated run length, headless only (default 30)  |
//! | `--frames <dir>`    | Write PNG frames into `dir`, headless only        |
//! | `--fail-every <n>`  | Make every n-th sensor read fail                  |
//! | `--speedup <n>`     | Simulated ms per real ms, window only (default 20)|
//! | `--offline`         | Simulate a network that never associates          |
//!
//! # Key bindings (window)
//!
//! | Key | Action                       |
//! |-----|------------------------------|
//! | C   | Cycle the chart channel      |
//! | F   | Toggle sensor fault          |
//! | Q   | Quit                         |

mod synthetic;

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, anyhow, bail};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use log::{info, warn};
use serde::Deserialize;

use nimbus_core::clock::{Clock, ManualClock};
use nimbus_core::config::NetworkConfig;
use nimbus_core::connectivity::{LinkError, associate};
use nimbus_core::snapshot::SharedSnapshot;
use nimbus_core::station::{Station, StationTask};
use nimbus_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, Dashboard};
use nimbus_core::{StationConfig, Ticks};

use synthetic::SyntheticSensor;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Simulated time between polls when running headless
const HEADLESS_STEP: Ticks = 100;

const DEFAULT_MINUTES: u64 = 30;

const DEFAULT_SPEEDUP: u64 = 20;

/// Network joined when the config file names none
const DEFAULT_SSID: &str = "nimbus-sim";

/// The simulated access point answers on this attempt
const ASSOCIATES_ON_ATTEMPT: u8 = 3;

/// Latest snapshot for the textual network page
static NETWORK_PAGE: SharedSnapshot = SharedSnapshot::new();

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default)]
struct SimulatorConfig<'a> {
    station: StationConfig,
    #[serde(borrow)]
    network: NetworkConfig<'a>,
}

struct Options {
    config: Option<PathBuf>,
    minutes: u64,
    frames: Option<PathBuf>,
    fail_every: Option<u32>,
    speedup: u64,
    offline: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut options = Options {
        config: None,
        minutes: DEFAULT_MINUTES,
        frames: None,
        fail_every: None,
        speedup: DEFAULT_SPEEDUP,
        offline: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || {
            args.next()
                .with_context(|| format!("missing value for {}", arg))
        };

        match arg.as_str() {
            "--config" => options.config = Some(PathBuf::from(value()?)),
            "--frames" => options.frames = Some(PathBuf::from(value()?)),
            "--minutes" => options.minutes = value()?.parse().context("--minutes")?,
            "--fail-every" => options.fail_every = Some(value()?.parse().context("--fail-every")?),
            "--speedup" => options.speedup = value()?.parse().context("--speedup")?,
            "--offline" => options.offline = true,
            other => bail!("unknown argument: {}", other),
        }
    }

    Ok(options)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn screen_bounds() -> Rectangle {
    Rectangle::new(
        Point::zero(),
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let options = parse_args()?;

    let contents = match &options.config {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => String::new(),
    };
    let config: SimulatorConfig = if contents.is_empty() {
        SimulatorConfig::default()
    } else {
        serde_json::from_str(&contents).context("parsing configuration file")?
    };

    info!("Starting nimbus simulator");

    let sensor = SyntheticSensor::new(options.fail_every);
    let mut station = Station::new(config.station, sensor)
        .map_err(|e| anyhow!("station failed to start: {}", e))?;

    let network = NetworkConfig {
        ssid: if config.network.ssid.is_empty() {
            DEFAULT_SSID
        } else {
            config.network.ssid
        },
        ..config.network
    };
    let connectivity = associate(&network, |attempt| {
        if options.offline {
            Err(LinkError::NotFound)
        } else if attempt < ASSOCIATES_ON_ATTEMPT {
            Err(LinkError::Timeout)
        } else {
            Ok(())
        }
    });
    station.set_connectivity(connectivity);

    if connectivity.is_online() {
        // Stand-in for network time sync
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        station.set_wall_clock_offset(epoch_ms);
    }

    let mut dashboard = Dashboard::new(screen_bounds(), station.config().indicator.segments);

    #[cfg(feature = "window")]
    run_window(&mut station, &mut dashboard, &options)?;

    #[cfg(not(feature = "window"))]
    run_headless(&mut station, &mut dashboard, &options)?;

    let health = station.snapshot().health;
    info!(
        "Simulator exiting: {} samples, {} failed reads",
        health.total_samples, health.total_failures
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Headless run
// ---------------------------------------------------------------------------

#[cfg(not(feature = "window"))]
fn run_headless(
    station: &mut Station<SyntheticSensor>,
    dashboard: &mut Dashboard,
    options: &Options,
) -> anyhow::Result<()> {
    let clock = ManualClock::new(0);
    let end = options.minutes * 60_000;
    let mut display = SimulatorDisplay::<Rgb565>::new(screen_bounds().size);
    let output_settings = OutputSettingsBuilder::new().scale(1).build();

    if let Some(dir) = &options.frames {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    info!(
        "Running {} simulated minutes headless, polling every {} ms",
        options.minutes, HEADLESS_STEP
    );

    let mut frame = 0u32;
    while clock.now() <= end {
        let summary = station.poll(clock.now(), (&mut *dashboard, &NETWORK_PAGE));

        if let Some(e) = summary.sensor_error {
            warn!("t={}ms sample skipped: {}", clock.now(), e);
        }

        if summary.fired(StationTask::Chart) {
            if let Some(page) = NETWORK_PAGE.latest() {
                info!("{}", page);
            }

            if let Some(dir) = &options.frames {
                display.clear(Rgb565::BLACK)?;
                dashboard.draw(&mut display)?;
                dashboard.mark_clean();

                let path = dir.join(format!("frame_{:04}.png", frame));
                display
                    .to_rgb_output_image(&output_settings)
                    .save_png(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote {}", path.display());
                frame += 1;
            }
        }

        clock.advance(HEADLESS_STEP);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Windowed run
// ---------------------------------------------------------------------------

#[cfg(feature = "window")]
fn run_window(
    station: &mut Station<SyntheticSensor>,
    dashboard: &mut Dashboard,
    options: &Options,
) -> anyhow::Result<()> {
    use std::time::{Duration, Instant};

    use embedded_graphics_simulator::{SimulatorEvent, Window, sdl2::Keycode};

    const WINDOW_SCALE: u32 = 2;
    const FRAME_DURATION: Duration = Duration::from_millis(33);

    info!("Keys: C=Cycle chart  F=Toggle sensor fault  Q=Quit");

    let clock = ManualClock::new(0);
    let step = FRAME_DURATION.as_millis() as Ticks * options.speedup.max(1);

    let mut display = SimulatorDisplay::<Rgb565>::new(screen_bounds().size);
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Nimbus Simulator", &output_settings);

    // The SDL window is created on the first `update()`; `events()` panics before that
    display.clear(Rgb565::BLACK)?;
    dashboard.draw(&mut display)?;
    window.update(&display);

    'running: loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::C => {
                        dashboard.cycle_chart();
                        info!("Showing {} chart", dashboard.selected_chart().label());
                    }
                    Keycode::F => {
                        let faulted = station.sensor_mut().toggle_fault();
                        info!("Sensor fault {}", if faulted { "on" } else { "off" });
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        let summary = station.poll(clock.now(), (&mut *dashboard, &NETWORK_PAGE));
        if summary.fired(StationTask::Sample)
            && let Some(page) = NETWORK_PAGE.latest()
        {
            log::debug!("{}", page);
        }

        if dashboard.is_dirty() {
            display.clear(Rgb565::BLACK)?;
            dashboard.draw(&mut display)?;
            dashboard.mark_clean();
        }
        window.update(&display);

        clock.advance(step);

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    Ok(())
}
