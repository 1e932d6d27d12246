use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use haptic_drive::{
    CalibrationStore, Cs40l25, Drv2624, Effect, EffectOutcome, EffectStrength, HardwareIo,
    Vibrator, HWAPI_PATH_PREFIX_ENV,
};

const USAGE: &str = "\
usage: vibratorctl [--backend drv2624|cs40l25] <command>

commands:
  on <ms>                     steady vibration
  off                         stop playback
  effect <name> [strength]    play click, tick, heavy_click, texture_tick, double_click
  amplitude <0..1>            set playback amplitude
  external <on|off>           toggle external control
  dump                        print driver and calibration state

environment:
  HWAPI_PATH_PREFIX      driver sysfs directory
  CALIBRATION_FILEPATH   persisted calibration file
  VIBRATOR_PROPERTIES    TOML tuning properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Drv2624,
    Cs40l25,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let backend = take_backend(&mut args)?;
    if args.is_empty() {
        bail!("{}", USAGE);
    }

    let prefix = env::var_os(HWAPI_PATH_PREFIX_ENV)
        .map(PathBuf::from)
        .with_context(|| format!("{} is not set", HWAPI_PATH_PREFIX_ENV))?;
    let record = CalibrationStore::from_env().load();

    match backend {
        Backend::Drv2624 => run(Vibrator::new(Drv2624::open(prefix), record)?, &args),
        Backend::Cs40l25 => run(Vibrator::new(Cs40l25::open(prefix), record)?, &args),
    }
}

fn take_backend(args: &mut Vec<String>) -> Result<Backend> {
    let Some(position) = args.iter().position(|arg| arg == "--backend") else {
        return Ok(Backend::Drv2624);
    };
    if position + 1 >= args.len() {
        bail!("--backend needs a value");
    }
    let name = args.remove(position + 1);
    args.remove(position);
    match name.as_str() {
        "drv2624" => Ok(Backend::Drv2624),
        "cs40l25" => Ok(Backend::Cs40l25),
        other => bail!("unknown backend '{}'", other),
    }
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("missing {}\n\n{}", what, USAGE))
}

fn run<H: HardwareIo>(mut vibrator: Vibrator<H>, args: &[String]) -> Result<()> {
    match args[0].as_str() {
        "on" => {
            let duration_ms: u32 = arg(args, 1, "duration")?
                .parse()
                .context("duration must be milliseconds")?;
            let played = vibrator.on(duration_ms)?;
            info!("Vibrating for {} ms", played);
        }
        "off" => vibrator.off()?,
        "effect" => {
            let effect: Effect = arg(args, 1, "effect name")?.parse()?;
            let strength = match args.get(2) {
                Some(strength) => strength.parse()?,
                None => EffectStrength::default(),
            };
            match vibrator.perform_effect(effect, strength)? {
                EffectOutcome::Played { duration_ms } => {
                    info!("Playing {} ({}) for {} ms", effect, strength, duration_ms)
                }
                EffectOutcome::Unsupported => bail!("effect {} is not supported", effect),
            }
        }
        "amplitude" => {
            let amplitude: f32 = arg(args, 1, "amplitude")?
                .parse()
                .context("amplitude must be a number")?;
            vibrator.set_amplitude(amplitude)?;
        }
        "external" => {
            let enabled = match arg(args, 1, "on|off")? {
                "on" => true,
                "off" => false,
                other => bail!("expected on or off, got '{}'", other),
            };
            vibrator.set_external_control(enabled)?;
        }
        "dump" => {
            let mut out = String::new();
            vibrator
                .debug(&mut out)
                .context("failed to format state")?;
            print!("{}", out);
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
    Ok(())
}
