use crate::error::{Error, Result};
use crate::lattice::MAX_DIMENSION;
use crate::params::{TEMPERATURE_CEIL, TEMPERATURE_FLOOR};
use crate::resize::SizePolicy;
use clap::Parser;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Grid size used when the terminal cannot be queried.
pub(crate) const DEFAULT_DIMENSIONS: (usize, usize) = (10, 10);

/// Live Ising-style spin lattice in the terminal.
///
/// keys: q/Esc quit  p pause  z/Z x/X flip probability  a/A s/S temperature  d/f fps
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// grid width (defaults to the terminal width)
    #[arg(long)]
    pub(crate) width: Option<usize>,

    /// grid height (defaults to the terminal height minus the status line)
    #[arg(long)]
    pub(crate) height: Option<usize>,

    /// initial temperature
    #[arg(long, short = 't', default_value_t = std::f64::consts::PI)]
    pub(crate) temperature: f64,

    /// initial per-cell flip-attempt probability
    #[arg(long, short = 'p', default_value_t = 0.42)]
    pub(crate) probability: f64,

    /// initial frame rate
    #[arg(long, default_value_t = 24)]
    pub(crate) fps: u32,

    #[arg(long, default_value_t = 4)]
    pub(crate) min_fps: u32,

    #[arg(long, default_value_t = 60)]
    pub(crate) max_fps: u32,

    /// fixed RNG seed (time-derived when omitted)
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// write tracing output to this file (RUST_LOG filters it)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub(crate) size: SizePolicy,
    pub(crate) temperature: f64,
    pub(crate) probability: f64,
    pub(crate) fps: u32,
    pub(crate) min_fps: u32,
    pub(crate) max_fps: u32,
    pub(crate) seed: u64,
    pub(crate) log_file: Option<PathBuf>,
}

fn check_dimension(height: Option<usize>, width: Option<usize>) -> Result<()> {
    let ok = |d: Option<usize>| d.map_or(true, |v| (1..=MAX_DIMENSION).contains(&v));
    if ok(height) && ok(width) {
        Ok(())
    } else {
        Err(Error::InvalidDimensions {
            height: height.unwrap_or(0),
            width: width.unwrap_or(0),
            max: MAX_DIMENSION,
        })
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Config {
    /// Rejects out-of-domain values instead of clamping them.
    pub(crate) fn from_args(args: Args) -> Result<Self> {
        let t = args.temperature;
        if !t.is_finite() || !(TEMPERATURE_FLOOR..=TEMPERATURE_CEIL).contains(&t) {
            return Err(Error::InvalidTemperature {
                value: t,
                min: TEMPERATURE_FLOOR,
                max: TEMPERATURE_CEIL,
            });
        }

        let p = args.probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(Error::InvalidProbability(p));
        }

        let fps_range = args.min_fps..=args.max_fps;
        if args.min_fps == 0 || fps_range.is_empty() || !fps_range.contains(&args.fps) {
            return Err(Error::InvalidFrameRate {
                fps: args.fps,
                min: args.min_fps,
                max: args.max_fps,
            });
        }

        check_dimension(args.height, args.width)?;

        Ok(Self {
            size: SizePolicy {
                height: args.height,
                width: args.width,
                fallback: DEFAULT_DIMENSIONS,
            },
            temperature: t,
            probability: p,
            fps: args.fps,
            min_fps: args.min_fps,
            max_fps: args.max_fps,
            seed: args.seed.unwrap_or_else(time_seed),
            log_file: args.log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["ising"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::from_args(parse(&["--seed", "7"])).unwrap();
        assert_eq!(cfg.temperature, std::f64::consts::PI);
        assert_eq!(cfg.probability, 0.42);
        assert_eq!((cfg.fps, cfg.min_fps, cfg.max_fps), (24, 4, 60));
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.size.fallback, (10, 10));
        assert_eq!((cfg.size.height, cfg.size.width), (None, None));
    }

    #[test]
    fn non_positive_temperature_is_rejected() {
        for t in ["0", "-1.5", "0.001", "1000", "NaN"] {
            let flag = format!("--temperature={t}");
            let args = parse(&[flag.as_str()]);
            assert!(
                matches!(Config::from_args(args), Err(Error::InvalidTemperature { .. })),
                "T = {t}"
            );
        }
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        for p in ["-0.1", "1.5"] {
            let flag = format!("--probability={p}");
            let args = parse(&[flag.as_str()]);
            assert!(matches!(Config::from_args(args), Err(Error::InvalidProbability(_))));
        }
        assert!(Config::from_args(parse(&["-p", "1"])).is_ok());
        assert!(Config::from_args(parse(&["-p", "0"])).is_ok());
    }

    #[test]
    fn frame_rate_must_sit_inside_its_bounds() {
        for extra in [
            &["--fps", "70"][..],
            &["--fps", "2"][..],
            &["--min-fps", "0", "--fps", "1"][..],
            &["--min-fps", "30", "--max-fps", "20"][..],
        ] {
            assert!(
                matches!(Config::from_args(parse(extra)), Err(Error::InvalidFrameRate { .. })),
                "{extra:?}"
            );
        }
    }

    #[test]
    fn dimension_overrides_are_checked() {
        assert!(matches!(
            Config::from_args(parse(&["--width", "0"])),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Config::from_args(parse(&["--height", "5000"])),
            Err(Error::InvalidDimensions { .. })
        ));
        let cfg = Config::from_args(parse(&["--width", "5", "--height", "1"])).unwrap();
        assert_eq!((cfg.size.height, cfg.size.width), (Some(1), Some(5)));
    }

    #[test]
    fn missing_seed_comes_from_the_clock() {
        let cfg = Config::from_args(parse(&[])).unwrap();
        assert!(cfg.seed > 0);
    }
}
