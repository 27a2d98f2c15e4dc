use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

pub(crate) const PROBABILITY_MIN: f64 = 0.0;
pub(crate) const PROBABILITY_MAX: f64 = 1.0;

/// Temperature never drops below this, so `exp(-e / T)` stays finite.
pub(crate) const TEMPERATURE_FLOOR: f64 = 0.01;
pub(crate) const TEMPERATURE_CEIL: f64 = 100.0;

const SCALE_DOWN: f64 = 0.99;
const SCALE_UP: f64 = 1.01;
const STEP: f64 = 0.1;

/// One bounded adjustment requested by the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    TogglePause,
    ProbabilityScaleDown,
    ProbabilityStepDown,
    ProbabilityScaleUp,
    ProbabilityStepUp,
    TemperatureScaleDown,
    TemperatureStepDown,
    TemperatureScaleUp,
    TemperatureStepUp,
    SlowerFrames,
    FasterFrames,
}

/// f64 stored as its bit pattern, so loads never observe a torn value.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn update(&self, f: impl Fn(f64) -> f64) -> f64 {
        let mut cur = self.0.load(Ordering::Acquire);
        loop {
            let next = f(f64::from_bits(cur)).to_bits();
            match self
                .0
                .compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return f64::from_bits(next),
                Err(actual) => cur = actual,
            }
        }
    }
}

/// Values read by the simulation loop in a single pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ParamSnapshot {
    pub(crate) temperature: f64,
    pub(crate) probability: f64,
    pub(crate) fps: u32,
}

/// Live-tunable simulation scalars. Each field is synchronized on its own;
/// readers get no cross-field consistency.
#[derive(Debug)]
pub(crate) struct ParameterStore {
    temperature: AtomicF64,
    probability: AtomicF64,
    fps: AtomicU32,
    min_fps: u32,
    max_fps: u32,
    paused: AtomicBool,
    running: AtomicBool,
}

impl ParameterStore {
    /// Values are expected to be validated already (see `Config`).
    pub(crate) fn new(temperature: f64, probability: f64, fps: u32, min_fps: u32, max_fps: u32) -> Self {
        Self {
            temperature: AtomicF64::new(temperature),
            probability: AtomicF64::new(probability),
            fps: AtomicU32::new(fps),
            min_fps,
            max_fps,
            paused: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    pub(crate) fn temperature(&self) -> f64 {
        self.temperature.load()
    }

    pub(crate) fn probability(&self) -> f64 {
        self.probability.load()
    }

    pub(crate) fn fps(&self) -> u32 {
        self.fps.load(Ordering::Acquire)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            temperature: self.temperature(),
            probability: self.probability(),
            fps: self.fps(),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Returns the new pause state.
    pub(crate) fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub(crate) fn scale_probability_down(&self) -> f64 {
        self.probability
            .update(|p| (p * SCALE_DOWN).clamp(PROBABILITY_MIN, PROBABILITY_MAX))
    }

    pub(crate) fn step_probability_down(&self) -> f64 {
        self.probability.update(|p| (p - STEP).max(PROBABILITY_MIN))
    }

    pub(crate) fn scale_probability_up(&self) -> f64 {
        self.probability.update(|p| (p * SCALE_UP).min(PROBABILITY_MAX))
    }

    pub(crate) fn step_probability_up(&self) -> f64 {
        self.probability.update(|p| (p + STEP).min(PROBABILITY_MAX))
    }

    pub(crate) fn scale_temperature_down(&self) -> f64 {
        self.temperature.update(|t| (t * SCALE_DOWN).max(TEMPERATURE_FLOOR))
    }

    pub(crate) fn step_temperature_down(&self) -> f64 {
        self.temperature.update(|t| (t - STEP).max(TEMPERATURE_FLOOR))
    }

    pub(crate) fn scale_temperature_up(&self) -> f64 {
        self.temperature.update(|t| (t * SCALE_UP).min(TEMPERATURE_CEIL))
    }

    pub(crate) fn step_temperature_up(&self) -> f64 {
        self.temperature.update(|t| (t + STEP).min(TEMPERATURE_CEIL))
    }

    pub(crate) fn slower(&self) -> u32 {
        let min = self.min_fps;
        let prev = self
            .fps
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |f| {
                Some(f.saturating_sub(1).max(min))
            })
            .unwrap_or(min);
        prev.saturating_sub(1).max(min)
    }

    pub(crate) fn faster(&self) -> u32 {
        let max = self.max_fps;
        let prev = self
            .fps
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |f| {
                Some(f.saturating_add(1).min(max))
            })
            .unwrap_or(max);
        prev.saturating_add(1).min(max)
    }

    pub(crate) fn apply(&self, cmd: Command) {
        match cmd {
            Command::Quit => {
                self.request_stop();
                tracing::info!("stop requested");
            }
            Command::TogglePause => {
                let paused = self.toggle_pause();
                tracing::info!(paused, "pause toggled");
            }
            Command::ProbabilityScaleDown => log_probability(self.scale_probability_down()),
            Command::ProbabilityStepDown => log_probability(self.step_probability_down()),
            Command::ProbabilityScaleUp => log_probability(self.scale_probability_up()),
            Command::ProbabilityStepUp => log_probability(self.step_probability_up()),
            Command::TemperatureScaleDown => log_temperature(self.scale_temperature_down()),
            Command::TemperatureStepDown => log_temperature(self.step_temperature_down()),
            Command::TemperatureScaleUp => log_temperature(self.scale_temperature_up()),
            Command::TemperatureStepUp => log_temperature(self.step_temperature_up()),
            Command::SlowerFrames => log_fps(self.slower()),
            Command::FasterFrames => log_fps(self.faster()),
        }
    }
}

fn log_probability(p: f64) {
    tracing::debug!(probability = p, "flip probability adjusted");
}

fn log_temperature(t: f64) {
    tracing::debug!(temperature = t, "temperature adjusted");
}

fn log_fps(fps: u32) {
    tracing::debug!(fps, "frame rate adjusted");
}
