use crate::error::Result;
use crate::frame::Frame;
use crate::lattice::{EnergyField, Lattice};
use crate::params::{ParamSnapshot, ParameterStore};
use crate::resize::{resized, DisplayProbe, ResizeFlag, SizePolicy};
use crate::update::apply_update;
use anyhow::Context;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;

/// Receives each finished frame.
pub(crate) trait FrameSink {
    fn present(&mut self, frame: &Frame, params: &ParamSnapshot) -> anyhow::Result<()>;
}

/// Everything the sweep touches. Owned by the simulation loop only.
pub(crate) struct Simulation {
    lattice: Lattice,
    field: EnergyField,
    rng: StdRng,
}

impl Simulation {
    pub(crate) fn new(height: usize, width: usize, mut rng: StdRng) -> Result<Self> {
        let lattice = Lattice::random(height, width, &mut rng)?;
        let field = EnergyField::zeroed(height, width)?;
        Ok(Self {
            lattice,
            field,
            rng,
        })
    }

    #[cfg(test)]
    pub(crate) fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub(crate) fn dimensions(&self) -> (usize, usize) {
        (self.lattice.height(), self.lattice.width())
    }

    /// Swaps in freshly built buffers; the old ones are dropped. On error the
    /// current buffers stay untouched.
    pub(crate) fn resize(&mut self, height: usize, width: usize) -> Result<()> {
        let lattice = resized(&self.lattice, height, width, &mut self.rng)?;
        let field = EnergyField::zeroed(height, width)?;
        self.lattice = lattice;
        self.field = field;
        Ok(())
    }

    /// Energy pass over the whole grid, then the update pass.
    pub(crate) fn sweep(&mut self, probability: f64, temperature: f64) -> Frame {
        self.field.compute(&self.lattice);
        apply_update(
            &mut self.lattice,
            &self.field,
            probability,
            temperature,
            &mut self.rng,
        );
        Frame::capture(&self.lattice, &self.field)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoopState {
    Running,
    Paused,
    Stopping,
}

impl LoopState {
    pub(crate) fn observe(params: &ParameterStore) -> Self {
        if !params.is_running() {
            LoopState::Stopping
        } else if params.is_paused() {
            LoopState::Paused
        } else {
            LoopState::Running
        }
    }
}

pub(crate) fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
}

pub(crate) struct SimulationLoop<D, S> {
    sim: Simulation,
    params: Arc<ParameterStore>,
    resize: ResizeFlag,
    size: SizePolicy,
    display: D,
    sink: S,
}

impl<D: DisplayProbe, S: FrameSink> SimulationLoop<D, S> {
    pub(crate) fn new(
        sim: Simulation,
        params: Arc<ParameterStore>,
        resize: ResizeFlag,
        size: SizePolicy,
        display: D,
        sink: S,
    ) -> Self {
        Self {
            sim,
            params,
            resize,
            size,
            display,
            sink,
        }
    }

    #[cfg(test)]
    pub(crate) fn simulation(&self) -> &Simulation {
        &self.sim
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs until the running flag drops. Returns the number of sweeps.
    pub(crate) fn run(&mut self) -> anyhow::Result<u64> {
        let mut sweeps = 0u64;
        loop {
            match LoopState::observe(&self.params) {
                LoopState::Stopping => break,
                LoopState::Paused => std::thread::sleep(frame_interval(self.params.fps())),
                LoopState::Running => {
                    self.iterate()?;
                    sweeps += 1;
                }
            }
        }
        tracing::info!(sweeps, "simulation loop stopped");
        Ok(sweeps)
    }

    fn iterate(&mut self) -> anyhow::Result<()> {
        if self.resize.take() {
            self.service_resize()?;
        }

        let params = self.params.snapshot();
        let frame = self.sim.sweep(params.probability, params.temperature);
        self.sink.present(&frame, &params)?;

        std::thread::sleep(frame_interval(params.fps));
        Ok(())
    }

    fn service_resize(&mut self) -> anyhow::Result<()> {
        let (h, w) = self.size.resolve(&self.display);
        let (old_h, old_w) = self.sim.dimensions();
        if (h, w) == (old_h, old_w) {
            return Ok(());
        }
        self.sim
            .resize(h, w)
            .with_context(|| format!("resizing grid from {old_h}x{old_w} to {h}x{w}"))?;
        tracing::debug!(old_h, old_w, height = h, width = w, "grid resized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{DOWN, UP};
    use rand::SeedableRng;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone)]
    struct SharedDisplay(Arc<Mutex<(usize, usize)>>);

    impl DisplayProbe for SharedDisplay {
        fn dimensions(&self) -> io::Result<(usize, usize)> {
            Ok(*self.0.lock().unwrap())
        }
    }

    /// Records frames and runs a hook after each one.
    struct Recorder<F: FnMut(usize)> {
        frames: Vec<Frame>,
        after: F,
    }

    impl<F: FnMut(usize)> FrameSink for Recorder<F> {
        fn present(&mut self, frame: &Frame, _params: &ParamSnapshot) -> anyhow::Result<()> {
            self.frames.push(frame.clone());
            (self.after)(self.frames.len());
            Ok(())
        }
    }

    fn fast_params() -> Arc<ParameterStore> {
        Arc::new(ParameterStore::new(std::f64::consts::PI, 0.42, 1000, 1, 1000))
    }

    fn policy() -> SizePolicy {
        SizePolicy {
            height: None,
            width: None,
            fallback: (10, 10),
        }
    }

    #[test]
    fn sweep_of_aligned_lattice_is_stable_when_cold() {
        let mut sim = Simulation::new(4, 4, StdRng::seed_from_u64(1)).unwrap();
        sim.lattice = Lattice::from_fn(4, 4, |_, _| UP).unwrap();
        let frame = sim.sweep(1.0, 0.1);
        assert!(sim.lattice().spins().iter().all(|&s| s == UP));
        assert!(frame.levels.iter().all(|&l| l == 5));
    }

    #[test]
    fn resize_keeps_overlap_and_resets_energy() {
        let mut sim = Simulation::new(6, 6, StdRng::seed_from_u64(4)).unwrap();
        sim.sweep(0.5, 1.0);
        let before = sim.lattice().clone();

        sim.resize(9, 3).unwrap();
        assert_eq!(sim.dimensions(), (9, 3));
        assert_eq!(sim.field.values().len(), 27);
        for i in 0..6 {
            for j in 0..3 {
                assert_eq!(sim.lattice().get(i, j), before.get(i, j));
            }
        }
        assert!(sim.lattice().spins().iter().all(|&s| s == UP || s == DOWN));
    }

    #[test]
    fn failed_resize_leaves_buffers_in_place() {
        let mut sim = Simulation::new(5, 5, StdRng::seed_from_u64(4)).unwrap();
        let before = sim.lattice().clone();
        assert!(sim.resize(0, 5).is_err());
        assert_eq!(sim.lattice(), &before);
    }

    #[test]
    fn loop_stops_after_the_current_iteration() {
        let params = fast_params();
        let stopper = Arc::clone(&params);
        let display = SharedDisplay(Arc::new(Mutex::new((8, 12))));
        let sim = Simulation::new(8, 12, StdRng::seed_from_u64(9)).unwrap();
        let sink = Recorder {
            frames: Vec::new(),
            after: move |n: usize| {
                if n == 5 {
                    stopper.request_stop();
                }
            },
        };

        let mut lp = SimulationLoop::new(sim, params, ResizeFlag::new(), policy(), display, sink);
        let sweeps = lp.run().unwrap();

        assert_eq!(sweeps, 5);
        assert_eq!(lp.sink().frames.len(), 5);
        for frame in &lp.sink().frames {
            assert_eq!((frame.height, frame.width), (8, 12));
            assert!(frame.levels.iter().all(|&l| l <= 5));
        }
    }

    #[test]
    fn resize_notification_applies_at_next_boundary() {
        let params = fast_params();
        let stopper = Arc::clone(&params);
        let dims = Arc::new(Mutex::new((6, 6)));
        let display = SharedDisplay(Arc::clone(&dims));
        let flag = ResizeFlag::new();
        let notifier = flag.clone();
        let sim = Simulation::new(6, 6, StdRng::seed_from_u64(3)).unwrap();
        let sink = Recorder {
            frames: Vec::new(),
            after: move |n: usize| {
                if n == 1 {
                    *dims.lock().unwrap() = (4, 11);
                    notifier.notify();
                }
                if n == 3 {
                    stopper.request_stop();
                }
            },
        };

        let mut lp = SimulationLoop::new(sim, params, flag, policy(), display, sink);
        lp.run().unwrap();

        let frames = &lp.sink().frames;
        assert_eq!((frames[0].height, frames[0].width), (6, 6));
        assert_eq!((frames[1].height, frames[1].width), (4, 11));
        assert_eq!((frames[2].height, frames[2].width), (4, 11));
        assert_eq!(lp.simulation().dimensions(), (4, 11));
    }

    #[test]
    fn paused_loop_produces_no_frames_but_still_stops() {
        let params = fast_params();
        params.toggle_pause();
        let display = SharedDisplay(Arc::new(Mutex::new((5, 5))));
        let sim = Simulation::new(5, 5, StdRng::seed_from_u64(0)).unwrap();
        let sink = Recorder {
            frames: Vec::new(),
            after: |_: usize| {},
        };

        let stopper = Arc::clone(&params);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            stopper.request_stop();
        });

        let mut lp = SimulationLoop::new(sim, params, ResizeFlag::new(), policy(), display, sink);
        let sweeps = lp.run().unwrap();
        handle.join().unwrap();

        assert_eq!(sweeps, 0);
        assert!(lp.sink().frames.is_empty());
    }

    #[test]
    fn observed_state_follows_flags() {
        let params = fast_params();
        assert_eq!(LoopState::observe(&params), LoopState::Running);
        params.toggle_pause();
        assert_eq!(LoopState::observe(&params), LoopState::Paused);
        params.request_stop();
        assert_eq!(LoopState::observe(&params), LoopState::Stopping);
    }

    #[test]
    fn frame_interval_tracks_fps() {
        assert_eq!(frame_interval(4), Duration::from_millis(250));
        assert_eq!(frame_interval(0), Duration::from_secs(1));
    }
}
