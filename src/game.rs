use crate::config;
use crate::utils::clamp;
use crate::value::ValueError;
use crate::village::{Village, VillageReport, VillageState};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// Run parameters for a headless session
#[derive(Debug, Clone, PartialEq)]
pub struct GameOptions {
    pub seconds: f64,
    pub seed: u64,
    pub jitter: f64,
    pub pause_at: Option<f64>,
    pub resume_at: Option<f64>,
}

impl Default for GameOptions {
    fn default() -> Self {
        GameOptions {
            seconds: config::DEFAULT_RUN_SECONDS,
            seed: config::DEFAULT_SEED,
            jitter: config::DEFAULT_FRAME_JITTER,
            pause_at: None,
            resume_at: None,
        }
    }
}

/// The Game struct drives the village with simulated frames of uneven length
pub struct Game {
    pub village: Village,
    pub clock: f64,
    pub frames: u64,
    pub steps: u64,
    rng: StdRng,
    options: GameOptions,
    sim_time: f64,
    time_accumulator: f64,
    step_duration: f64,
    paused: bool,
}

impl Game {
    pub fn new(options: GameOptions) -> Result<Self, ValueError> {
        let mut options = options;
        let jitter = clamp(options.jitter, 0.0, 0.9);
        if jitter != options.jitter {
            warn!("Frame jitter {} out of range, using {}", options.jitter, jitter);
            options.jitter = jitter;
        }

        let state = Rc::new(RefCell::new(VillageState::default()));
        let village = Village::new(state)?;
        info!(
            "Village created with {} houses, running for {} seconds (seed {}).",
            config::HOUSE_COUNT,
            options.seconds,
            options.seed
        );

        Ok(Game {
            village,
            clock: 0.0,
            frames: 0,
            steps: 0,
            rng: StdRng::seed_from_u64(options.seed),
            options,
            sim_time: 0.0,
            time_accumulator: 0.0,
            step_duration: config::FIXED_STEP_SECONDS,
            paused: false,
        })
    }

    /// Run the main loop to completion and return the final report
    pub fn run(&mut self) -> VillageReport {
        info!("Starting main loop...");
        self.village.start();
        // First tick only records the starting time
        self.village.update(self.clock);
        self.village.fixed_update(self.sim_time);

        while self.clock < self.options.seconds {
            let frame_time = self.next_frame_time();
            self.frame(frame_time);
        }

        let report = self.village.report();
        info!(
            "Simulated {:.1}s in {} frames and {} fixed steps.",
            self.clock, self.frames, self.steps
        );
        info!("Final state: {}", report);
        report
    }

    /// Advance the wall clock by one frame
    pub fn frame(&mut self, frame_time: f64) {
        self.clock += frame_time;
        self.frames += 1;
        self.apply_schedule();

        self.village.update(self.clock);

        // Fixed simulation update loop
        self.time_accumulator += frame_time;
        while self.time_accumulator >= self.step_duration {
            self.time_accumulator -= self.step_duration;
            self.sim_time += self.step_duration;
            self.village.fixed_update(self.sim_time);
            self.steps += 1;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn next_frame_time(&mut self) -> f64 {
        let jitter = self.options.jitter;
        let scale = 1.0 + self.rng.gen_range(-jitter..=jitter);
        config::TARGET_FRAME_SECONDS * scale
    }

    fn apply_schedule(&mut self) {
        if !self.paused {
            if let Some(pause_at) = self.options.pause_at {
                let resumed_already = self.options.resume_at.is_some_and(|r| self.clock >= r);
                if self.clock >= pause_at && !resumed_already {
                    debug!("Pausing at {:.2}s", self.clock);
                    self.village.suspend();
                    self.paused = true;
                    // Only one pause per run
                    self.options.pause_at = None;
                }
            }
        } else if let Some(resume_at) = self.options.resume_at {
            if self.clock >= resume_at {
                debug!("Resuming at {:.2}s", self.clock);
                self.village.resume();
                self.paused = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn options(seconds: f64) -> GameOptions {
        GameOptions {
            seconds,
            ..GameOptions::default()
        }
    }

    #[test]
    fn test_run_reaches_target_time() {
        let mut game = Game::new(options(5.0)).unwrap();
        let report = game.run();
        assert!(game.clock >= 5.0);
        assert!(game.frames > 0);
        // One step per 1/60 s of wall time, give or take the leftover
        assert!((game.steps as f64 - game.clock * 60.0).abs() <= 1.0);
        // One upkeep settlement has landed by now
        assert_approx_eq!(report.total_gold, config::DAY_INCOME - config::DAY_UPKEEP);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Game::new(options(3.0)).unwrap();
        let mut b = Game::new(options(3.0)).unwrap();
        assert_eq!(a.run(), b.run());
        assert_eq!(a.frames, b.frames);
    }

    #[test]
    fn test_fixed_steps_follow_accumulated_time() {
        let mut game = Game::new(options(1.0)).unwrap();
        game.village.start();
        game.frame(0.01);
        assert_eq!(game.steps, 0);
        game.frame(0.01);
        assert_eq!(game.steps, 1);
        game.frame(0.05);
        assert_eq!(game.steps, 4);
    }

    #[test]
    fn test_pause_and_resume_schedule() {
        let mut game = Game::new(GameOptions {
            seconds: 4.0,
            pause_at: Some(1.0),
            resume_at: Some(3.0),
            ..GameOptions::default()
        })
        .unwrap();
        let report = game.run();
        assert!(!game.is_paused());
        assert!(game.village.is_running());
        // Roughly two seconds of village time at 24 minutes per second
        let minutes = game.village.minutes() - config::DAWN_MINUTES;
        assert!((44.0..=52.0).contains(&minutes), "minutes advanced: {}", minutes);
        assert!(report.is_day);
    }

    #[test]
    fn test_jitter_is_clamped() {
        let game = Game::new(GameOptions {
            jitter: 3.0,
            ..GameOptions::default()
        })
        .unwrap();
        assert_approx_eq!(game.options.jitter, 0.9);
    }
}
