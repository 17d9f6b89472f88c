use crate::reading::Reading;
use crate::sample_buffer::SampleBuffer;
use crate::stop_signal::StopSignal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info};

// Floor on the tick so a zero period cannot spin.
const MIN_PERIOD: Duration = Duration::from_millis(1);

// Walk parameters per quantity
struct WalkBounds {
    start: (f64, f64),
    max_step: f64,
    valid: (f64, f64),
}

const TEMPERATURE: WalkBounds = WalkBounds {
    start: (15.0, 25.0),
    max_step: 0.5,
    valid: (-50.0, 60.0),
};

const HUMIDITY: WalkBounds = WalkBounds {
    start: (40.0, 60.0),
    max_step: 1.0,
    valid: (0.0, 100.0),
};

const PRESSURE: WalkBounds = WalkBounds {
    start: (1000.0, 1025.0),
    max_step: 0.8,
    valid: (300.0, 1100.0),
};

impl WalkBounds {
    fn start<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.start.0..=self.start.1)
    }

    fn step<R: Rng>(&self, rng: &mut R, value: f64) -> f64 {
        let next = value + rng.gen_range(-self.max_step..=self.max_step);
        next.clamp(self.valid.0, self.valid.1)
    }
}

/// Bounded random walk over temperature, humidity and pressure.
///
/// The walk keeps full precision internally; only the emitted readings are
/// rounded.
#[derive(Debug)]
pub struct RandomWalk<R> {
    rng: R,
    temperature_c: f64,
    humidity_pct: f64,
    pressure_hpa: f64,
}

impl RandomWalk<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomWalk<R> {
    pub fn new(mut rng: R) -> Self {
        let temperature_c = TEMPERATURE.start(&mut rng);
        let humidity_pct = HUMIDITY.start(&mut rng);
        let pressure_hpa = PRESSURE.start(&mut rng);
        Self::starting_at(rng, temperature_c, humidity_pct, pressure_hpa)
    }

    pub fn starting_at(rng: R, temperature_c: f64, humidity_pct: f64, pressure_hpa: f64) -> Self {
        Self {
            rng,
            temperature_c,
            humidity_pct,
            pressure_hpa,
        }
    }

    /// Perturb every quantity once and stamp the result with the current time.
    pub fn step(&mut self) -> Reading {
        self.temperature_c = TEMPERATURE.step(&mut self.rng, self.temperature_c);
        self.humidity_pct = HUMIDITY.step(&mut self.rng, self.humidity_pct);
        self.pressure_hpa = PRESSURE.step(&mut self.rng, self.pressure_hpa);
        Reading::now(self.temperature_c, self.humidity_pct, self.pressure_hpa)
    }
}

/// Periodic producer feeding the sample buffer.
pub struct SampleGenerator<R> {
    walk: RandomWalk<R>,
    period: Duration,
}

impl<R: Rng> SampleGenerator<R> {
    /// Periods shorter than a millisecond are raised to one.
    pub fn new(walk: RandomWalk<R>, period: Duration) -> Self {
        Self {
            walk,
            period: period.max(MIN_PERIOD),
        }
    }

    /// Produce one reading per period until `stop` is set.
    ///
    /// Returns how many readings were appended.
    pub fn run(mut self, buffer: &SampleBuffer, stop: &StopSignal) -> u64 {
        info!(
            period_ms = self.period.as_millis() as u64,
            "starting sample generator"
        );

        let mut produced = 0;
        while !stop.is_set() {
            let reading = self.walk.step();
            buffer.append(reading);
            produced += 1;
            debug!(
                temperature = reading.temperature_c,
                humidity = reading.humidity_pct,
                pressure = reading.pressure_hpa,
                "generated reading"
            );

            if stop.wait_timeout(self.period) {
                break;
            }
        }

        info!(produced, "stopping sample generator");
        produced
    }
}
