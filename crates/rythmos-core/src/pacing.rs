// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Accumulator-based catch-up arithmetic for a fixed-step/elastic-step pair.
//!
//! [`Pacing`] is plain arithmetic over durations: the caller feeds in elapsed
//! wall time and drains the resulting work. It depends on no clock or timer
//! primitive, so it is deterministic and portable across any concurrency
//! substrate.

use std::time::Duration;

use crate::error::LoopError;

/// Default bound on fixed-step catch-up, in steps of the simulation period.
pub const DEFAULT_MAX_CATCH_UP_STEPS: u32 = 8;

/// Tracks unspent wall time for both activities and decides how much work
/// each one owes.
///
/// The simulation accumulator is drained in whole fixed steps; the render
/// accumulator is drained at most once per tick, handing out the
/// whole-period multiple of its backlog and keeping the remainder.
#[derive(Debug, Clone)]
pub struct Pacing {
    render_period: Duration,
    simulation_period: Duration,
    render_accumulator: Duration,
    simulation_accumulator: Duration,
    max_simulation_backlog: Option<Duration>,
}

impl Pacing {
    /// Validates the periods and builds a pacing state with empty backlogs.
    ///
    /// `Duration` is unsigned, so the positivity requirement on both periods
    /// reduces to rejecting zero. `max_catch_up_steps` bounds how much
    /// simulation backlog may accumulate, in whole steps; `None` disables the
    /// bound, which lets a sustained overload starve the render activity
    /// indefinitely.
    pub fn new(
        render_period: Duration,
        simulation_period: Duration,
        max_catch_up_steps: Option<u32>,
    ) -> Result<Self, LoopError> {
        if render_period.is_zero() {
            return Err(LoopError::Config {
                param: "render period",
                problem: "must be non-zero",
            });
        }
        if simulation_period.is_zero() {
            return Err(LoopError::Config {
                param: "simulation period",
                problem: "must be non-zero",
            });
        }
        if max_catch_up_steps == Some(0) {
            return Err(LoopError::Config {
                param: "max catch-up steps",
                problem: "must be non-zero when set",
            });
        }

        let max_simulation_backlog =
            max_catch_up_steps.map(|steps| simulation_period.saturating_mul(steps));

        Ok(Self {
            render_period,
            simulation_period,
            render_accumulator: Duration::ZERO,
            simulation_accumulator: Duration::ZERO,
            max_simulation_backlog,
        })
    }

    /// The configured render period.
    pub fn render_period(&self) -> Duration {
        self.render_period
    }

    /// The configured simulation period.
    pub fn simulation_period(&self) -> Duration {
        self.simulation_period
    }

    /// The base tick period: the greatest common divisor of the two periods,
    /// so every deadline of either activity lands exactly on a tick boundary,
    /// never early.
    pub fn base_period(&self) -> Duration {
        gcd(self.render_period, self.simulation_period)
    }

    /// Feeds elapsed wall time into both accumulators.
    ///
    /// Returns the wall time discarded by the simulation backlog bound; zero
    /// while the backlog stays within bound. Discarded time is gone: the
    /// simulation clock falls permanently behind wall time by that amount.
    pub fn advance(&mut self, delta: Duration) -> Duration {
        self.render_accumulator += delta;
        self.simulation_accumulator += delta;

        match self.max_simulation_backlog {
            Some(bound) if self.simulation_accumulator > bound => {
                let dropped = self.simulation_accumulator - bound;
                self.simulation_accumulator = bound;
                dropped
            }
            _ => Duration::ZERO,
        }
    }

    /// Pops one fixed step if a full simulation period has accumulated.
    ///
    /// The returned step is always exactly the simulation period. Call in a
    /// loop to drain the backlog; once this returns `None`, the remaining
    /// backlog is strictly smaller than one period.
    pub fn next_simulation_step(&mut self) -> Option<Duration> {
        if self.simulation_accumulator >= self.simulation_period {
            self.simulation_accumulator -= self.simulation_period;
            Some(self.simulation_period)
        } else {
            None
        }
    }

    /// Takes the elastic render step if at least one render period has
    /// accumulated.
    ///
    /// Hands out the whole-period multiple of the backlog and keeps the
    /// remainder, so the step is never smaller than one render period and
    /// rendering never exceeds the configured rate. Rendering catches up by
    /// being handed a larger step, never by running twice.
    pub fn next_render_step(&mut self) -> Option<Duration> {
        if self.render_accumulator < self.render_period {
            return None;
        }
        let leftover = duration_rem(self.render_accumulator, self.render_period);
        let work = self.render_accumulator - leftover;
        self.render_accumulator = leftover;
        Some(work)
    }

    /// Unspent simulation wall time.
    pub fn simulation_backlog(&self) -> Duration {
        self.simulation_accumulator
    }

    /// Unspent render wall time.
    pub fn render_backlog(&self) -> Duration {
        self.render_accumulator
    }
}

fn gcd(a: Duration, b: Duration) -> Duration {
    let (mut a, mut b) = (a.as_nanos(), b.as_nanos());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    Duration::from_nanos(a as u64)
}

fn duration_rem(value: Duration, period: Duration) -> Duration {
    Duration::from_nanos((value.as_nanos() % period.as_nanos()) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoopError;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn base_period_is_the_gcd_of_both_rates() {
        let pacing = Pacing::new(ms(16), ms(10), None).expect("valid pacing");
        assert_eq!(pacing.base_period(), ms(2));

        let pacing = Pacing::new(ms(16), ms(16), None).expect("valid pacing");
        assert_eq!(pacing.base_period(), ms(16));

        let pacing = Pacing::new(ms(7), ms(3), None).expect("valid pacing");
        assert_eq!(pacing.base_period(), ms(1));
    }

    #[test]
    fn zero_periods_are_rejected() {
        let err = Pacing::new(Duration::ZERO, ms(10), None)
            .err()
            .expect("zero render period must be rejected");
        assert!(matches!(
            err,
            LoopError::Config {
                param: "render period",
                ..
            }
        ));

        let err = Pacing::new(ms(16), Duration::ZERO, None)
            .err()
            .expect("zero simulation period must be rejected");
        assert!(matches!(
            err,
            LoopError::Config {
                param: "simulation period",
                ..
            }
        ));
    }

    #[test]
    fn zero_step_bound_is_rejected() {
        let err = Pacing::new(ms(16), ms(10), Some(0))
            .err()
            .expect("a zero-step bound would drop all simulation time");
        assert!(matches!(
            err,
            LoopError::Config {
                param: "max catch-up steps",
                ..
            }
        ));
    }

    #[test]
    fn fixed_steps_are_always_exactly_one_period() {
        let mut pacing = Pacing::new(ms(16), ms(10), None).expect("valid pacing");

        for delta in [ms(3), ms(7), ms(25), ms(1), ms(100)] {
            pacing.advance(delta);
            while let Some(step) = pacing.next_simulation_step() {
                assert_eq!(step, ms(10));
            }
            assert!(
                pacing.simulation_backlog() < ms(10),
                "backlog {:?} must stay below one period after draining",
                pacing.simulation_backlog()
            );
        }
    }

    #[test]
    fn render_step_is_the_whole_period_multiple() {
        let mut pacing = Pacing::new(ms(16), ms(10), None).expect("valid pacing");

        pacing.advance(ms(40));
        assert_eq!(pacing.next_render_step(), Some(ms(32)));
        assert_eq!(pacing.render_backlog(), ms(8));

        // Not due again until another full period accumulates.
        assert_eq!(pacing.next_render_step(), None);
        pacing.advance(ms(8));
        assert_eq!(pacing.next_render_step(), Some(ms(16)));
        assert_eq!(pacing.render_backlog(), Duration::ZERO);
    }

    #[test]
    fn render_step_is_withheld_until_due() {
        let mut pacing = Pacing::new(ms(16), ms(10), None).expect("valid pacing");
        pacing.advance(ms(15));
        assert_eq!(pacing.next_render_step(), None);
        assert_eq!(pacing.render_backlog(), ms(15));
    }

    #[test]
    fn hundred_milliseconds_at_sixteen_and_ten() {
        // 100ms of wall time in base ticks: 10 fixed steps, 6 render steps.
        let mut pacing =
            Pacing::new(ms(16), ms(10), Some(DEFAULT_MAX_CATCH_UP_STEPS)).expect("valid pacing");
        let base = pacing.base_period();
        assert_eq!(base, ms(2));

        let mut simulation_steps = Vec::new();
        let mut render_steps = Vec::new();
        for _ in 0..50 {
            pacing.advance(base);
            while let Some(step) = pacing.next_simulation_step() {
                simulation_steps.push(step);
            }
            if let Some(work) = pacing.next_render_step() {
                render_steps.push(work);
            }
        }

        assert_eq!(simulation_steps.len(), 10);
        assert!(simulation_steps.iter().all(|step| *step == ms(10)));

        assert_eq!(render_steps.len(), 6);
        assert!(render_steps.iter().all(|work| *work == ms(16)));
    }

    #[test]
    fn backlog_bound_drops_excess_wall_time() {
        let mut pacing = Pacing::new(ms(16), ms(10), Some(8)).expect("valid pacing");

        let dropped = pacing.advance(Duration::from_secs(1));
        assert_eq!(dropped, ms(920));
        assert_eq!(pacing.simulation_backlog(), ms(80));

        let mut steps = 0;
        while pacing.next_simulation_step().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 8);
        assert_eq!(pacing.simulation_backlog(), Duration::ZERO);

        // The render accumulator is not clamped; it self-limits through the
        // leftover arithmetic.
        assert_eq!(pacing.next_render_step(), Some(ms(992)));
        assert_eq!(pacing.render_backlog(), ms(8));
    }

    #[test]
    fn unbounded_backlog_when_disabled() {
        let mut pacing = Pacing::new(ms(16), ms(10), None).expect("valid pacing");

        let dropped = pacing.advance(Duration::from_secs(1));
        assert_eq!(dropped, Duration::ZERO);

        let mut steps = 0;
        while pacing.next_simulation_step().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 100);
    }
}
