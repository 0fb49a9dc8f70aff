//! Configuration generators.
//!
//! A generator performs one unit of work per [`step`][ConfigurationGenerator::step], which is
//! (at most) one solver episode, and reports what came of it as an [`Episode`]. The shared
//! [`Generation`] driver turns a generator into a lazy iterator of configurations, checks for
//! cancellation before every episode and reports progress after it.
//!
//! ```
//! use std::sync::Arc;
//!
//! use fm_sampler::cnf::Cnf;
//! use fm_sampler::generator::{AllConfigurations, ConfigurationGenerator};
//! use fm_sampler::monitor::NullMonitor;
//!
//! // x2 must be true, x1 is free.
//! let cnf = Arc::new(Cnf::from_dimacs_clauses(2, [vec![1, 2], vec![-1, 2]]).unwrap());
//! let configs: Vec<_> = AllConfigurations::new(cnf, usize::MAX).unwrap().generate(NullMonitor).collect();
//! assert_eq!(configs.len(), 2);
//! ```

mod all;
mod external;
mod pairwise;
mod random;
mod twise;

pub use all::AllConfigurations;
pub use external::{parse_covering_array, SplcaAlgorithm, SplcaTool};
pub use pairwise::PairWise;
pub use random::RandomConfigurations;
pub use twise::TWise;

use log::{info, warn};

use crate::error::Result;
use crate::literal_set::LiteralSet;
use crate::monitor::Monitor;

/// Result of a single unit of work.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Episode {
    /// A new configuration was produced.
    Accepted(LiteralSet),
    /// Work was done, but no configuration is ready.
    Pending,
    /// The solver could not decide; the target was skipped.
    Unresolved,
    /// Nothing left to do.
    Exhausted,
}

/// A generation policy driven one episode at a time.
pub trait ConfigurationGenerator {
    fn name(&self) -> &'static str;

    /// Total number of steps, if already known.
    fn total_work(&self) -> Option<u64> {
        None
    }

    /// Performs one unit of work.
    fn step(&mut self) -> Result<Episode>;

    /// Wraps the generator into a lazy sequence of configurations.
    fn generate<M: Monitor>(self, monitor: M) -> Generation<Self, M>
    where
        Self: Sized,
    {
        Generation::new(self, monitor)
    }
}

impl<G: ConfigurationGenerator + ?Sized> ConfigurationGenerator for Box<G> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn total_work(&self) -> Option<u64> {
        (**self).total_work()
    }

    fn step(&mut self) -> Result<Episode> {
        (**self).step()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GenerationState {
    Idle,
    Running,
    /// The generator ran out of work. Episodes may still have been unresolved along the way,
    /// up to the tolerance set with [`Generation::with_max_unresolved`].
    Completed,
    Cancelled,
    Failed {
        unresolved: usize,
        error: Option<String>,
    },
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationState::Completed | GenerationState::Cancelled | GenerationState::Failed { .. }
        )
    }
}

/// Final state of a run together with every configuration it accepted, including those
/// already taken from the iterator before [`Generation::finish`].
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub state: GenerationState,
    pub configurations: Vec<LiteralSet>,
    pub unresolved: usize,
}

/// Drives a [`ConfigurationGenerator`] as an iterator of configurations.
///
/// `Idle -> Running -> {Completed, Cancelled, Failed}`. Once terminal, the iterator is fused.
#[derive(Debug)]
pub struct Generation<G, M> {
    generator: G,
    monitor: M,
    state: GenerationState,
    accepted: Vec<LiteralSet>,
    unresolved: usize,
    max_unresolved: Option<usize>,
    total: Option<u64>,
}

impl<G: ConfigurationGenerator, M: Monitor> Generation<G, M> {
    pub fn new(generator: G, monitor: M) -> Self {
        Self {
            generator,
            monitor,
            state: GenerationState::Idle,
            accepted: Vec::new(),
            unresolved: 0,
            max_unresolved: None,
            total: None,
        }
    }

    /// Fails the run once more than `max` episodes were unresolved. `None` tolerates any number.
    pub fn with_max_unresolved(mut self, max: Option<usize>) -> Self {
        self.max_unresolved = max;
        self
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn into_generator(self) -> G {
        self.generator
    }

    pub fn accepted(&self) -> usize {
        self.accepted.len()
    }

    /// Configurations accepted so far.
    pub fn configurations(&self) -> &[LiteralSet] {
        &self.accepted
    }

    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    /// Runs the remaining sequence to its end and returns the outcome.
    pub fn finish(mut self) -> GenerationOutcome {
        self.by_ref().for_each(drop);
        GenerationOutcome {
            state: self.state,
            configurations: self.accepted,
            unresolved: self.unresolved,
        }
    }

    fn sync_total(&mut self) {
        let total = self.generator.total_work();
        if total != self.total {
            self.total = total;
            self.monitor.set_total(total);
        }
    }

    fn fail(&mut self, error: Option<String>) {
        warn!(
            "{}: failed after {} configurations ({} unresolved)",
            self.generator.name(),
            self.accepted.len(),
            self.unresolved
        );
        self.state = GenerationState::Failed {
            unresolved: self.unresolved,
            error,
        };
    }
}

impl<G: ConfigurationGenerator, M: Monitor> Iterator for Generation<G, M> {
    type Item = LiteralSet;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            GenerationState::Idle => {
                info!("{}: starting", self.generator.name());
                self.state = GenerationState::Running;
                self.sync_total();
            }
            GenerationState::Running => {}
            _ => return None,
        }

        loop {
            if self.monitor.is_cancelled() {
                info!("{}: cancelled after {} configurations", self.generator.name(), self.accepted.len());
                self.state = GenerationState::Cancelled;
                return None;
            }

            let episode = self.generator.step();
            self.monitor.report_step();
            self.sync_total();

            match episode {
                Ok(Episode::Accepted(config)) => {
                    self.accepted.push(config.clone());
                    return Some(config);
                }
                Ok(Episode::Pending) => {}
                Ok(Episode::Unresolved) => {
                    self.unresolved += 1;
                    if self.max_unresolved.is_some_and(|max| self.unresolved > max) {
                        self.fail(None);
                        return None;
                    }
                }
                Ok(Episode::Exhausted) => {
                    info!(
                        "{}: completed with {} configurations ({} unresolved)",
                        self.generator.name(),
                        self.accepted.len(),
                        self.unresolved
                    );
                    self.state = GenerationState::Completed;
                    return None;
                }
                Err(e) => {
                    self.fail(Some(e.to_string()));
                    return None;
                }
            }
        }
    }
}

impl<G: ConfigurationGenerator, M: Monitor> std::iter::FusedIterator for Generation<G, M> {}
