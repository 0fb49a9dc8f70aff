//! Generator selection and parameters.
//!
//! [`GeneratorConfig`] collects everything needed to set up a run and builds the matching
//! generator:
//!
//! ```
//! use std::sync::Arc;
//!
//! use fm_sampler::cnf::Cnf;
//! use fm_sampler::config::{Algorithm, GeneratorConfig};
//! use fm_sampler::generator::ConfigurationGenerator;
//!
//! let cnf = Arc::new(Cnf::from_dimacs_clauses(3, [vec![1, 2]]).unwrap());
//! let config = GeneratorConfig::new(Algorithm::TWise).with_t(2).with_iterations(3);
//! let generator = config.build(cnf).unwrap();
//! assert_eq!(generator.name(), "t-wise");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cnf::Cnf;
use crate::error::{Error, Result};
use crate::generator::{
    AllConfigurations, ConfigurationGenerator, PairWise, RandomConfigurations, SplcaAlgorithm, SplcaTool, TWise,
};
use crate::literal_set::LiteralSet;

pub const DEFAULT_SEED: u64 = 123456789;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Algorithm {
    All,
    Random,
    PairWise,
    TWise,
    Icpl,
    Chvatal,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::All => "all",
            Algorithm::Random => "random",
            Algorithm::PairWise => "pairwise",
            Algorithm::TWise => "twise",
            Algorithm::Icpl => "icpl",
            Algorithm::Chvatal => "chvatal",
        }
    }

    /// Returns true if the algorithm covers interactions of a given strength.
    pub fn uses_strength(self) -> bool {
        matches!(self, Algorithm::TWise | Algorithm::Icpl | Algorithm::Chvatal)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Parses an algorithm name, case-insensitively. `incling` and `yasa` are accepted as
    /// aliases of `pairwise` and `twise`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Algorithm::All),
            "random" => Ok(Algorithm::Random),
            "pairwise" | "incling" => Ok(Algorithm::PairWise),
            "twise" | "yasa" => Ok(Algorithm::TWise),
            "icpl" => Ok(Algorithm::Icpl),
            "chvatal" => Ok(Algorithm::Chvatal),
            _ => Err(Error::config(format!("unknown algorithm '{}'", s))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of a generator run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub algorithm: Algorithm,
    /// Interaction strength for covering algorithms.
    pub t: usize,
    /// Construction plus refinement passes of the t-wise algorithm.
    pub iterations: usize,
    /// Maximum number of configurations.
    pub limit: usize,
    pub seed: u64,
    pub allow_duplicates: bool,
    /// Full configurations whose distribution random sampling follows.
    pub reference_sample: Option<Vec<LiteralSet>>,
    /// Conflicts per solver episode before it is given up as unresolved.
    pub conflict_budget: Option<u64>,
    /// Unresolved episodes tolerated before the run fails.
    pub max_unresolved: Option<usize>,
    /// Program (and leading arguments) of the external covering array tool.
    pub external_command: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::All,
            t: 2,
            iterations: 1,
            limit: usize::MAX,
            seed: DEFAULT_SEED,
            allow_duplicates: false,
            reference_sample: None,
            conflict_budget: None,
            max_unresolved: None,
            external_command: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    pub fn with_t(mut self, t: usize) -> Self {
        self.t = t;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_reference_sample(mut self, sample: Vec<LiteralSet>) -> Self {
        self.reference_sample = Some(sample);
        self
    }

    pub fn with_conflict_budget(mut self, budget: Option<u64>) -> Self {
        self.conflict_budget = budget;
        self
    }

    pub fn with_max_unresolved(mut self, max: Option<usize>) -> Self {
        self.max_unresolved = max;
        self
    }

    pub fn with_external_command(mut self, command: Vec<String>) -> Self {
        self.external_command = command;
        self
    }

    /// Checks the parameters without building anything.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::config("limit must be at least 1"));
        }
        if self.algorithm.uses_strength() && self.t == 0 {
            return Err(Error::config("t must be at least 1"));
        }
        if self.algorithm == Algorithm::TWise && self.iterations == 0 {
            return Err(Error::config("the number of iterations must be at least 1"));
        }
        if matches!(self.algorithm, Algorithm::Icpl | Algorithm::Chvatal) && self.external_command.is_empty() {
            return Err(Error::config(format!("{} requires an external tool", self.algorithm)));
        }
        if self.reference_sample.is_some() && self.algorithm != Algorithm::Random {
            return Err(Error::config("a reference sample is only used by random sampling"));
        }
        Ok(())
    }

    /// Builds the generator for `cnf`.
    pub fn build(&self, cnf: Arc<Cnf>) -> Result<Box<dyn ConfigurationGenerator>> {
        self.validate()?;
        let generator: Box<dyn ConfigurationGenerator> = match self.algorithm {
            Algorithm::All => {
                Box::new(AllConfigurations::new(cnf, self.limit)?.with_conflict_budget(self.conflict_budget))
            }
            Algorithm::Random => {
                let mut generator = RandomConfigurations::new(cnf, self.limit, self.seed)?
                    .allow_duplicates(self.allow_duplicates)
                    .with_conflict_budget(self.conflict_budget);
                if let Some(sample) = &self.reference_sample {
                    generator = generator.with_reference_sample(sample.clone())?;
                }
                Box::new(generator)
            }
            Algorithm::PairWise => {
                Box::new(PairWise::new(cnf, self.limit)?.with_conflict_budget(self.conflict_budget))
            }
            Algorithm::TWise => Box::new(
                TWise::new(cnf, self.t, self.iterations, self.seed)?.with_conflict_budget(self.conflict_budget),
            ),
            Algorithm::Icpl | Algorithm::Chvatal => {
                let algorithm = if self.algorithm == Algorithm::Icpl {
                    SplcaAlgorithm::Icpl
                } else {
                    SplcaAlgorithm::Chvatal
                };
                let (program, args) = self
                    .external_command
                    .split_first()
                    .ok_or_else(|| Error::config(format!("{} requires an external tool", self.algorithm)))?;
                Box::new(SplcaTool::new(cnf, program, algorithm, self.t, self.limit)?.with_args(args.to_vec()))
            }
        };
        Ok(generator)
    }
}
