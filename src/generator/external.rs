//! Adapter for the SPLCATool covering array generator.
//!
//! The tool is run as a separate process on a DIMACS export of the constraints. It writes a
//! transposed table with one row per feature and one column per product:
//!
//! ```text
//! Feature\Product;0;1;2;
//! Root;X;X;X;
//! Gui;X;-;X;
//! ```
//!
//! `X` marks a selected feature, `-` a deselected one.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use log::{debug, info};

use super::{ConfigurationGenerator, Episode};
use crate::cnf::Cnf;
use crate::dimacs;
use crate::error::{Error, Result};
use crate::literal_set::LiteralSet;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SplcaAlgorithm {
    Icpl,
    Chvatal,
}

impl SplcaAlgorithm {
    /// The name the tool expects after `-a`.
    pub fn as_str(self) -> &'static str {
        match self {
            SplcaAlgorithm::Icpl => "ICPL",
            SplcaAlgorithm::Chvatal => "Chvatal",
        }
    }
}

impl fmt::Display for SplcaAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs SPLCATool once and emits the configurations it produced.
///
/// The first step launches the tool, every further step emits one configuration.
#[derive(Debug)]
pub struct SplcaTool {
    cnf: Arc<Cnf>,
    program: PathBuf,
    args: Vec<String>,
    algorithm: SplcaAlgorithm,
    t: usize,
    limit: usize,
    results: Option<VecDeque<LiteralSet>>,
}

impl SplcaTool {
    pub fn new(cnf: Arc<Cnf>, program: impl Into<PathBuf>, algorithm: SplcaAlgorithm, t: usize, limit: usize) -> Result<Self> {
        if t == 0 {
            return Err(Error::config("t must be at least 1"));
        }
        if limit == 0 {
            return Err(Error::config("limit must be at least 1"));
        }
        Ok(Self {
            cnf,
            program: program.into(),
            args: Vec::new(),
            algorithm,
            t,
            limit,
            results: None,
        })
    }

    /// Arguments passed before the tool's own options, e.g. `-jar splcatool.jar` for `java`.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn algorithm(&self) -> SplcaAlgorithm {
        self.algorithm
    }

    fn run(&self) -> Result<Vec<LiteralSet>> {
        let dir = tempfile::Builder::new().prefix("fm-sampler-").tempdir()?;
        let model = dir.path().join("model.dimacs");
        dimacs::write(&self.cnf, BufWriter::new(File::create(&model)?))?;

        let strength = self.t.to_string();
        info!(
            "Running {} ({}, t = {}) on {} variables",
            self.program.display(),
            self.algorithm,
            self.t,
            self.cnf.num_vars()
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(["-t", "t_wise", "-a", self.algorithm.as_str(), "-fm"])
            .arg(&model)
            .args(["-s", strength.as_str()])
            .current_dir(dir.path())
            .output()
            .map_err(|e| Error::External(format!("cannot launch {}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            return Err(Error::External(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let table = dir.path().join(format!("model.dimacs.ca{}.csv", self.t));
        let file = File::open(&table)
            .map_err(|e| Error::External(format!("cannot open {}: {}", table.display(), e)))?;
        parse_covering_array(BufReader::new(file), &self.cnf)
    }
}

impl ConfigurationGenerator for SplcaTool {
    fn name(&self) -> &'static str {
        match self.algorithm {
            SplcaAlgorithm::Icpl => "icpl",
            SplcaAlgorithm::Chvatal => "chvatal",
        }
    }

    fn total_work(&self) -> Option<u64> {
        self.results.as_ref().map(|r| r.len() as u64 + 1)
    }

    fn step(&mut self) -> Result<Episode> {
        match &mut self.results {
            None => {
                let mut configs = self.run()?;
                if configs.len() > self.limit {
                    debug!("Truncating {} configurations to the limit of {}", configs.len(), self.limit);
                    configs.truncate(self.limit);
                }
                self.results = Some(configs.into());
                Ok(Episode::Pending)
            }
            Some(results) => Ok(results.pop_front().map_or(Episode::Exhausted, Episode::Accepted)),
        }
    }
}

/// Parses the transposed covering array written by SPLCATool.
///
/// Rows are mapped onto the variables of `cnf` by feature name; rows of unknown features are
/// skipped, and variables without a row stay unset.
pub fn parse_covering_array<R: BufRead>(reader: R, cnf: &Cnf) -> Result<Vec<LiteralSet>> {
    let mut lines = reader.lines().enumerate();
    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(Error::External("empty covering array".into())),
    };
    let products = cells(&header).len().saturating_sub(1);
    let mut models = vec![vec![0i32; cnf.num_vars()]; products];

    for (i, line) in lines {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = cells(&line);
        let Some(var) = cnf.var_by_name(row[0]) else {
            debug!("Ignoring unknown feature '{}'", row[0]);
            continue;
        };
        if row.len() != products + 1 {
            return Err(Error::External(format!(
                "line {}: expected {} products, found {}",
                line_no,
                products,
                row.len() - 1
            )));
        }
        for (model, cell) in models.iter_mut().zip(&row[1..]) {
            model[var.index()] = match *cell {
                "X" => var.pos().to_dimacs(),
                "-" => var.neg().to_dimacs(),
                other => {
                    return Err(Error::External(format!("line {}: invalid cell '{}'", line_no, other)));
                }
            };
        }
    }
    Ok(models.into_iter().map(LiteralSet::from_model).collect())
}

fn cells(line: &str) -> Vec<&str> {
    let line = line.trim_end();
    line.strip_suffix(';').unwrap_or(line).split(';').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::generator::GenerationState;
    use crate::monitor::NullMonitor;

    fn cnf() -> Arc<Cnf> {
        Arc::new(Cnf::new(vec!["Root".into(), "Gui".into(), "Cli".into()], Vec::new()).unwrap())
    }

    #[test]
    fn test_parse_covering_array() {
        let input = "Feature\\Product;0;1;2;\nRoot;X;X;X;\nGui;X;-;X;\nCli;-;X;X;\n";
        let configs = parse_covering_array(input.as_bytes(), &cnf()).unwrap();
        assert_eq!(
            configs,
            vec![
                LiteralSet::from_dimacs(3, [1, 2, -3]),
                LiteralSet::from_dimacs(3, [1, -2, 3]),
                LiteralSet::from_dimacs(3, [1, 2, 3]),
            ]
        );
    }

    #[test]
    fn test_unknown_and_missing_features() {
        let input = "Feature\\Product;0;1\nGui;X;-\nHidden;X;X\n";
        let configs = parse_covering_array(input.as_bytes(), &cnf()).unwrap();
        assert_eq!(
            configs,
            vec![LiteralSet::from_dimacs(3, [2]), LiteralSet::from_dimacs(3, [-2])]
        );
    }

    #[test]
    fn test_malformed_rows() {
        let input = "Feature\\Product;0;1\nGui;X\n";
        assert!(matches!(parse_covering_array(input.as_bytes(), &cnf()), Err(Error::External(_))));
        let input = "Feature\\Product;0\nGui;1\n";
        assert!(matches!(parse_covering_array(input.as_bytes(), &cnf()), Err(Error::External(_))));
        assert!(matches!(parse_covering_array("".as_bytes(), &cnf()), Err(Error::External(_))));
    }

    #[test]
    fn test_missing_program_fails_generation() {
        let tool = SplcaTool::new(cnf(), "/nonexistent/splcatool", SplcaAlgorithm::Icpl, 2, usize::MAX).unwrap();
        let outcome = tool.generate(NullMonitor).finish();
        assert!(matches!(outcome.state, GenerationState::Failed { error: Some(_), .. }));
        assert!(outcome.configurations.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_tool_in_scratch_directory() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempfile::tempdir().unwrap();
        let log = home.path().join("cwd.txt");
        let script = home.path().join("fake-splcatool");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\npwd > '{}'\nprintf 'Feature;0;1;\\nRoot;X;X;\\nGui;X;-;\\nCli;-;X;\\n' > model.dimacs.ca2.csv\n",
                log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tool = SplcaTool::new(cnf(), &script, SplcaAlgorithm::Chvatal, 2, usize::MAX).unwrap();
        let outcome = tool.generate(NullMonitor).finish();
        assert_eq!(outcome.state, GenerationState::Completed);
        assert_eq!(
            outcome.configurations,
            vec![LiteralSet::from_dimacs(3, [1, 2, -3]), LiteralSet::from_dimacs(3, [1, -2, 3])]
        );

        let scratch = std::fs::read_to_string(&log).unwrap();
        assert!(!std::path::Path::new(scratch.trim()).exists());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SplcaTool::new(cnf(), "splcatool", SplcaAlgorithm::Chvatal, 0, 1).is_err());
        assert!(SplcaTool::new(cnf(), "splcatool", SplcaAlgorithm::Chvatal, 2, 0).is_err());
    }
}
