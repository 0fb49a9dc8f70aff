//! Reading and writing constraints in DIMACS CNF format.
//!
//! - Comments start with `c`. A comment of the form `c <id> <name>` or `c feature <id> <name>`
//!   names variable `<id>`; unnamed variables are called `x<id>`.
//! - Problem line: `p cnf <num_vars> <num_clauses>`, required before the first clause.
//! - Clauses are whitespace-separated literals terminated by `0` and may span several lines.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};

use log::{debug, warn};

use crate::cnf::{Clause, Cnf};
use crate::error::{Error, Result};

/// Parses a DIMACS CNF document.
pub fn parse<R: Read>(reader: R) -> Result<Cnf> {
    let reader = BufReader::new(reader);
    let mut names: HashMap<u32, String> = HashMap::new();
    let mut header: Option<(usize, usize)> = None;
    let mut clauses = Vec::new();
    let mut pending: Vec<i32> = Vec::new();
    let mut pending_line = 0;
    let mut last_line = 0;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        last_line = line_no;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if line.starts_with('c') {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (id, rest) = match parts.get(1) {
                Some(&"feature") => (parts.get(2), parts.get(3..)),
                _ => (parts.get(1), parts.get(2..)),
            };
            if let (Some(Ok(id)), Some(rest)) = (id.map(|s| s.parse::<u32>()), rest) {
                if !rest.is_empty() {
                    names.insert(id, rest.join(" "));
                }
            }
            continue;
        }

        if line.starts_with('p') {
            if header.is_some() {
                return Err(Error::load(line_no, "duplicate problem line"));
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 4 || parts[1] != "cnf" {
                return Err(Error::load(line_no, format!("invalid problem line '{}'", line)));
            }
            let num_vars = parts[2]
                .parse::<usize>()
                .map_err(|_| Error::load(line_no, format!("invalid number of variables '{}'", parts[2])))?;
            let num_clauses = parts[3]
                .parse::<usize>()
                .map_err(|_| Error::load(line_no, format!("invalid number of clauses '{}'", parts[3])))?;
            header = Some((num_vars, num_clauses));
            continue;
        }

        let Some((num_vars, _)) = header else {
            return Err(Error::load(line_no, "clause before problem line"));
        };
        for token in line.split_whitespace() {
            let lit: i32 = token
                .parse()
                .map_err(|_| Error::load(line_no, format!("invalid literal '{}'", token)))?;
            if lit == 0 {
                let clause = Clause::new(std::mem::take(&mut pending)).map_err(|e| at_line(e, pending_line.max(1)))?;
                clauses.push(clause);
                continue;
            }
            if lit.unsigned_abs() as usize > num_vars {
                return Err(Error::load(
                    line_no,
                    format!("literal {} exceeds the declared {} variables", lit, num_vars),
                ));
            }
            if pending.is_empty() {
                pending_line = line_no;
            }
            pending.push(lit);
        }
    }

    let Some((num_vars, num_clauses)) = header else {
        return Err(Error::load(last_line, "missing problem line"));
    };
    if !pending.is_empty() {
        return Err(Error::load(pending_line, "clause is not terminated by 0"));
    }
    if clauses.len() != num_clauses {
        warn!("Expected {} clauses but parsed {}", num_clauses, clauses.len());
    }

    let mut var_names = Vec::with_capacity(num_vars);
    for id in 1..=num_vars as u32 {
        var_names.push(names.remove(&id).unwrap_or_else(|| format!("x{}", id)));
    }
    if !names.is_empty() {
        warn!("Ignoring {} names of undeclared variables", names.len());
    }
    debug!("Parsed DIMACS with {} variables and {} clauses", num_vars, clauses.len());

    Cnf::new(var_names, clauses)
}

fn at_line(error: Error, line: usize) -> Error {
    match error {
        Error::InvalidConstraint(message) | Error::ConstraintLoad { message, .. } => Error::load(line, message),
        other => other,
    }
}

/// Writes `cnf` in DIMACS CNF format, including a `c <id> <name>` line per variable.
pub fn write<W: Write>(cnf: &Cnf, mut writer: W) -> Result<()> {
    for (i, name) in cnf.names().iter().enumerate() {
        writeln!(writer, "c {} {}", i + 1, name)?;
    }
    writeln!(writer, "p cnf {} {}", cnf.num_vars(), cnf.clauses().len())?;
    for clause in cnf.clauses() {
        for lit in clause.literals() {
            write!(writer, "{} ", lit.to_dimacs())?;
        }
        writeln!(writer, "0")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::types::Var;

    #[test]
    fn test_parse_dimacs() {
        let input = r#"
c Simple feature model
c 1 Base
c feature 2 Feature A
p cnf 3 3
1 0
-2 1 0
-2 -3 0
"#;
        let cnf = parse(input.as_bytes()).unwrap();
        assert_eq!(cnf.num_vars(), 3);
        assert_eq!(cnf.clauses().len(), 3);
        assert_eq!(cnf.names(), &["Base", "Feature A", "x3"]);
        assert_eq!(cnf.var_by_name("Feature A"), Some(Var::new(2)));
    }

    #[test]
    fn test_multiline_clause() {
        let cnf = parse("p cnf 3 1\n1 2\n -3\n0\n".as_bytes()).unwrap();
        assert_eq!(cnf.clauses().len(), 1);
        assert_eq!(cnf.clauses()[0].len(), 3);
    }

    #[test]
    fn test_several_clauses_on_one_line() {
        let cnf = parse("p cnf 2 2\n1 0 -2 0\n".as_bytes()).unwrap();
        assert_eq!(cnf.clauses().len(), 2);
    }

    #[test]
    fn test_clause_count_mismatch_is_tolerated() {
        let cnf = parse("p cnf 2 5\n1 2 0\n".as_bytes()).unwrap();
        assert_eq!(cnf.clauses().len(), 1);
    }

    #[test]
    fn test_missing_problem_line() {
        assert!(matches!(parse("c nothing\n".as_bytes()), Err(Error::ConstraintLoad { .. })));
        assert!(matches!(
            parse("1 2 0\n".as_bytes()),
            Err(Error::ConstraintLoad { line: 1, .. })
        ));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse("p cnf 2 2\n1 2 0\n1 x 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ConstraintLoad { line: 3, .. }));

        let err = parse("p cnf 2 1\n1 3 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ConstraintLoad { line: 2, .. }));

        let err = parse("p cnf 2 1\n\n1 -1 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ConstraintLoad { line: 3, .. }));

        let err = parse("p cnf 2 1\n1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ConstraintLoad { line: 2, .. }));
    }

    #[test]
    fn test_invalid_problem_line() {
        assert!(parse("p dnf 2 1\n".as_bytes()).is_err());
        assert!(parse("p cnf two 1\n".as_bytes()).is_err());
    }

    #[test]
    fn test_write_then_parse() {
        let cnf = Cnf::new(
            vec!["Root".into(), "Gui".into(), "Cli".into()],
            vec![Clause::new([1]).unwrap(), Clause::new([-2, -3]).unwrap()],
        )
        .unwrap();
        let mut buf = Vec::new();
        write(&cnf, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("p cnf 3 2\n"));
        assert!(text.contains("-2 -3 0\n"));

        let parsed = parse(text.as_bytes()).unwrap();
        assert_eq!(parsed.names(), cnf.names());
        assert_eq!(parsed.clauses(), cnf.clauses());
    }
}
