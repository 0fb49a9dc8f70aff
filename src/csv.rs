//! Configuration lists as semicolon-separated tables.
//!
//! ```text
//! Configuration;Root;Gui;Cli
//! 0;1;1;0
//! 1;1;0;?
//! ```
//!
//! The header names the variables in order. Each row starts with the configuration index,
//! followed by `1` (selected), `0` (deselected) or `?` (unset) per variable.

use std::io::{BufRead, BufReader, Read, Write};

use crate::cnf::Cnf;
use crate::error::{Error, Result};
use crate::literal_set::LiteralSet;

const HEADER: &str = "Configuration";

/// Writes `configs` as a configuration list over the variables of `cnf`.
pub fn write_configurations<W: Write>(cnf: &Cnf, configs: &[LiteralSet], mut writer: W) -> Result<()> {
    write!(writer, "{}", HEADER)?;
    for name in cnf.names() {
        write!(writer, ";{}", name)?;
    }
    writeln!(writer)?;

    for (i, config) in configs.iter().enumerate() {
        write!(writer, "{}", i)?;
        for &l in config.model() {
            let cell = match l {
                0 => '?',
                l if l > 0 => '1',
                _ => '0',
            };
            write!(writer, ";{}", cell)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a configuration list and maps its columns onto the variables of `cnf` by name.
///
/// Every variable of `cnf` must have a column. Columns of unknown variables are ignored.
pub fn read_configurations<R: Read>(cnf: &Cnf, reader: R) -> Result<Vec<LiteralSet>> {
    let mut lines = BufReader::new(reader).lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(Error::load(1, "empty configuration list")),
    };
    let mut columns = header.trim().split(';');
    if columns.next() != Some(HEADER) {
        return Err(Error::load(1, format!("expected '{}' header", HEADER)));
    }
    let columns: Vec<Option<usize>> = columns.map(|name| cnf.var_by_name(name).map(|v| v.index())).collect();
    for var in cnf.variables() {
        if !columns.contains(&Some(var.index())) {
            return Err(Error::load(1, format!("no column for variable '{}'", cnf.name(var))));
        }
    }

    let mut configs = Vec::new();
    for (i, line) in lines {
        let line_no = i + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(';').collect();
        if cells.len() != columns.len() + 1 {
            return Err(Error::load(
                line_no,
                format!("expected {} cells, found {}", columns.len() + 1, cells.len()),
            ));
        }
        let mut model = vec![0i32; cnf.num_vars()];
        for (cell, column) in cells[1..].iter().zip(&columns) {
            let Some(index) = *column else {
                continue;
            };
            let id = index as i32 + 1;
            model[index] = match *cell {
                "1" => id,
                "0" => -id,
                "?" => 0,
                other => return Err(Error::load(line_no, format!("invalid cell '{}'", other))),
            };
        }
        configs.push(LiteralSet::from_model(model));
    }
    Ok(configs)
}
