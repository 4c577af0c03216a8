/*
    This module prints an analyzed grammar: the symbol listing, the rules and
    the first-sets
*/

use std::io::{self, Write};
use std::path::Path;

use itertools::Itertools;

use crate::grammar::Grammar;

const LINE_WIDTH: usize = 76;
const MIN_NAME_WIDTH: usize = 10;

// Symbols in name order, laid out column by column
fn write_symbols(out: &mut impl Write, grammar: &Grammar) -> io::Result<()> {
    let sorted = grammar.symbols.sorted();
    let width = sorted
        .iter()
        .map(|&id| grammar.name(id).chars().count())
        .fold(MIN_NAME_WIDTH, usize::max);
    let columns = (LINE_WIDTH / (width + 5)).max(1);
    let rows = sorted.len().div_ceil(columns);

    for row in 0..rows {
        write!(out, "//")?;
        for index in (row..sorted.len()).step_by(rows) {
            let name = grammar.name(sorted[index]);
            write!(out, " {:3} {:<width$.width$}", index, name, width = width)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

// Type tags and precedence, one symbol per line
fn write_declarations(out: &mut impl Write, grammar: &Grammar) -> io::Result<()> {
    let declared = grammar.symbols
        .sorted()
        .iter()
        .map(|&id| &grammar.symbols[id])
        .filter(|symbol| symbol.data_type.is_some() || symbol.precedence.is_some())
        .collect_vec();
    if declared.is_empty() {
        return Ok(());
    }

    writeln!(out, "// Declarations:")?;
    for symbol in declared {
        write!(out, "//   {}", symbol.name)?;
        if let Some(tag) = &symbol.data_type {
            write!(out, " <{}>", tag)?;
        }
        if let (Some(keyword), Some(precedence)) = (symbol.assoc.keyword(), symbol.precedence) {
            write!(out, " {} {}", keyword, precedence)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the grammar back out without comments or actions.
pub fn reprint(out: &mut impl Write, grammar: &Grammar, file: &Path) -> io::Result<()> {
    writeln!(out, "// Reprint of input file \"{}\".", file.display())?;
    writeln!(out, "// Symbols:")?;
    write_symbols(out, grammar)?;
    write_declarations(out, grammar)?;

    for rule in &grammar.rules {
        writeln!(out, "{}", grammar.display_rule(rule))?;
    }
    Ok(())
}

pub fn write_first_sets(out: &mut impl Write, grammar: &Grammar) -> io::Result<()> {
    for &id in grammar.symbols.sorted() {
        let symbol = &grammar.symbols[id];
        let mut names = grammar.first_set_names(id);
        if symbol.nullable {
            names.push("ε");
        }
        writeln!(out, "{} => {{ {} }}", symbol.name, names.iter().join(", "))?;
    }
    Ok(())
}

pub fn write_report(out: &mut impl Write, grammar: &Grammar, file: &Path, first_sets: bool) -> io::Result<()> {
    reprint(out, grammar, file)?;
    if first_sets {
        write_first_sets(out, grammar)?;
    }
    out.flush()
}
