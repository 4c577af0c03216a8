use std::collections::HashSet;
use std::path::Path;

use itertools::Itertools;
use log::warn;

use crate::grammar::{Grammar, Rule, SymbolId};
use super::CompileErrorType::{UndefinedNonterminal, UndefinedStartSymbol};
use super::{CompileError, CompileErrors, Location};

fn has_rules(grammar: &Grammar, symbol: SymbolId) -> bool {
    grammar.rules_for(symbol).next().is_some()
}

fn get_rule_undefined_symbols<'a>(grammar: &'a Grammar, rule: &'a Rule) -> impl Iterator<Item = (SymbolId, usize)> + 'a {
    rule.rhs
        .iter()
        .filter(|&&symbol| !grammar.symbols[symbol].is_terminal() && !has_rules(grammar, symbol))
        .map(|&symbol| (symbol, rule.line))
}

// Each undefined nonterminal is reported once, at its first use
fn get_undefined_symbols(grammar: &Grammar, file: &Path) -> CompileErrors {
    grammar.rules
        .iter()
        .flat_map(|rule| get_rule_undefined_symbols(grammar, rule))
        .unique_by(|&(symbol, _)| symbol)
        .map(|(symbol, line)| CompileError {
            location: Location::new(file, line),
            error: UndefinedNonterminal(grammar.name(symbol).to_string())
        })
        .collect()
}

fn check_start_symbol(grammar: &Grammar, file: &Path) -> Option<CompileError> {
    let start = grammar.start()?;
    if has_rules(grammar, start) {
        return None;
    }
    Some(CompileError {
        location: Location::new(file, 0),
        error: UndefinedStartSymbol(grammar.name(start).to_string())
    })
}

fn warn_unused_terminals(grammar: &Grammar, file: &Path) {
    let used = grammar.rules
        .iter()
        .flat_map(|rule| rule.rhs.iter().copied().chain(rule.prec_symbol))
        .collect::<HashSet<_>>();

    for (id, symbol) in grammar.symbols.iter() {
        if symbol.is_terminal() && !used.contains(&id) && symbol.precedence.is_none() {
            warn!("{}: terminal `{}` is never used", file.display(), symbol.name);
        }
    }
}

pub fn verify_grammar(grammar: &Grammar, file: &Path) -> CompileErrors {
    let mut errors = get_undefined_symbols(grammar, file);

    errors.extend(check_start_symbol(grammar, file));
    warn_unused_terminals(grammar, file);

    errors
}
