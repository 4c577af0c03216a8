/*
    This module runs the fixed-point passes over a parsed grammar: nullable
    nonterminals, rule precedence and first-sets
*/

use log::debug;

use crate::grammar::{BitSet, Grammar, Rule};

/// Fills in nullable flags, rule precedence and first-sets in place.
///
/// Sorts the symbol table first since first-sets are keyed by sorted index.
pub fn analyze(grammar: &mut Grammar) {
    grammar.symbols.sort();
    compute_nullable(grammar);
    backfill_precedence(grammar);
    compute_first_sets(grammar);
}

fn is_rule_nullable(grammar: &Grammar, rule: &Rule) -> bool {
    rule.rhs.iter().all(|&symbol| grammar.symbols[symbol].nullable)
}

pub fn compute_nullable(grammar: &mut Grammar) {
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for index in 0..grammar.rules.len() {
            let rule = &grammar.rules[index];
            let lhs = rule.lhs;
            if grammar.symbols[lhs].nullable || !is_rule_nullable(grammar, rule) {
                continue;
            }
            grammar.symbols[lhs].nullable = true;
            changed = true;
        }
        if !changed {
            break;
        }
    }
    debug!("nullable sets settled after {} passes", passes);
}

/// Rules without `%prec` take the first right-hand symbol that has a precedence.
pub fn backfill_precedence(grammar: &mut Grammar) {
    let symbols = &grammar.symbols;
    for rule in grammar.rules.iter_mut().filter(|rule| rule.prec_symbol.is_none()) {
        rule.prec_symbol = rule.rhs
            .iter()
            .copied()
            .find(|&symbol| symbols[symbol].precedence.is_some());
    }
}

// Contribution of one rule to the first-set of its left-hand side
fn rule_first_set(grammar: &Grammar, rule: &Rule, result: &mut BitSet) {
    let lhs = &grammar.symbols[rule.lhs];
    for &symbol in &rule.rhs {
        let rhs = &grammar.symbols[symbol];
        if rhs.is_terminal() {
            result.insert(rhs.index);
            return;
        }
        if symbol == rule.lhs {
            if !lhs.nullable {
                return;
            }
            continue;
        }
        result.union_with(&rhs.first_set);
        if !rhs.nullable {
            return;
        }
    }
}

pub fn compute_first_sets(grammar: &mut Grammar) {
    let mut buf = BitSet::with_capacity(grammar.symbols.len());
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for index in 0..grammar.rules.len() {
            buf.clear();
            let rule = &grammar.rules[index];
            let lhs = rule.lhs;
            rule_first_set(grammar, rule, &mut buf);
            changed |= grammar.symbols[lhs].first_set.union_with(&buf);
        }
        if !changed {
            break;
        }
    }
    debug!(
        "first sets settled after {} passes, {} entries",
        passes,
        grammar.symbols.iter().map(|(_, symbol)| symbol.first_set.len()).sum::<usize>()
    );
}
