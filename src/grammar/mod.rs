/*
    This module stores the grammar model: symbols, production rules and the
    code blocks lifted out of the grammar file
*/

mod bitset;
mod symbol_table;

use itertools::Itertools;

pub use bitset::BitSet;
pub use symbol_table::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub usize);

// A chunk of verbatim code and the line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub code: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: SymbolId,
    /// Line of the left-hand side
    pub line: usize,
    pub rhs: Vec<SymbolId>,
    pub code: Option<CodeBlock>,
    /// Set by `%prec`, or back-filled from the right-hand side
    pub prec_symbol: Option<SymbolId>,
    /// Next rule with the same left-hand side
    pub next_lhs: Option<RuleId>,
}

#[derive(Debug, Default)]
pub struct Grammar {
    pub symbols: SymbolTable,
    pub rules: Vec<Rule>,
    pub start_symbol: Option<SymbolId>,
    /// Contents of `%{ ... %}`
    pub import_code: Option<CodeBlock>,
    /// The `{ ... }` following `%union`
    pub union_code: Option<CodeBlock>,
    /// Everything after the second `%%`
    pub trailing_code: Option<CodeBlock>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new empty rule for `lhs` and links it into the symbol's chain.
    pub fn add_rule(&mut self, lhs: SymbolId, line: usize) -> RuleId {
        let id = RuleId(self.rules.len());
        let symbol = &mut self.symbols[lhs];
        self.rules.push(Rule {
            lhs,
            line,
            rhs: Vec::new(),
            code: None,
            prec_symbol: None,
            next_lhs: symbol.first_rule,
        });
        symbol.first_rule = Some(id);
        id
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rules whose left-hand side is `lhs`, most recent first.
    pub fn rules_for(&self, lhs: SymbolId) -> impl Iterator<Item = RuleId> + '_ {
        std::iter::successors(self.symbols[lhs].first_rule, |&id| self.rules[id.0].next_lhs)
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.symbols[id].name
    }

    /// Start symbol from `%start`, else the left-hand side of the first rule.
    pub fn start(&self) -> Option<SymbolId> {
        self.start_symbol.or_else(|| self.rules.first().map(|rule| rule.lhs))
    }

    // Renders as `lhs: rhs1 rhs2.[prec]`
    pub fn display_rule(&self, rule: &Rule) -> String {
        let mut text = format!("{}:", self.name(rule.lhs));
        for &sym in &rule.rhs {
            text.push(' ');
            text.push_str(self.name(sym));
        }
        text.push('.');
        if let Some(prec) = rule.prec_symbol {
            text.push_str(&format!("[{}]", self.name(prec)));
        }
        text
    }

    pub fn first_set_names(&self, id: SymbolId) -> Vec<&str> {
        self.symbols[id]
            .first_set
            .iter()
            .map(|index| self.name(self.symbols.by_index(index)))
            .collect_vec()
    }
}
