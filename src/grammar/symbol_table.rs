/*
    Interned grammar symbols: terminals and nonterminals, keyed by name
*/

use indexmap::IndexMap;

use super::bitset::BitSet;
use super::RuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
}

impl SymbolKind {
    // Quoted literals and names without lowercase letters are terminals
    pub fn from_name(name: &str) -> Self {
        if is_string_literal(name) || is_upper(name) {
            SymbolKind::Terminal
        } else {
            SymbolKind::NonTerminal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    Left,
    Right,
    None,
    #[default]
    Unknown,
}

impl Assoc {
    /// The declaration keyword that sets this associativity.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Assoc::Left => Some("%left"),
            Assoc::Right => Some("%right"),
            Assoc::None => Some("%nonassoc"),
            Assoc::Unknown => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Precedence if declared through `%left`, `%right` or `%nonassoc`
    pub precedence: Option<u32>,
    pub assoc: Assoc,
    /// Tag from `<...>` on the declaring line
    pub data_type: Option<String>,
    /// Only meaningful for nonterminals
    pub nullable: bool,
    /// Indices (in sorted order) of the terminals that can start this symbol
    pub first_set: BitSet,
    /// Position in the name-sorted view
    pub index: usize,
    /// Most recently declared rule with this symbol on the left
    pub first_rule: Option<RuleId>,
}

impl Symbol {
    fn new(name: &str) -> Self {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::from_name(name),
            precedence: None,
            assoc: Assoc::Unknown,
            data_type: None,
            nullable: false,
            first_set: BitSet::new(),
            index: 0,
            first_rule: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Symbol {}

#[derive(Debug, Default)]
pub struct SymbolTable {
    // Insertion order gives SymbolId, the key gives name lookup
    symbols: IndexMap<String, Symbol>,
    sorted: Vec<SymbolId>,
    has_new_insert: bool,
    num_terminals: usize,
    num_nonterminals: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the symbol called `name`, creating it if it does not exist yet.
    pub fn insert(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.get(name) {
            return id;
        }

        let symbol = Symbol::new(name);
        match symbol.kind {
            SymbolKind::Terminal => self.num_terminals += 1,
            SymbolKind::NonTerminal => self.num_nonterminals += 1,
        }
        let (index, _) = self.symbols.insert_full(name.to_string(), symbol);
        self.has_new_insert = true;
        SymbolId(index)
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get_index_of(name).map(SymbolId)
    }

    /// Reclassifies a symbol, keeping the terminal and nonterminal counts in step.
    pub fn set_kind(&mut self, id: SymbolId, kind: SymbolKind) {
        let symbol = &mut self[id];
        if symbol.kind == kind {
            return;
        }
        symbol.kind = kind;
        match kind {
            SymbolKind::Terminal => {
                self.num_terminals += 1;
                self.num_nonterminals -= 1;
            }
            SymbolKind::NonTerminal => {
                self.num_nonterminals += 1;
                self.num_terminals -= 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn terminal_count(&self) -> usize {
        self.num_terminals
    }

    pub fn nonterminal_count(&self) -> usize {
        self.num_nonterminals
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.values().enumerate().map(|(i, s)| (SymbolId(i), s))
    }

    /// Sorts all symbols by name and renumbers their indices. A no-op when
    /// nothing was inserted since the previous sort.
    pub fn sort(&mut self) -> &[SymbolId] {
        if self.has_new_insert {
            let symbols = &self.symbols;
            self.sorted = (0..symbols.len()).map(SymbolId).collect();
            self.sorted.sort_by(|&a, &b| symbols[a.0].name.cmp(&symbols[b.0].name));
            for (index, &id) in self.sorted.iter().enumerate() {
                self.symbols[id.0].index = index;
            }
            self.has_new_insert = false;
        }
        &self.sorted
    }

    /// The view produced by the last call to `sort`.
    pub fn sorted(&self) -> &[SymbolId] {
        debug_assert!(!self.has_new_insert, "symbol table read before sorting");
        &self.sorted
    }

    /// Symbol at position `index` of the sorted view.
    pub fn by_index(&self, index: usize) -> SymbolId {
        self.sorted()[index]
    }
}

impl std::ops::Index<SymbolId> for SymbolTable {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }
}

impl std::ops::IndexMut<SymbolId> for SymbolTable {
    fn index_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }
}

// Every letter is uppercase. Strings without letters count as uppercase.
pub fn is_upper(name: &str) -> bool {
    name.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
}

pub fn is_string_literal(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => first == last && (first == '\'' || first == '"'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(table: &SymbolTable, ids: &[SymbolId]) -> Vec<String> {
        ids.iter().map(|&id| table[id].name.clone()).collect()
    }

    #[test]
    fn insert_is_idempotent() {
        let mut table = SymbolTable::new();
        let first = table.insert("expr");
        let terminals = table.terminal_count();
        let nonterminals = table.nonterminal_count();

        let second = table.insert("expr");

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.terminal_count(), terminals);
        assert_eq!(table.nonterminal_count(), nonterminals);
    }

    #[test]
    fn insert_many() {
        let mut table = SymbolTable::new();
        let inputs = (0..8192).map(|i| format!("name = {}", i)).collect::<Vec<_>>();
        let ids = inputs.iter().map(|name| table.insert(name)).collect::<Vec<_>>();

        for (name, id) in inputs.iter().zip(ids) {
            assert_eq!(&table[id].name, name);
        }
        assert_eq!(table.len(), 8192);
    }

    #[test]
    fn classification_by_case() {
        let mut table = SymbolTable::new();
        let num = table.insert("NUM");
        let plus = table.insert("'+'");
        let quoted = table.insert("\"x\"");
        let expr = table.insert("expr");
        let mixed = table.insert("Expr");

        assert!(table[num].is_terminal());
        assert!(table[plus].is_terminal());
        assert!(table[quoted].is_terminal());
        assert!(!table[expr].is_terminal());
        assert!(!table[mixed].is_terminal());
        assert_eq!(table.terminal_count(), 3);
        assert_eq!(table.nonterminal_count(), 2);
    }

    #[test]
    fn set_kind_moves_counts() {
        let mut table = SymbolTable::new();
        let id = table.insert("Expr");
        assert_eq!(table.nonterminal_count(), 1);

        table.set_kind(id, SymbolKind::Terminal);
        table.set_kind(id, SymbolKind::Terminal);

        assert_eq!(table.terminal_count(), 1);
        assert_eq!(table.nonterminal_count(), 0);
    }

    #[test]
    fn sorted_view_is_lexicographic() {
        let mut table = SymbolTable::new();
        for name in ["z", "a", "M", "b"] {
            table.insert(name);
        }

        let sorted = table.sort().to_vec();
        assert_eq!(names(&table, &sorted), vec!["M", "a", "b", "z"]);
        for (index, &id) in sorted.iter().enumerate() {
            assert_eq!(table[id].index, index);
        }

        let again = table.sort().to_vec();
        assert_eq!(again, sorted);
    }

    #[test]
    fn uppercase_sorts_before_lowercase() {
        let mut table = SymbolTable::new();
        let lower = ('a'..='z').map(String::from).collect::<Vec<_>>();
        let upper = ('A'..='Z').map(String::from).collect::<Vec<_>>();
        for name in lower.iter().chain(&upper) {
            table.insert(name);
        }

        let sorted = table.sort().to_vec();
        let expected = upper.iter().chain(&lower).cloned().collect::<Vec<_>>();
        assert_eq!(names(&table, &sorted), expected);
    }

    #[test]
    fn resort_after_new_insert() {
        let mut table = SymbolTable::new();
        table.insert("b");
        table.sort();
        let a = table.insert("a");

        table.sort();
        assert_eq!(table[a].index, 0);
        assert_eq!(table.by_index(1), table.get("b").unwrap());
    }

    #[test]
    fn string_literal_detection() {
        assert!(is_string_literal("'+'"));
        assert!(is_string_literal("\"if\""));
        assert!(!is_string_literal("'"));
        assert!(!is_string_literal("'a\""));
        assert!(!is_string_literal("PLUS"));
    }
}
