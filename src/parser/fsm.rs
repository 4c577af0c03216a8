/*
    Token-at-a-time state machine that turns grammar tokens into symbols and
    rules. Recoverable errors are recorded and parsing carries on from a
    fixed recovery state.
*/

use std::fmt::Display;
use std::path::PathBuf;

use log::{debug, trace, warn};

use crate::error_handling::Location;
use crate::grammar::*;
use super::lexer::Token;
use super::{CompileError, CompileErrorType, CompileErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    WaitPercentSign,
    WaitOpenBrace,
    WaitKwDefOrRule1,
    WaitKwDefOrRule2,
    WaitOptTagOrOpenBrace,
    WaitSymbolAfterKeyword,

    WaitRuleLhsSymbol,
    WaitColon,
    WaitRuleRhsSymbol,
    WaitPrecedence,
    WaitPrecedenceTerm,
    WaitSymbolAfterPrec,

    WaitSubRoutine1,
    WaitSubRoutine2,
}

impl Display for FsmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            FsmState::WaitPercentSign => "waiting for `%{`",
            FsmState::WaitOpenBrace => "waiting for the `%{ ... %}` block",
            FsmState::WaitKwDefOrRule1 | FsmState::WaitKwDefOrRule2 => "waiting for a declaration or `%%`",
            FsmState::WaitOptTagOrOpenBrace => "waiting for a tag or symbol after a keyword",
            FsmState::WaitSymbolAfterKeyword => "waiting for a symbol after a keyword",
            FsmState::WaitRuleLhsSymbol => "waiting for a rule",
            FsmState::WaitColon => "waiting for `:`",
            FsmState::WaitRuleRhsSymbol => "inside a rule",
            FsmState::WaitPrecedence => "waiting for `prec`",
            FsmState::WaitPrecedenceTerm => "waiting for the `%prec` symbol",
            FsmState::WaitSymbolAfterPrec => "waiting for `|`, `{` or `;` after `%prec`",
            FsmState::WaitSubRoutine1 => "waiting for the second `%` of `%%`",
            FsmState::WaitSubRoutine2 => "inside the trailing code",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Type,
    Token,
    Left,
    Right,
    Nonassoc,
    Start,
    Prec,
    Union,
}

impl Keyword {
    // Case-insensitive
    pub fn parse(word: &str) -> Option<Keyword> {
        match word.to_ascii_lowercase().as_str() {
            "type" => Some(Keyword::Type),
            "token" => Some(Keyword::Token),
            "left" => Some(Keyword::Left),
            "right" => Some(Keyword::Right),
            "nonassoc" => Some(Keyword::Nonassoc),
            "start" => Some(Keyword::Start),
            "prec" => Some(Keyword::Prec),
            "union" => Some(Keyword::Union),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Keyword::Type => "type",
            Keyword::Token => "token",
            Keyword::Left => "left",
            Keyword::Right => "right",
            Keyword::Nonassoc => "nonassoc",
            Keyword::Start => "start",
            Keyword::Prec => "prec",
            Keyword::Union => "union",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.name())
    }
}

// A name that may only be a nonterminal: starts with a lowercase letter
fn is_nonterminal_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn is_symbol_token(token: &Token) -> bool {
    let first = token.first_char();
    first.is_alphanumeric() || first == '_' || is_string_literal(token.as_str())
}

pub struct ParserState {
    file: PathBuf,
    state: FsmState,
    /// Keyword of the declaration being read; `None` skips to the next `%`
    keyword: Option<Keyword>,
    tag: Option<String>,
    current_rule: Option<RuleId>,
    prec_counter: u32,
    grammar: Grammar,
    errors: CompileErrors,
}

impl ParserState {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        ParserState {
            file: file.into(),
            state: FsmState::WaitPercentSign,
            keyword: None,
            tag: None,
            current_rule: None,
            prec_counter: 0,
            grammar: Grammar::new(),
            errors: Vec::new(),
        }
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn into_parts(self) -> (PathBuf, Grammar, CompileErrors) {
        (self.file, self.grammar, self.errors)
    }

    pub fn error(&mut self, line: usize, error: CompileErrorType) {
        let error = CompileError {
            location: Location::new(self.file.clone(), line),
            error,
        };
        debug!("{}", error);
        self.errors.push(error);
    }

    /// True right after the `%%` that opens the trailing code section.
    pub fn wants_trailing_code(&self) -> bool {
        self.state == FsmState::WaitSubRoutine2 && self.grammar.trailing_code.is_none()
    }

    pub fn set_trailing_code(&mut self, code: String, line: usize) {
        self.grammar.trailing_code = Some(CodeBlock { code, line });
    }

    pub fn consume(&mut self, token: &Token) {
        trace!("state={:?} token=`{}`", self.state, token.as_str());

        let line = token.line();
        let text = token.as_str();

        match self.state {
            FsmState::WaitPercentSign => {
                if token.is('%') {
                    self.state = FsmState::WaitOpenBrace;
                } else {
                    self.error(line, CompileErrorType::ExpectedImportBlock(text.to_string()));
                }
            }

            FsmState::WaitOpenBrace => {
                if token.first_char() == '{' && text.ends_with("%}") && token.char_count() >= 3 {
                    self.grammar.import_code = Some(CodeBlock { code: token.trimmed(1, 2), line });
                    self.state = FsmState::WaitKwDefOrRule1;
                } else {
                    // Carry on as if the block had been there
                    self.error(line, CompileErrorType::ExpectedImportBlock(text.to_string()));
                    self.state = FsmState::WaitKwDefOrRule2;
                    self.consume(token);
                }
            }

            FsmState::WaitKwDefOrRule1 => {
                if token.is('%') {
                    self.state = FsmState::WaitKwDefOrRule2;
                } else {
                    self.error(line, CompileErrorType::ExpectedKeywordOrSection(text.to_string()));
                }
            }

            FsmState::WaitKwDefOrRule2 => {
                if token.is('%') {
                    debug!("rule section starts on line {}", line);
                    self.state = FsmState::WaitRuleLhsSymbol;
                    return;
                }

                self.tag = None;
                self.keyword = None;
                self.state = FsmState::WaitSymbolAfterKeyword;
                match Keyword::parse(text) {
                    Some(Keyword::Prec) => self.error(line, CompileErrorType::PrecOutsideRule),
                    Some(keyword) => {
                        self.keyword = Some(keyword);
                        self.state = FsmState::WaitOptTagOrOpenBrace;
                    }
                    None => self.error(line, CompileErrorType::UnknownKeyword(text.to_string())),
                }
            }

            FsmState::WaitOptTagOrOpenBrace => {
                if self.keyword == Some(Keyword::Union) {
                    self.read_union(token);
                } else if token.first_char() == '<' {
                    self.tag = Some(token.trimmed(1, 1));
                    self.state = FsmState::WaitSymbolAfterKeyword;
                } else {
                    self.state = FsmState::WaitSymbolAfterKeyword;
                    self.consume(token);
                }
            }

            FsmState::WaitSymbolAfterKeyword => {
                if token.is('%') {
                    self.keyword = None;
                    self.tag = None;
                    self.state = FsmState::WaitKwDefOrRule2;
                } else if self.keyword.is_none() {
                    trace!("skipping `{}`", text);
                } else if token.first_char() == '<' {
                    self.error(line, CompileErrorType::MisplacedTag(text.to_string()));
                } else {
                    self.define_symbol(text, line);
                }
            }

            FsmState::WaitRuleLhsSymbol => {
                if token.is('%') {
                    if self.grammar.rule_count() == 0 {
                        self.error(line, CompileErrorType::NoRules);
                    } else {
                        self.state = FsmState::WaitSubRoutine1;
                    }
                } else if is_nonterminal_name(text) {
                    let lhs = self.grammar.symbols.insert(text);
                    self.current_rule = Some(self.grammar.add_rule(lhs, line));
                    self.state = FsmState::WaitColon;
                } else {
                    // Drop everything up to the next `;`
                    self.error(line, CompileErrorType::InvalidLhs(text.to_string()));
                    self.current_rule = None;
                    self.state = FsmState::WaitRuleRhsSymbol;
                }
            }

            FsmState::WaitColon => {
                self.state = FsmState::WaitRuleRhsSymbol;
                if !token.is(':') {
                    self.error(line, CompileErrorType::ExpectedColon(text.to_string()));
                    self.consume(token);
                }
            }

            FsmState::WaitRuleRhsSymbol => {
                let Some(rule) = self.current_rule else {
                    if token.is(';') {
                        self.state = FsmState::WaitRuleLhsSymbol;
                    }
                    return;
                };

                if token.is('|') {
                    self.new_alternative(rule, line);
                } else if token.first_char() == '{' {
                    self.attach_code(rule, token);
                } else if token.is('%') {
                    self.state = FsmState::WaitPrecedence;
                } else if token.is(';') {
                    self.end_rule(line);
                } else if is_symbol_token(token) {
                    if self.grammar.symbols.get(text).is_none() {
                        debug!("{}:{}: `{}` used before being declared", self.file.display(), line, text);
                    }
                    let symbol = self.grammar.symbols.insert(text);
                    self.grammar.rules[rule.0].rhs.push(symbol);
                } else {
                    self.error(line, CompileErrorType::UnexpectedToken(text.to_string()));
                }
            }

            FsmState::WaitPrecedence => {
                if Keyword::parse(text) == Some(Keyword::Prec) {
                    self.state = FsmState::WaitPrecedenceTerm;
                } else {
                    self.error(line, CompileErrorType::ExpectedPrecKeyword(text.to_string()));
                    self.state = FsmState::WaitRuleRhsSymbol;
                }
            }

            FsmState::WaitPrecedenceTerm => {
                self.state = FsmState::WaitSymbolAfterPrec;
                match (self.grammar.symbols.get(text), self.current_rule) {
                    (Some(symbol), Some(rule)) => {
                        if self.grammar.symbols[symbol].precedence.is_none() {
                            warn!("{}:{}: `%prec {}` names a symbol without precedence", self.file.display(), line, text);
                        }
                        self.grammar.rules[rule.0].prec_symbol = Some(symbol);
                    }
                    _ => self.error(line, CompileErrorType::UndeclaredPrecedenceSymbol(text.to_string())),
                }
            }

            FsmState::WaitSymbolAfterPrec => {
                let Some(rule) = self.current_rule else {
                    self.state = FsmState::WaitRuleRhsSymbol;
                    return;
                };

                if token.first_char() == '{' {
                    self.attach_code(rule, token);
                } else if token.is('|') {
                    self.new_alternative(rule, line);
                    self.state = FsmState::WaitRuleRhsSymbol;
                } else if token.is(';') {
                    self.end_rule(line);
                } else {
                    self.error(line, CompileErrorType::UnexpectedAfterPrec(text.to_string()));
                }
            }

            FsmState::WaitSubRoutine1 => {
                if token.is('%') {
                    self.state = FsmState::WaitSubRoutine2;
                } else {
                    self.error(line, CompileErrorType::ExpectedSubroutineMarker(text.to_string()));
                }
            }

            FsmState::WaitSubRoutine2 => {
                self.grammar
                    .trailing_code
                    .get_or_insert_with(|| CodeBlock { code: String::new(), line })
                    .code
                    .push_str(text);
            }
        }
    }

    fn read_union(&mut self, token: &Token) {
        let line = token.line();
        if token.first_char() != '{' || token.last_char() != '}' {
            self.error(line, CompileErrorType::ExpectedUnionBlock(token.as_str().to_string()));
            self.keyword = None;
            self.state = FsmState::WaitSymbolAfterKeyword;
            // The token may be the `%` of the next declaration
            self.consume(token);
            return;
        }

        match self.grammar.union_code.as_ref().map(|code| code.line) {
            Some(previous) => self.error(line, CompileErrorType::MultipleUnion(previous)),
            None => self.grammar.union_code = Some(CodeBlock { code: token.trimmed(1, 1), line }),
        }
        self.keyword = None;
        self.state = FsmState::WaitKwDefOrRule1;
    }

    // Applies the pending keyword and tag to one declared name
    fn define_symbol(&mut self, name: &str, line: usize) {
        let Some(keyword) = self.keyword else {
            return;
        };

        let symbols = &mut self.grammar.symbols;
        let id = symbols.insert(name);
        if let Some(tag) = &self.tag {
            symbols[id].data_type = Some(tag.clone());
        }

        match keyword {
            Keyword::Type => {
                if is_nonterminal_name(name) {
                    symbols.set_kind(id, SymbolKind::NonTerminal);
                } else {
                    self.error(line, CompileErrorType::NonterminalExpected { keyword, name: name.to_string() });
                }
            }

            Keyword::Token => {
                if is_upper(name) || is_string_literal(name) {
                    symbols.set_kind(id, SymbolKind::Terminal);
                } else {
                    self.error(line, CompileErrorType::TerminalExpected { keyword, name: name.to_string() });
                }
            }

            Keyword::Left | Keyword::Right | Keyword::Nonassoc => {
                if !is_upper(name) && !is_string_literal(name) {
                    self.error(line, CompileErrorType::TerminalExpected { keyword, name: name.to_string() });
                    return;
                }
                symbols.set_kind(id, SymbolKind::Terminal);
                let symbol = &mut symbols[id];
                if symbol.precedence.is_some() {
                    warn!("{}:{}: precedence of `{}` redefined", self.file.display(), line, name);
                }
                symbol.assoc = match keyword {
                    Keyword::Left => Assoc::Left,
                    Keyword::Right => Assoc::Right,
                    _ => Assoc::None,
                };
                symbol.precedence = Some(self.prec_counter);
                self.prec_counter += 1;
            }

            Keyword::Start => {
                if !is_nonterminal_name(name) {
                    self.error(line, CompileErrorType::NonterminalExpected { keyword, name: name.to_string() });
                } else if self.grammar.start_symbol.is_some() {
                    self.error(line, CompileErrorType::MultipleStart(name.to_string()));
                } else {
                    self.grammar.start_symbol = Some(id);
                }
            }

            // Both are consumed before any symbol is read
            Keyword::Prec | Keyword::Union => {}
        }
    }

    // Handles `|` for the rule being built
    // An earlier empty alternative is either a stored empty rule, or one that
    // was reused for the next alternative and left only the nullable flag
    fn check_empty_alternative(&mut self, rule: RuleId, line: usize) {
        let lhs = self.grammar.rules[rule.0].lhs;
        let duplicate = self.grammar.symbols[lhs].nullable
            || self.grammar
                .rules_for(lhs)
                .any(|other| other != rule && self.grammar.rules[other.0].rhs.is_empty());
        if duplicate {
            let name = self.grammar.name(lhs).to_string();
            self.error(line, CompileErrorType::DuplicateEmptyAlternative(name));
        }
    }

    fn new_alternative(&mut self, rule: RuleId, line: usize) {
        let current = &self.grammar.rules[rule.0];
        let lhs = current.lhs;
        let reusable = current.code.is_none() && current.prec_symbol.is_none();

        if current.rhs.is_empty() {
            self.check_empty_alternative(rule, line);
            self.grammar.symbols[lhs].nullable = true;
            if reusable {
                return;
            }
        }

        self.current_rule = Some(self.grammar.add_rule(lhs, line));
    }

    fn attach_code(&mut self, rule: RuleId, token: &Token) {
        let line = token.line();
        if self.grammar.rules[rule.0].code.is_some() {
            let name = self.grammar.name(self.grammar.rules[rule.0].lhs).to_string();
            self.error(line, CompileErrorType::MultipleCodeBlocks(name));
            return;
        }
        self.grammar.rules[rule.0].code = Some(CodeBlock { code: token.as_str().to_string(), line });
    }

    fn end_rule(&mut self, line: usize) {
        if let Some(rule) = self.current_rule.take() {
            if self.grammar.rules[rule.0].rhs.is_empty() {
                self.check_empty_alternative(rule, line);
            }
        }
        self.state = FsmState::WaitRuleLhsSymbol;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Tokenizer;
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> ParserState {
        let mut tokenizer = Tokenizer::new(text.chars());
        let mut parser = ParserState::new("test.y");
        while let Some(token) = tokenizer.next_token().unwrap() {
            parser.consume(token);
        }
        parser
    }

    fn error_kinds(parser: &ParserState) -> Vec<&CompileErrorType> {
        parser.errors.iter().map(|e| &e.error).collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(Keyword::parse("TOKEN"), Some(Keyword::Token));
        assert_eq!(Keyword::parse("NonAssoc"), Some(Keyword::Nonassoc));
        assert_eq!(Keyword::parse("prec"), Some(Keyword::Prec));
        assert_eq!(Keyword::parse("include"), None);
        assert_eq!(Keyword::Left.to_string(), "%left");
    }

    #[test]
    fn import_block_and_states() {
        let parser = run("%{ use std::fmt; %}\n%token A\n%%\n");
        assert_eq!(parser.state(), FsmState::WaitRuleLhsSymbol);
        assert_eq!(
            parser.grammar().import_code,
            Some(CodeBlock { code: " use std::fmt; ".to_string(), line: 1 })
        );
        assert_eq!(parser.error_count(), 0);
    }

    #[test]
    fn precedence_increases_across_lines() {
        let parser = run("%{ %}\n%left A B\n%right C\n%nonassoc D\n%%");
        let grammar = parser.grammar();
        let prec = |name: &str| grammar.symbols[grammar.symbols.get(name).unwrap()].precedence;
        let assoc = |name: &str| grammar.symbols[grammar.symbols.get(name).unwrap()].assoc;

        assert_eq!(prec("A"), Some(0));
        assert_eq!(prec("B"), Some(1));
        assert_eq!(prec("C"), Some(2));
        assert_eq!(prec("D"), Some(3));
        assert_eq!(assoc("A"), Assoc::Left);
        assert_eq!(assoc("C"), Assoc::Right);
        assert_eq!(assoc("D"), Assoc::None);
    }

    #[test]
    fn tags_apply_to_the_whole_line() {
        let parser = run("%{ %}\n%token <i64> NUM INT\n%type <Expr> expr\n%token PLUS\n%%");
        let grammar = parser.grammar();
        let data_type = |name: &str| grammar.symbols[grammar.symbols.get(name).unwrap()].data_type.clone();

        assert_eq!(data_type("NUM"), Some("i64".to_string()));
        assert_eq!(data_type("INT"), Some("i64".to_string()));
        assert_eq!(data_type("expr"), Some("Expr".to_string()));
        assert_eq!(data_type("PLUS"), None);
    }

    #[test]
    fn declaration_case_errors() {
        let parser = run("%{ %}\n%type Expr\n%token num\n%left op\n%token 'a' \"b\"\n%%");
        assert_eq!(error_kinds(&parser), vec![
            &CompileErrorType::NonterminalExpected { keyword: Keyword::Type, name: "Expr".to_string() },
            &CompileErrorType::TerminalExpected { keyword: Keyword::Token, name: "num".to_string() },
            &CompileErrorType::TerminalExpected { keyword: Keyword::Left, name: "op".to_string() },
        ]);
        assert_eq!(parser.errors[1].location.line, 3);
    }

    #[test]
    fn precedence_accepts_any_literal() {
        let parser = run("%{ %}\n%left '+' 'a'\n%right \"if\"\n%%");
        let grammar = parser.grammar();
        let prec = |name: &str| grammar.symbols[grammar.symbols.get(name).unwrap()].precedence;

        assert_eq!(parser.error_count(), 0);
        assert_eq!(prec("'+'"), Some(0));
        assert_eq!(prec("'a'"), Some(1));
        assert_eq!(prec("\"if\""), Some(2));
    }

    #[test]
    fn union_once() {
        let parser = run("%{ %}\n%union { int x; }\n%union { y }\n%%");
        let grammar = parser.grammar();
        assert_eq!(grammar.union_code, Some(CodeBlock { code: " int x; ".to_string(), line: 2 }));
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::MultipleUnion(2)]);
        assert_eq!(parser.state(), FsmState::WaitRuleLhsSymbol);
    }

    #[test]
    fn union_without_block_keeps_next_declaration() {
        let parser = run("%{ %}\n%union\n%token <i64> NUM\n%%\ns : NUM ;");
        let grammar = parser.grammar();
        let num = grammar.symbols.get("NUM").unwrap();

        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::ExpectedUnionBlock("%".to_string())]);
        assert_eq!(parser.errors[0].location.line, 3);
        assert_eq!(grammar.symbols[num].data_type, Some("i64".to_string()));
        assert_eq!(grammar.union_code, None);
        assert_eq!(grammar.rule_count(), 1);
    }

    #[test]
    fn union_with_words_skips_to_next_percent() {
        let parser = run("%{ %}\n%union foo bar\n%token A\n%%\ns : A ;");
        let grammar = parser.grammar();

        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::ExpectedUnionBlock("foo".to_string())]);
        assert!(grammar.symbols.get("bar").is_none());
        assert!(grammar.symbols[grammar.symbols.get("A").unwrap()].is_terminal());
        assert_eq!(parser.state(), FsmState::WaitRuleLhsSymbol);
    }

    #[test]
    fn prec_in_declarations() {
        let parser = run("%{ %}\n%prec A\n%token B\n%%\ns : B ;");
        let grammar = parser.grammar();

        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::PrecOutsideRule]);
        assert_eq!(parser.errors[0].location.line, 2);
        assert!(grammar.symbols.get("A").is_none());
        assert!(grammar.symbols.get("B").is_some());
        assert_eq!(grammar.rule_count(), 1);
    }

    #[test]
    fn tag_after_symbols_is_misplaced() {
        let parser = run("%{ %}\n%token A <i64> B\n%token C\n%%");
        let grammar = parser.grammar();
        let data_type = |name: &str| grammar.symbols[grammar.symbols.get(name).unwrap()].data_type.clone();

        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::MisplacedTag("<i64>".to_string())]);
        assert_eq!(data_type("B"), None);
        assert!(grammar.symbols.get("C").is_some());
        assert_eq!(parser.state(), FsmState::WaitRuleLhsSymbol);
    }

    #[test]
    fn declaration_without_percent() {
        let parser = run("%{ %}\ntoken A\n%token B\n%%\ns : B ;");
        assert_eq!(error_kinds(&parser), vec![
            &CompileErrorType::ExpectedKeywordOrSection("token".to_string()),
            &CompileErrorType::ExpectedKeywordOrSection("A".to_string()),
        ]);
        assert!(parser.grammar().symbols.get("B").is_some());
        assert_eq!(parser.grammar().rule_count(), 1);
    }

    #[test]
    fn broken_trailing_marker() {
        let parser = run("%{ %}\n%%\ns : A ;\n% x %\ncode");
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::ExpectedSubroutineMarker("x".to_string())]);
        assert_eq!(parser.errors[0].location.line, 4);
        assert_eq!(parser.state(), FsmState::WaitSubRoutine2);
        assert_eq!(parser.grammar().trailing_code.as_ref().map(|c| c.code.as_str()), Some("code"));
    }

    #[test]
    fn unknown_keyword_skips_declaration() {
        let parser = run("%{ %}\n%include foo bar\n%token A\n%%");
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::UnknownKeyword("include".to_string())]);
        assert!(parser.grammar().symbols.get("foo").is_none());
        assert!(parser.grammar().symbols.get("A").is_some());
    }

    #[test]
    fn start_symbol_recorded_once() {
        let parser = run("%{ %}\n%start program\n%start other\n%%");
        let grammar = parser.grammar();
        assert_eq!(grammar.start_symbol, grammar.symbols.get("program"));
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::MultipleStart("other".to_string())]);
    }

    #[test]
    fn rules_and_alternatives() {
        let parser = run("%{ %}\n%token NUM\n%%\nexpr : expr '+' NUM { add } | NUM ;\n");
        let grammar = parser.grammar();
        let rules = grammar.rules.iter().map(|r| grammar.display_rule(r)).collect::<Vec<_>>();

        assert_eq!(rules, vec!["expr: expr '+' NUM.", "expr: NUM."]);
        assert_eq!(grammar.rules[0].code.as_ref().map(|c| c.code.as_str()), Some("{ add }"));
        assert_eq!(grammar.rules[1].line, 4);
        assert_eq!(parser.error_count(), 0);
    }

    #[test]
    fn leading_empty_alternative_marks_nullable() {
        let parser = run("%{ %}\n%%\nopt : | B ;\nlist : | | C ;");
        let grammar = parser.grammar();
        let opt = grammar.symbols.get("opt").unwrap();

        assert!(grammar.symbols[opt].nullable);
        assert_eq!(grammar.display_rule(&grammar.rules[0]), "opt: B.");
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::DuplicateEmptyAlternative("list".to_string())]);
    }

    #[test]
    fn duplicate_empty_alternative_in_any_order() {
        let parser = run("%{ %}\n%%\na : B | ;\na : | C ;\nb : | D ;\nb : ;\nc : E | ;\n");
        assert_eq!(error_kinds(&parser), vec![
            &CompileErrorType::DuplicateEmptyAlternative("a".to_string()),
            &CompileErrorType::DuplicateEmptyAlternative("b".to_string()),
        ]);
        assert_eq!(parser.errors[0].location.line, 4);
        assert_eq!(parser.errors[1].location.line, 6);
    }

    #[test]
    fn empty_alternative_with_code_is_kept() {
        let parser = run("%{ %}\n%%\nopt : { none } | B { some } ;");
        let grammar = parser.grammar();
        let rules = grammar.rules.iter().map(|r| grammar.display_rule(r)).collect::<Vec<_>>();

        assert_eq!(rules, vec!["opt:.", "opt: B."]);
        assert!(grammar.symbols[grammar.rules[0].lhs].nullable);
    }

    #[test]
    fn explicit_precedence() {
        let parser = run("%{ %}\n%left MINUS\n%%\ne : MINUS e %prec MINUS { neg } | X ;\n");
        let grammar = parser.grammar();

        assert_eq!(grammar.rules[0].prec_symbol, grammar.symbols.get("MINUS"));
        assert!(grammar.rules[0].code.is_some());
        assert_eq!(grammar.display_rule(&grammar.rules[1]), "e: X.");
        assert_eq!(parser.state(), FsmState::WaitRuleLhsSymbol);
        assert_eq!(parser.error_count(), 0);
    }

    #[test]
    fn precedence_errors() {
        let parser = run("%{ %}\n%%\ne : A %prec UNKNOWN ;\nf : B %left ;\ng : C %prec C D ;\n");
        assert_eq!(error_kinds(&parser), vec![
            &CompileErrorType::UndeclaredPrecedenceSymbol("UNKNOWN".to_string()),
            &CompileErrorType::ExpectedPrecKeyword("left".to_string()),
            &CompileErrorType::UnexpectedAfterPrec("D".to_string()),
        ]);
    }

    #[test]
    fn undeclared_rhs_symbols_are_declared_by_case() {
        let parser = run("%{ %}\n%%\ns : item ID ';' ;\n");
        let grammar = parser.grammar();

        let item = grammar.symbols.get("item").unwrap();
        let id = grammar.symbols.get("ID").unwrap();
        let semi = grammar.symbols.get("';'").unwrap();
        assert!(!grammar.symbols[item].is_terminal());
        assert!(grammar.symbols[id].is_terminal());
        assert!(grammar.symbols[semi].is_terminal());
    }

    #[test]
    fn invalid_lhs_skips_rule() {
        let parser = run("%{ %}\n%%\nExpr : A B ;\ngood : C ;\n");
        let grammar = parser.grammar();

        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::InvalidLhs("Expr".to_string())]);
        assert_eq!(grammar.rule_count(), 1);
        assert_eq!(grammar.display_rule(&grammar.rules[0]), "good: C.");
    }

    #[test]
    fn missing_colon_is_recovered() {
        let parser = run("%{ %}\n%%\ns A ;\n");
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::ExpectedColon("A".to_string())]);
        assert_eq!(parser.grammar().display_rule(&parser.grammar().rules[0]), "s: A.");
    }

    #[test]
    fn misc_rule_errors() {
        let parser = run("%{ %}\n%%\n%\ns : A : { a } { b } ;\n");
        assert_eq!(error_kinds(&parser), vec![
            &CompileErrorType::NoRules,
            &CompileErrorType::UnexpectedToken(":".to_string()),
            &CompileErrorType::MultipleCodeBlocks("s".to_string()),
        ]);
    }

    #[test]
    fn missing_import_block_is_reported_once() {
        let parser = run("%token A\n%%\ns : A ;");
        assert_eq!(error_kinds(&parser), vec![&CompileErrorType::ExpectedImportBlock("token".to_string())]);
        assert_eq!(parser.grammar().rule_count(), 1);
    }

    #[test]
    fn trailing_section_marker() {
        let parser = run("%{ %}\n%%\ns : A ;\n%%");
        assert_eq!(parser.state(), FsmState::WaitSubRoutine2);
        assert!(parser.wants_trailing_code());
    }
}
