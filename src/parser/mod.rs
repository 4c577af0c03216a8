/*
    This module parses yacc/lemon style grammar files
*/

mod fsm;
mod lexer;
mod verifier;

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error_handling::*;
use crate::grammar::{CodeBlock, Grammar};
use fsm::ParserState;
use lexer::Tokenizer;
use verifier::verify_grammar;

pub use fsm::{FsmState, Keyword};

// io::Error has no PartialEq; compare by kind
#[derive(Debug)]
pub struct IoError(pub std::io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

#[derive(Debug, PartialEq)]
pub enum CompileErrorType {
    // Something other than `%{ ... %}` at the top of the file
    ExpectedImportBlock(String),
    // Declarations must start with `%`
    ExpectedKeywordOrSection(String),
    UnknownKeyword(String),
    ExpectedUnionBlock(String),
    // Holds the line of the first `%union`
    MultipleUnion(usize),
    MisplacedTag(String),
    NonterminalExpected { keyword: Keyword, name: String },
    TerminalExpected { keyword: Keyword, name: String },
    MultipleStart(String),
    PrecOutsideRule,
    // `%%` with no rule before it
    NoRules,
    InvalidLhs(String),
    ExpectedColon(String),
    UnexpectedToken(String),
    DuplicateEmptyAlternative(String),
    MultipleCodeBlocks(String),
    ExpectedPrecKeyword(String),
    UndeclaredPrecedenceSymbol(String),
    UnexpectedAfterPrec(String),
    ExpectedSubroutineMarker(String),
    // A nonterminal that is used but has no rules
    UndefinedNonterminal(String),
    UndefinedStartSymbol(String),
    UnterminatedComment,
    UnterminatedString,
    UnterminatedTag,
    UnterminatedCode,
    UnexpectedEof(FsmState),
    // There was an issue with reading a file
    FileError(IoError),
}

impl ErrorType for CompileErrorType {
    fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompileErrorType::UnterminatedComment
                | CompileErrorType::UnterminatedString
                | CompileErrorType::UnterminatedTag
                | CompileErrorType::UnterminatedCode
                | CompileErrorType::UnexpectedEof(_)
                | CompileErrorType::FileError(_)
        )
    }
}

impl Display for CompileErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileErrorType::ExpectedImportBlock(found) => write!(f, "Declaration must start with `%{{` and end with `%}}`. Found: `{}`", found),
            CompileErrorType::ExpectedKeywordOrSection(found) => write!(f, "Expected `%keyword` to declare a keyword or `%%` to start the rules. Found: `{}`", found),
            CompileErrorType::UnknownKeyword(found) => write!(f, "Unknown declaration keyword `%{}`", found),
            CompileErrorType::ExpectedUnionBlock(found) => write!(f, "Expected `{{ ... }}` after `%union`. Found: `{}`", found),
            CompileErrorType::MultipleUnion(line) => write!(f, "Multiple `%union` definitions. Previous definition is on line {}", line),
            CompileErrorType::MisplacedTag(tag) => write!(f, "Type tag `{}` must directly follow the keyword", tag),
            CompileErrorType::NonterminalExpected { keyword, name } => write!(f, "`{}` must be followed by a nonterminal (lowercase name): `{}`", keyword, name),
            CompileErrorType::TerminalExpected { keyword, name } => write!(f, "`{}` must be followed by a terminal (uppercase name or literal): `{}`", keyword, name),
            CompileErrorType::MultipleStart(name) => write!(f, "Start symbol already declared, ignoring `{}`", name),
            CompileErrorType::PrecOutsideRule => write!(f, "`%prec` is only allowed inside a rule"),
            CompileErrorType::NoRules => write!(f, "Unexpected `%%`, at least 1 rule must be defined"),
            CompileErrorType::InvalidLhs(found) => write!(f, "Left hand side of a rule must be a nonterminal: `{}`", found),
            CompileErrorType::ExpectedColon(found) => write!(f, "Expected `:` after the left hand side. Found: `{}`", found),
            CompileErrorType::UnexpectedToken(found) => write!(f, "Expected a symbol, `|`, `{{`, `%prec` or `;`. Found: `{}`", found),
            CompileErrorType::DuplicateEmptyAlternative(name) => write!(f, "Multiple empty alternatives for `{}`", name),
            CompileErrorType::MultipleCodeBlocks(name) => write!(f, "Alternative of `{}` already has a code block", name),
            CompileErrorType::ExpectedPrecKeyword(found) => write!(f, "Expected `%prec`. Found: `%{}`", found),
            CompileErrorType::UndeclaredPrecedenceSymbol(name) => write!(f, "Symbol after `%prec` must be declared: `{}`", name),
            CompileErrorType::UnexpectedAfterPrec(found) => write!(f, "Expected `|`, `{{` or `;` after `%prec` symbol. Found: `{}`", found),
            CompileErrorType::ExpectedSubroutineMarker(found) => write!(f, "Expected `%%` before the trailing code. Found: `{}`", found),
            CompileErrorType::UndefinedNonterminal(name) => write!(f, "Could not find definition for `{}`", name),
            CompileErrorType::UndefinedStartSymbol(name) => write!(f, "Start symbol `{}` has no rules", name),
            CompileErrorType::UnterminatedComment => write!(f, "EOF inside comment"),
            CompileErrorType::UnterminatedString => write!(f, "String starting on this line is not terminated before the end of the file"),
            CompileErrorType::UnterminatedTag => write!(f, "Type tag `<type>` starting on this line is not terminated before the end of the file"),
            CompileErrorType::UnterminatedCode => write!(f, "Code starting on this line is not terminated before the end of the file"),
            CompileErrorType::UnexpectedEof(state) => write!(f, "Unexpected end of file while {}", state),
            CompileErrorType::FileError(e) => write!(f, "File error: {}", e.0),
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Errors<CompileErrorType>;

fn io_error(error: std::io::Error, file: &Path) -> CompileError {
    CompileError {
        location: Location::new(file, 0),
        error: CompileErrorType::FileError(IoError(error))
    }
}

pub type Result<T> = std::result::Result<T, CompileErrorType>;
// Err holds every error seen so far, the last one being fatal
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

/// A grammar that parsed to the end, with the recoverable errors found on the way.
#[derive(Debug)]
pub struct Parsed {
    pub grammar: Grammar,
    pub errors: CompileErrors,
}

impl Parsed {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

// States in which the input may legally end
fn is_complete(state: FsmState, grammar: &Grammar) -> bool {
    match state {
        FsmState::WaitRuleLhsSymbol => grammar.rule_count() > 0,
        FsmState::WaitSubRoutine2 => true,
        _ => false,
    }
}

pub fn parse_str(text: &str, file: impl Into<PathBuf>) -> FileResult<Parsed> {
    let mut tokenizer = Tokenizer::new(text.chars());
    let mut parser = ParserState::new(file);

    loop {
        match tokenizer.next_token() {
            Ok(Some(token)) => parser.consume(token),
            Ok(None) => break,
            Err(error) => {
                parser.error(tokenizer.start_line(), error);
                let (_, _, errors) = parser.into_parts();
                return Err(errors);
            }
        }

        if parser.wants_trailing_code() {
            let line = tokenizer.line();
            parser.set_trailing_code(tokenizer.take_rest(), line);
        }
    }

    let state = parser.state();
    if !is_complete(state, parser.grammar()) {
        parser.error(tokenizer.line(), CompileErrorType::UnexpectedEof(state));
        let (_, _, errors) = parser.into_parts();
        return Err(errors);
    }

    let grammar = parser.grammar();
    let code_len = |block: &Option<CodeBlock>| block.as_ref().map_or(0, |b| b.code.len());
    debug!(
        "parsed {} rules with {} errors; code bytes: import {}, union {}, trailing {}",
        grammar.rule_count(),
        parser.error_count(),
        code_len(&grammar.import_code),
        code_len(&grammar.union_code),
        code_len(&grammar.trailing_code)
    );
    let (file, grammar, mut errors) = parser.into_parts();
    errors.extend(verify_grammar(&grammar, &file));

    info!(
        "{}: {} rules, {} terminals, {} nonterminals, {} errors",
        file.display(),
        grammar.rule_count(),
        grammar.symbols.terminal_count(),
        grammar.symbols.nonterminal_count(),
        errors.len()
    );

    Ok(Parsed { grammar, errors })
}

pub fn parse_file(path: &Path) -> FileResult<Parsed> {
    let text = fs::read_to_string(path).map_err(|e| vec![io_error(e, path)])?;
    parse_str(&text, path)
}
