//! Token sequences and submissions
//!
//! A [`Token`] is a coarse lexical unit tagged with a type from a small
//! per-language alphabet. A [`TokenList`] is the fully materialized stream
//! of one submission, always terminated by a `FILE_END` pivot and with
//! `SEPARATOR` pivots between concatenated files. The list also owns the
//! per-submission matcher caches (window hashes, hash index, base-code
//! flags) as position-indexed side tables, so the tokens themselves stay
//! immutable.

pub mod semantics;

pub use semantics::{CodeSemantics, Variable, VariableRegistry};

use serde::{Deserialize, Serialize};

use crate::matching::HashIndex;
use crate::{TesseraError, TesseraResult};

// ─── Token types ───────────────────────────────────────────────────

/// A token type drawn from the frontend's alphabet.
///
/// Two values are reserved: [`TokenType::FILE_END`] terminates every list
/// and guards end-of-stream reads in the matcher, [`TokenType::SEPARATOR`]
/// sits between concatenated files. Neither is ever part of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenType(pub u32);

impl TokenType {
    pub const FILE_END: TokenType = TokenType(0);
    pub const SEPARATOR: TokenType = TokenType(1);

    /// Pivot and separator tokens never participate in matches.
    pub fn is_reserved(self) -> bool {
        self == Self::FILE_END || self == Self::SEPARATOR
    }

    /// The low six bits fed into the rolling hash.
    pub(crate) fn low_bits(self) -> u64 {
        u64::from(self.0 & 0x3f)
    }
}

// ─── Tokens ────────────────────────────────────────────────────────

/// One lexical unit with its source position and semantic annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    token_type: TokenType,
    line: u32,
    column: u32,
    length: u32,
    semantics: CodeSemantics,
}

impl Token {
    pub fn new(token_type: TokenType, line: u32, column: u32, length: u32) -> Self {
        Self {
            token_type,
            line,
            column,
            length,
            semantics: CodeSemantics::none(),
        }
    }

    pub fn with_semantics(mut self, semantics: CodeSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// The synthetic end-of-file pivot.
    pub fn file_end() -> Self {
        Self::new(TokenType::FILE_END, 0, 0, 0)
    }

    /// The synthetic between-files separator.
    pub fn separator() -> Self {
        Self::new(TokenType::SEPARATOR, 0, 0, 0)
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn semantics(&self) -> &CodeSemantics {
        &self.semantics
    }
}

// ─── Token lists ───────────────────────────────────────────────────

/// The materialized token stream of one submission.
///
/// Invariant: the last token is always `FILE_END`. The matcher relies on
/// this pivot to bound its inner scans, so construction fails fast when it
/// is missing instead of letting a comparison run off the end.
#[derive(Debug, Clone)]
pub struct TokenList {
    tokens: Vec<Token>,
    basecode: Vec<bool>,
    has_base_code: bool,
    // Matcher caches, valid for `hash_window` only. A window of 0 means
    // the list has not been hashed since the last invalidation.
    hashes: Vec<Option<u64>>,
    hash_window: usize,
    hash_excludes_base_code: bool,
    index: Option<HashIndex>,
}

impl TokenList {
    /// Wraps a frontend-produced stream, validating the pivot invariant.
    pub fn new(tokens: Vec<Token>) -> TesseraResult<Self> {
        match tokens.last() {
            Some(last) if last.token_type() == TokenType::FILE_END => Ok(Self::unchecked(tokens)),
            _ => Err(TesseraError::MissingEndPivot {
                found: tokens.len(),
            }),
        }
    }

    /// Concatenates per-file streams into one submission list, inserting a
    /// `SEPARATOR` between files and the trailing `FILE_END` pivot.
    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = Vec<Token>>,
    {
        let mut tokens = Vec::new();
        for (file_number, file) in files.into_iter().enumerate() {
            if file_number > 0 {
                tokens.push(Token::separator());
            }
            tokens.extend(file);
        }
        tokens.push(Token::file_end());
        Self::unchecked(tokens)
    }

    fn unchecked(tokens: Vec<Token>) -> Self {
        let size = tokens.len();
        Self {
            tokens,
            basecode: vec![false; size],
            has_base_code: false,
            hashes: Vec::new(),
            hash_window: 0,
            hash_excludes_base_code: false,
            index: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, position: usize) -> &Token {
        &self.tokens[position]
    }

    pub fn token_type(&self, position: usize) -> TokenType {
        self.tokens[position].token_type()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the token at `position` was claimed by a base-code tile.
    pub fn is_base_code(&self, position: usize) -> bool {
        self.basecode[position]
    }

    pub(crate) fn flag_base_code(&mut self, start: usize, length: usize) {
        for flag in &mut self.basecode[start..start + length] {
            *flag = true;
        }
        self.has_base_code |= length > 0;
    }

    /// Tokens that can take part in a match: everything that is neither a
    /// reserved pivot nor flagged as base code.
    pub fn matchable_token_count(&self) -> usize {
        self.tokens
            .iter()
            .zip(&self.basecode)
            .filter(|(token, &basecode)| !token.token_type().is_reserved() && !basecode)
            .count()
    }

    /// Source line span `(first, last)` covered by a token range, for
    /// enriching match records downstream. Synthetic pivots carry line 0
    /// and are skipped.
    pub fn line_range(&self, start: usize, length: usize) -> Option<(u32, u32)> {
        let lines: Vec<u32> = self.tokens[start..start + length]
            .iter()
            .filter(|token| !token.token_type().is_reserved())
            .map(Token::line)
            .collect();
        Some((*lines.iter().min()?, *lines.iter().max()?))
    }

    // ─── Matcher cache plumbing ────────────────────────────────────

    pub(crate) fn hash_at(&self, position: usize) -> Option<u64> {
        self.hashes.get(position).copied().flatten()
    }

    pub(crate) fn index(&self) -> Option<&HashIndex> {
        self.index.as_ref()
    }

    /// Whether the cached hashes can be reused for a run with this window
    /// width. The cache also remembers whether base-code tokens were
    /// treated as marked; a mismatch only matters once any flag is set.
    pub(crate) fn hashes_valid_for(
        &self,
        window: usize,
        need_index: bool,
        exclude_base_code: bool,
    ) -> bool {
        self.hash_window == window
            && (!need_index || self.index.is_some())
            && (self.hash_excludes_base_code == exclude_base_code || !self.has_base_code)
    }

    pub(crate) fn store_hashes(
        &mut self,
        hashes: Vec<Option<u64>>,
        window: usize,
        excludes_base_code: bool,
        index: Option<HashIndex>,
    ) {
        self.hashes = hashes;
        self.hash_window = window;
        self.hash_excludes_base_code = excludes_base_code;
        self.index = index;
    }

    /// Drops the hash caches; called when the base-code flags change, since
    /// the flags feed the marked set the hashes were computed under.
    pub(crate) fn invalidate_hashes(&mut self) {
        self.hashes.clear();
        self.hash_window = 0;
        self.index = None;
    }
}

// ─── Submissions ───────────────────────────────────────────────────

/// A named token stream, the unit of comparison.
#[derive(Debug, Clone)]
pub struct Submission {
    name: String,
    tokens: TokenList,
}

impl Submission {
    pub fn new(name: impl Into<String>, tokens: TokenList) -> Self {
        Self {
            name: name.into(),
            tokens,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut TokenList {
        &mut self.tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────
