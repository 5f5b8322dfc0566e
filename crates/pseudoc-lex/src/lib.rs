//! Lexical analysis: source text to a stream of [`Token`]s.
//!
//! Whitespace and `//` line comments are skipped silently. Keyword lexemes
//! are canonicalised to upper case at this stage (`spec.md` §6: "all
//! keywords case-insensitive at lex time, canonicalised to upper case");
//! identifiers keep their original case. Multi-character operators
//! (`<-`, `<=`, `>=`, `<>`) are matched greedily before falling back to
//! their single-character prefixes.

use pseudoc_util::{Handler, Span, Stage, Symbol};
use std::fmt;

/// The closed set of lexical kinds `spec.md` §3 describes for `Token.kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    Identifier,

    // keywords
    Declare,
    Constant,
    Type,
    EndType,
    If,
    Then,
    Else,
    EndIf,
    While,
    Do,
    EndWhile,
    For,
    To,
    Step,
    Next,
    Repeat,
    Until,
    Case,
    Of,
    Otherwise,
    EndCase,
    Procedure,
    EndProcedure,
    Function,
    Returns,
    EndFunction,
    Call,
    Return,
    Output,
    Input,
    OpenFile,
    ReadFile,
    WriteFile,
    CloseFile,
    Array,
    ByVal,
    ByRef,
    True,
    False,
    And,
    Or,
    Not,
    Div,
    Mod,

    // type names (lexed as identifiers, recognised by the parser; see
    // `pseudoc-par`'s keyword-vs-typename table)

    // operators & punctuation
    Arrow, // <-
    Eq,    // =
    Ne,    // <>
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// `{ kind, lexeme, line, column }` (`spec.md` §3). `lexeme` for
/// identifiers and literals carries the interned source text; keywords and
/// punctuation are fully determined by `kind`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Symbol,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: Symbol, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

fn keyword_kind(upper: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match upper {
        "DECLARE" => Declare,
        "CONSTANT" => Constant,
        "TYPE" => Type,
        "ENDTYPE" => EndType,
        "IF" => If,
        "THEN" => Then,
        "ELSE" => Else,
        "ENDIF" => EndIf,
        "WHILE" => While,
        "DO" => Do,
        "ENDWHILE" => EndWhile,
        "FOR" => For,
        "TO" => To,
        "STEP" => Step,
        "NEXT" => Next,
        "REPEAT" => Repeat,
        "UNTIL" => Until,
        "CASE" => Case,
        "OF" => Of,
        "OTHERWISE" => Otherwise,
        "ENDCASE" => EndCase,
        "PROCEDURE" => Procedure,
        "ENDPROCEDURE" => EndProcedure,
        "FUNCTION" => Function,
        "RETURNS" => Returns,
        "ENDFUNCTION" => EndFunction,
        "CALL" => Call,
        "RETURN" => Return,
        "OUTPUT" => Output,
        "INPUT" => Input,
        "OPENFILE" => OpenFile,
        "READFILE" => ReadFile,
        "WRITEFILE" => WriteFile,
        "CLOSEFILE" => CloseFile,
        "ARRAY" => Array,
        "BYVAL" => ByVal,
        "BYREF" => ByRef,
        "TRUE" => True,
        "FALSE" => False,
        "AND" => And,
        "OR" => Or,
        "NOT" => Not,
        "DIV" => Div,
        "MOD" => Mod,
        _ => return None,
    })
}

/// Character-stream scanner. Holds a cursor into `source` plus the
/// line/column it last advanced from; every `next_token` call reports
/// through `handler` and, on error, returns `Token::Eof` so callers can
/// check `handler.has_error()` rather than matching on a dedicated error
/// token kind.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
    line: u32,
    column: u32,
    interner: &'a mut pseudoc_util::Interner,
    handler: &'a mut Handler,
}

impl<'a> Lexer<'a> {
    pub fn new(
        source: &'a str,
        interner: &'a mut pseudoc_util::Interner,
        handler: &'a mut Handler,
    ) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position: 0,
            line: 1,
            column: 1,
            interner,
            handler,
        }
    }

    /// Tokenise the whole source, stopping at the first error (the
    /// returned vector never contains a partial/garbage tail past it).
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof || self.handler.has_error() {
                break;
            }
        }
        tokens
    }

    fn current(&self) -> char {
        self.source[self.position..].chars().next().unwrap_or('\0')
    }

    fn peek_at(&self, offset: usize) -> char {
        self.source[self.position..].chars().nth(offset).unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn advance(&mut self) -> char {
        let c = self.current();
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn at_line_col(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn report(&mut self, message: impl Into<String>, line: u32, column: u32) {
        self.handler.error(Stage::Lex, message, Span::point(line, column));
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.current() {
                c if c.is_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_at(1) == '/' => {
                    while !self.is_at_end() && self.current() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let (line, column) = self.at_line_col();
        let start = self.position;

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, self.interner.intern(""), Span::new(start, start, line, column));
        }

        let c = self.current();
        let kind = match c {
            '<' => {
                self.advance();
                if self.current() == '-' {
                    self.advance();
                    TokenKind::Arrow
                } else if self.current() == '=' {
                    self.advance();
                    TokenKind::Le
                } else if self.current() == '>' {
                    self.advance();
                    TokenKind::Ne
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.advance();
                if self.current() == '=' {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            '^' => {
                self.advance();
                TokenKind::Caret
            }
            '=' => {
                self.advance();
                TokenKind::Eq
            }
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            '[' => {
                self.advance();
                TokenKind::LBracket
            }
            ']' => {
                self.advance();
                TokenKind::RBracket
            }
            '&' => {
                self.advance();
                TokenKind::Ampersand
            }
            '.' => {
                self.advance();
                TokenKind::Dot
            }
            '"' | '\'' => return self.lex_string(c, start, line, column),
            c if c.is_ascii_digit() => return self.lex_number(start, line, column),
            c if c.is_ascii_alphabetic() || c == '_' => return self.lex_identifier(start, line, column),
            c => {
                self.advance();
                self.report(format!("unexpected character '{}'", c), line, column);
                TokenKind::Eof
            }
        };

        let lexeme = self.interner.intern(&self.source[start..self.position]);
        Token::new(kind, lexeme, Span::new(start, self.position, line, column))
    }

    fn lex_identifier(&mut self, start: usize, line: u32, column: u32) -> Token {
        while !self.is_at_end() && (self.current().is_ascii_alphanumeric() || self.current() == '_') {
            self.advance();
        }
        let text = &self.source[start..self.position];
        let upper = text.to_ascii_uppercase();
        let span = Span::new(start, self.position, line, column);
        if let Some(kind) = keyword_kind(&upper) {
            Token::new(kind, self.interner.intern(&upper), span)
        } else {
            Token::new(TokenKind::Identifier, self.interner.intern(text), span)
        }
    }

    fn lex_number(&mut self, start: usize, line: u32, column: u32) -> Token {
        while !self.is_at_end() && self.current().is_ascii_digit() {
            self.advance();
        }
        let mut is_real = false;
        if self.current() == '.' && self.peek_at(1).is_ascii_digit() {
            is_real = true;
            self.advance();
            while !self.is_at_end() && self.current().is_ascii_digit() {
                self.advance();
            }
        }
        let text = &self.source[start..self.position];
        let span = Span::new(start, self.position, line, column);
        let kind = if is_real { TokenKind::RealLiteral } else { TokenKind::IntegerLiteral };
        Token::new(kind, self.interner.intern(text), span)
    }

    /// Strings use matched `"` or `'`; `\` drops itself and keeps the
    /// following character literally (`spec.md` §4.1) — there is no `\n`,
    /// `\t` escape table, just "skip the backslash".
    fn lex_string(&mut self, quote: char, start: usize, line: u32, column: u32) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                self.report("unterminated string literal", line, column);
                break;
            }
            let c = self.current();
            if c == quote {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                if self.is_at_end() {
                    self.report("unterminated string literal", line, column);
                    break;
                }
                value.push(self.advance());
                continue;
            }
            value.push(self.advance());
        }
        let span = Span::new(start, self.position, line, column);
        Token::new(TokenKind::StringLiteral, self.interner.intern(&value), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pseudoc_util::Interner;

    fn lex(src: &str) -> (Vec<Token>, Handler, Interner) {
        let mut interner = Interner::new();
        let mut handler = Handler::new();
        let tokens = {
            let lexer = Lexer::new(src, &mut interner, &mut handler);
            lexer.tokenize()
        };
        (tokens, handler, interner)
    }

    #[test]
    fn keywords_canonicalise_to_upper_case() {
        let (tokens, handler, _) = lex("declare x : Integer");
        assert!(!handler.has_error());
        assert_eq!(tokens[0].kind, TokenKind::Declare);
    }

    #[test]
    fn multi_char_operators_match_before_single_char() {
        let (tokens, _, _) = lex("<- <= >= <>");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Arrow, TokenKind::Le, TokenKind::Ge, TokenKind::Ne, TokenKind::Eof]);
    }

    #[test]
    fn backslash_escapes_next_char_literally() {
        let (tokens, handler, interner) = lex(r#""a\"b""#);
        assert!(!handler.has_error());
        assert_eq!(interner.resolve(tokens[0].lexeme), "a\"b");
    }

    #[test]
    fn real_literal_requires_digit_after_dot() {
        let (tokens, _, interner) = lex("3.14");
        assert_eq!(tokens[0].kind, TokenKind::RealLiteral);
        assert_eq!(interner.resolve(tokens[0].lexeme), "3.14");
    }

    #[test]
    fn line_comment_is_skipped() {
        let (tokens, _, _) = lex("X <- 1 // comment\nY <- 2");
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Arrow).count(), 2);
    }

    #[test]
    fn unknown_character_reports_lex_error() {
        let (_, handler, _) = lex("X <- @");
        assert!(handler.has_error());
    }

    #[test]
    fn keyword_lexeme_preserves_upper_case_but_identifier_keeps_case() {
        let (tokens, _, interner) = lex("myVar");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(interner.resolve(tokens[0].lexeme), "myVar");
    }
}
