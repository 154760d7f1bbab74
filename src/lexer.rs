//! Lexer for VibeScript
//!
//! Converts source code into a stream of tokens.

use crate::error::{ErrorKind, Result, VibeError};
use crate::token::{lookup_keyword, Span, Token, TokenKind};

/// Identifier that turns the rest of its line into a comment
const NOTE_COMMENT: &str = "note";

/// The lexer state
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from source code
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.current_pos, self.current_pos, self.line, self.column),
            String::new(),
        ));

        tracing::debug!(count = tokens.len(), "tokenized source");
        Ok(tokens)
    }

    /// Get the next token
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace_and_comments();

            let Some(&(start_pos, ch)) = self.chars.peek() else {
                return Ok(None);
            };

            let start_line = self.line;
            let start_column = self.column;

            let kind = match ch {
                '(' => { self.advance(); TokenKind::LeftParen }
                ')' => { self.advance(); TokenKind::RightParen }
                '{' => { self.advance(); TokenKind::LeftBrace }
                '}' => { self.advance(); TokenKind::RightBrace }
                '[' => { self.advance(); TokenKind::LeftBracket }
                ']' => { self.advance(); TokenKind::RightBracket }
                ',' => { self.advance(); TokenKind::Comma }
                ';' => { self.advance(); TokenKind::Semicolon }
                '+' => { self.advance(); TokenKind::Plus }
                '-' => { self.advance(); TokenKind::Minus }
                '*' => { self.advance(); TokenKind::Star }
                '/' => { self.advance(); TokenKind::Slash }
                '%' => { self.advance(); TokenKind::Percent }

                '=' => self.one_or_two('=', TokenKind::EqualEqual, TokenKind::Equal),
                '!' => self.one_or_two('=', TokenKind::BangEqual, TokenKind::Not),
                '<' => self.one_or_two('=', TokenKind::LessEqual, TokenKind::Less),
                '>' => self.one_or_two('=', TokenKind::GreaterEqual, TokenKind::Greater),

                '"' => self.scan_string()?,

                c if c.is_ascii_digit() => self.scan_number(start_line, start_column)?,

                c if c.is_alphabetic() || c == '_' => {
                    let text = self.scan_word();
                    if text == NOTE_COMMENT {
                        self.skip_to_line_end();
                        continue;
                    }
                    lookup_keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
                }

                _ => {
                    self.advance();
                    return Err(VibeError::new(
                        ErrorKind::UnexpectedCharacter(ch),
                        Some(Span::new(start_pos, self.current_pos, start_line, start_column)),
                    ));
                }
            };

            let lexeme = self.source[start_pos..self.current_pos].to_string();

            return Ok(Some(Token::new(
                kind,
                Span::new(start_pos, self.current_pos, start_line, start_column),
                lexeme,
            )));
        }
    }

    /// Consume one character, and a second one if it is `second`
    fn one_or_two(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Advance and return the current character
    fn advance(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.current_pos = pos + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Peek at the next character without advancing
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn skip_to_line_end(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip whitespace and `//` comments
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.source[self.current_pos..].starts_with("//") => {
                    self.skip_to_line_end();
                }
                _ => break,
            }
        }
    }

    /// Scan a string literal
    fn scan_string(&mut self) -> Result<TokenKind> {
        let start_line = self.line;
        let start_column = self.column;
        let start_pos = self.current_pos;

        // Opening quote
        self.advance();

        let mut value = String::new();

        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::String(value));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => { self.advance(); value.push('\n'); }
                        Some('t') => { self.advance(); value.push('\t'); }
                        Some('r') => { self.advance(); value.push('\r'); }
                        Some('\\') => { self.advance(); value.push('\\'); }
                        Some('"') => { self.advance(); value.push('"'); }
                        // unknown escapes stay as written
                        Some(c) => {
                            self.advance();
                            value.push('\\');
                            value.push(c);
                        }
                        None => break,
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => break,
            }
        }

        Err(VibeError::new(
            ErrorKind::UnterminatedString,
            Some(Span::new(start_pos, self.current_pos, start_line, start_column)),
        ))
    }

    /// Scan a number literal
    fn scan_number(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let start = self.current_pos;

        self.skip_digits();

        // A dot only belongs to the number when a digit follows it
        if self.peek_char() == Some('.') {
            let mut ahead = self.source[self.current_pos..].chars().skip(1);
            if ahead.next().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                self.skip_digits();
            }
        }

        let text = &self.source[start..self.current_pos];
        text.parse::<f64>().map(TokenKind::Number).map_err(|_| {
            VibeError::new(
                ErrorKind::InvalidNumber(text.to_string()),
                Some(Span::new(start, self.current_pos, line, column)),
            )
        })
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Scan an identifier-shaped word
    fn scan_word(&mut self) -> &'a str {
        let source = self.source;
        let start = self.current_pos;

        while self.peek_char().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        &source[start..self.current_pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        lexer.tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, TokenKind::Eof))
            .collect()
    }

    fn lex_error(source: &str) -> VibeError {
        Lexer::new(source).tokenize().unwrap_err()
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("hold lock say skill give keep each stop skip bet cap");
        assert_eq!(tokens, vec![
            TokenKind::Hold,
            TokenKind::Lock,
            TokenKind::Say,
            TokenKind::Skill,
            TokenKind::Give,
            TokenKind::Keep,
            TokenKind::Each,
            TokenKind::Stop,
            TokenKind::Skip,
            TokenKind::True,
            TokenKind::False,
        ]);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        let tokens = tokenize("Hold SAY");
        assert_eq!(tokens, vec![
            TokenKind::Ident("Hold".to_string()),
            TokenKind::Ident("SAY".to_string()),
        ]);
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("+ - * / % = == != < <= > >= ! not");
        assert_eq!(tokens, vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Equal,
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Not,
            TokenKind::Not,
        ]);
    }

    #[test]
    fn test_greedy_operators_without_spaces() {
        let tokens = tokenize("a>=b");
        assert_eq!(tokens, vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::GreaterEqual,
            TokenKind::Ident("b".to_string()),
        ]);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("7 0.5 0 250.25");
        assert_eq!(tokens, vec![
            TokenKind::Number(7.0),
            TokenKind::Number(0.5),
            TokenKind::Number(0.0),
            TokenKind::Number(250.25),
        ]);
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        let err = lex_error("7.");
        assert_eq!(err.kind, ErrorKind::UnexpectedCharacter('.'));
        assert_eq!(err.span.map(|s| s.column), Some(2));
    }

    #[test]
    fn test_strings_and_escapes() {
        let tokens = tokenize(r#""yo" "a\nb" "say \"hi\"" "back\\slash" "\q""#);
        assert_eq!(tokens, vec![
            TokenKind::String("yo".to_string()),
            TokenKind::String("a\nb".to_string()),
            TokenKind::String("say \"hi\"".to_string()),
            TokenKind::String("back\\slash".to_string()),
            TokenKind::String("\\q".to_string()),
        ]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex_error("say \"oops");
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
        let span = err.span.unwrap();
        assert_eq!((span.line, span.column), (1, 5));
    }

    #[test]
    fn test_identifiers() {
        let tokens = tokenize("vibe squad_size level2 _hidden holder");
        assert_eq!(tokens, vec![
            TokenKind::Ident("vibe".to_string()),
            TokenKind::Ident("squad_size".to_string()),
            TokenKind::Ident("level2".to_string()),
            TokenKind::Ident("_hidden".to_string()),
            TokenKind::Ident("holder".to_string()),
        ]);
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("hold x = 1 // trailing\nnote this whole line is ignored\nsay x");
        assert_eq!(tokens, vec![
            TokenKind::Hold,
            TokenKind::Ident("x".to_string()),
            TokenKind::Equal,
            TokenKind::Number(1.0),
            TokenKind::Say,
            TokenKind::Ident("x".to_string()),
        ]);
    }

    #[test]
    fn test_note_prefix_is_an_identifier() {
        let tokens = tokenize("notes");
        assert_eq!(tokens, vec![TokenKind::Ident("notes".to_string())]);
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("hold x = 1\n  say x").tokenize().unwrap();
        let say = &tokens[4];
        assert_eq!(say.kind, TokenKind::Say);
        assert_eq!((say.line(), say.column()), (2, 3));
        assert_eq!(say.lexeme, "say");

        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
    }

    #[test]
    fn test_literals() {
        let tokens = Lexer::new("12 \"s\" bet null x").tokenize().unwrap();
        assert_eq!(tokens[0].literal(), Some(crate::token::Literal::Number(12.0)));
        assert_eq!(tokens[1].literal(), Some(crate::token::Literal::String("s".to_string())));
        assert_eq!(tokens[2].literal(), Some(crate::token::Literal::Bool(true)));
        assert_eq!(tokens[3].literal(), Some(crate::token::Literal::Null));
        assert_eq!(tokens[4].literal(), None);
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex_error("hold x = 1\nhold y = @");
        assert_eq!(err.kind, ErrorKind::UnexpectedCharacter('@'));
        let span = err.span.unwrap();
        assert_eq!((span.line, span.column), (2, 10));
    }
}
