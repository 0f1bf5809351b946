use super::token::{Token, TokenKind};

/// Single-pass lexical scanner for the highlighter.
///
/// This is not a JSON parser: it never rejects input. Every byte of the
/// source ends up inside exactly one token, in order, so concatenating the
/// token lexemes reconstructs the input. Malformed text simply degrades to
/// `Plain` tokens; structural diagnosis is the validator's job.
pub struct Tokenizer {
    input: Vec<u8>,
    pos: usize,
    depth: u32,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.as_bytes().to_vec(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Quoted string, ended by an unescaped quote. Uses a two-character
    /// lookback: `\"` stays inside the string, `\\"` ends it (escaped
    /// backslash, then a real quote). Unterminated strings run to the end
    /// of input.
    fn tokenize_string(&mut self, start: usize) -> Token {
        // Consume opening quote
        self.advance();

        while let Some(ch) = self.peek() {
            if ch == b'"' {
                let prev = self.input.get(self.pos.wrapping_sub(1)).copied();
                let prev2 = self.input.get(self.pos.wrapping_sub(2)).copied();
                let escaped = prev == Some(b'\\') && prev2 != Some(b'\\');
                if !escaped {
                    self.advance();
                    let kind = if self.colon_follows() {
                        TokenKind::Key
                    } else {
                        TokenKind::Str
                    };
                    return Token::new(kind, start, self.pos, 0);
                }
            }
            self.advance();
        }

        Token::new(TokenKind::Str, start, self.pos, 0)
    }

    /// A string is a key when the next non-whitespace character is `:`.
    fn colon_follows(&self) -> bool {
        let mut j = self.pos;
        while let Some(&ch) = self.input.get(j) {
            if ch.is_ascii_whitespace() {
                j += 1;
                continue;
            }
            return ch == b':';
        }
        false
    }

    /// Maximal run of number-ish characters. Deliberately looser than the
    /// JSON numeric grammar (multiple dots, dangling exponents) so that the
    /// overlay keeps column alignment on half-typed input.
    fn tokenize_number(&mut self, start: usize) -> Token {
        while let Some(ch) = self.peek() {
            match ch {
                b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E' => {
                    self.advance();
                }
                _ => break,
            }
        }
        Token::new(TokenKind::Number, start, self.pos, 0)
    }

    /// Literal keyword match; on mismatch the lead byte falls through as a
    /// single plain character, exactly like any other unclassified input.
    fn match_keyword(&mut self, start: usize, keyword: &[u8], kind: TokenKind) -> Token {
        if self.input[self.pos..].starts_with(keyword) {
            self.pos += keyword.len();
            Token::new(kind, start, self.pos, 0)
        } else {
            self.advance();
            Token::new(TokenKind::Plain, start, self.pos, 0)
        }
    }

    fn open_bracket(&mut self, start: usize, kind: TokenKind) -> Token {
        self.advance();
        let tag = (self.depth % 4) as u8;
        self.depth += 1;
        Token::new(kind, start, self.pos, tag)
    }

    fn close_bracket(&mut self, start: usize, kind: TokenKind) -> Token {
        self.advance();
        self.depth = self.depth.saturating_sub(1);
        Token::new(kind, start, self.pos, (self.depth % 4) as u8)
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let ch = self.peek()?;

        let token = match ch {
            b'{' => self.open_bracket(start, TokenKind::BraceOpen),
            b'}' => self.close_bracket(start, TokenKind::BraceClose),
            b'[' => self.open_bracket(start, TokenKind::BracketOpen),
            b']' => self.close_bracket(start, TokenKind::BracketClose),
            b':' => {
                self.advance();
                Token::new(TokenKind::Colon, start, self.pos, 0)
            }
            b',' => {
                self.advance();
                Token::new(TokenKind::Comma, start, self.pos, 0)
            }
            b'"' => self.tokenize_string(start),
            b'-' | b'0'..=b'9' => self.tokenize_number(start),
            b't' => self.match_keyword(start, b"true", TokenKind::Bool),
            b'f' => self.match_keyword(start, b"false", TokenKind::Bool),
            b'n' => self.match_keyword(start, b"null", TokenKind::Null),
            _ => self.tokenize_plain(start),
        };

        Some(token)
    }

    /// Run of bytes that cannot start any other token. Multi-byte UTF-8
    /// sequences are never token starters, so runs always end on a char
    /// boundary.
    fn tokenize_plain(&mut self, start: usize) -> Token {
        self.advance();
        while let Some(ch) = self.peek() {
            if matches!(
                ch,
                b'{' | b'}'
                    | b'['
                    | b']'
                    | b':'
                    | b','
                    | b'"'
                    | b'-'
                    | b'0'..=b'9'
                    | b't'
                    | b'f'
                    | b'n'
            ) {
                break;
            }
            self.advance();
        }
        Token::new(TokenKind::Plain, start, self.pos, 0)
    }

    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}
