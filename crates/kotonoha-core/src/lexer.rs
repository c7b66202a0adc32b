//! The lexer: turns a source code point stream into a flat [`Token`]
//! sequence, normalising wide (full-width) and narrow glyph forms, and
//! Japanese keyword spellings, onto a single set of [`TokenKind`]s.
//!
//! A forward-only scan dispatching on the current code point, with one
//! code point of lookahead for two-character operators. The whole token
//! sequence is materialised up front rather than exposed as a lazy
//! iterator, because the parser needs to peek two tokens ahead at a few
//! points (the paren/call ambiguity), which a single-token-lookahead
//! iterator can't give cheaply.

use crate::token::{Position, Token, TokenKind};

fn is_ascii_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_fullwidth_digit(c: char) -> bool {
    ('\u{FF10}'..='\u{FF19}').contains(&c)
}

fn is_digit(c: char) -> bool {
    is_ascii_digit(c) || is_fullwidth_digit(c)
}

fn is_fullwidth_alpha(c: char) -> bool {
    ('\u{FF21}'..='\u{FF3A}').contains(&c) || ('\u{FF41}'..='\u{FF5A}').contains(&c)
}

fn is_hiragana(c: char) -> bool {
    ('\u{3041}'..='\u{3096}').contains(&c)
}

fn is_katakana(c: char) -> bool {
    ('\u{30A1}'..='\u{30FC}').contains(&c)
}

/// Approximates the Unicode `Han` script without pulling in a script-data
/// crate: the CJK Unified Ideographs block plus the common Extension A
/// block, which covers every Kanji a Kotonoha program plausibly contains.
fn is_han(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c) || ('\u{3400}'..='\u{4DBF}').contains(&c)
}

fn is_japanese(c: char) -> bool {
    is_hiragana(c) || is_katakana(c) || is_han(c)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || is_fullwidth_alpha(c) || is_japanese(c)
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || is_digit(c) || c == '_' || c == '＿'
}

fn is_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t' | ' ' | '　')
}

fn reserved_word(word: &str) -> Option<TokenKind> {
    Some(match word {
        "戻す" => TokenKind::Return,
        "もし" => TokenKind::If,
        "それ以外" => TokenKind::Else,
        "ならば" => TokenKind::Then,
        "繰り返す" => TokenKind::For,
        "それぞれ繰り返す" => TokenKind::ForEach,
        "関数" => TokenKind::Func,
        "真" => TokenKind::True,
        "偽" => TokenKind::False,
        "かつ" => TokenKind::And,
        "または" => TokenKind::Or,
        "ではない" => TokenKind::Not,
        _ => return None,
    })
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if is_whitespace(c)) {
            self.advance();
        }
    }

    /// Longest-match-first scan of reserved-word boundaries: the identifier
    /// loop already produces the maximal run of ident characters, so a
    /// reserved word is recognised purely by exact string comparison
    /// against that run (e.g. `それぞれ繰り返す` is one identifier run,
    /// not `それ` + `ぞれ繰り返す`).
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let pos = Position::new(self.line, self.column);
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", pos));
                break;
            };

            // comments
            if (c == '/' || c == '／') && matches!(self.peek_at(1), Some(n) if n == '/' || n == '／')
            {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
                continue;
            }
            if (c == '/' || c == '／') && matches!(self.peek_at(1), Some(n) if n == '*' || n == '＊')
            {
                self.advance();
                self.advance();
                loop {
                    match self.peek() {
                        None => break,
                        Some(a) if (a == '*' || a == '＊')
                            && matches!(self.peek_at(1), Some(b) if b == '/' || b == '／') =>
                        {
                            self.advance();
                            self.advance();
                            break;
                        }
                        _ => {
                            self.advance();
                        }
                    }
                }
                continue;
            }

            if c == '"' || c == '”' {
                self.advance();
                tokens.push(Token::new(TokenKind::DoubleQuotes, c, pos));
                let body_pos = Position::new(self.line, self.column);
                let mut body = String::new();
                while !matches!(self.peek(), None | Some('"') | Some('”')) {
                    body.push(self.advance().unwrap());
                }
                tokens.push(Token::new(TokenKind::StringBody, body, body_pos));
                if let Some(close) = self.peek() {
                    let close_pos = Position::new(self.line, self.column);
                    self.advance();
                    tokens.push(Token::new(TokenKind::DoubleQuotes, close, close_pos));
                }
                continue;
            }

            if is_digit(c) {
                let mut literal = String::new();
                while matches!(self.peek(), Some(d) if is_digit(d)) {
                    literal.push(self.advance().unwrap());
                }
                let mut is_float = false;
                if self.peek() == Some('.') && matches!(self.peek_at(1), Some(d) if is_digit(d)) {
                    is_float = true;
                    literal.push(self.advance().unwrap());
                    while matches!(self.peek(), Some(d) if is_digit(d)) {
                        literal.push(self.advance().unwrap());
                    }
                }
                let kind = if is_float { TokenKind::Float } else { TokenKind::Integer };
                tokens.push(Token::new(kind, literal, pos));
                continue;
            }

            // The symbol table wins over identifier scanning: 'ー'
            // (U+30FC) falls inside the Katakana range as well as being
            // the MINUS glyph, so it must be checked here first or
            // `5ー3` would lex as `5` + ident("ー3") instead of `5 - 3`.
            if let Some((kind, len)) = self.match_symbol() {
                let mut literal = String::new();
                for _ in 0..len {
                    literal.push(self.advance().unwrap());
                }
                tokens.push(Token::new(kind, literal, pos));
                continue;
            }

            if is_ident_start(c) {
                let mut literal = String::new();
                while matches!(self.peek(), Some(d) if is_ident_continue(d)) {
                    literal.push(self.advance().unwrap());
                }
                let kind = reserved_word(&literal).unwrap_or(TokenKind::Ident);
                tokens.push(Token::new(kind, literal, pos));
                continue;
            }

            let illegal = self.advance().unwrap();
            tokens.push(Token::new(TokenKind::Illegal, illegal, pos));
        }
        tokens
    }

    /// Returns the kind and the number of code points it spans, without
    /// consuming anything. `None` means "not a recognised symbol".
    fn match_symbol(&self) -> Option<(TokenKind, usize)> {
        let c = self.peek()?;
        let next = self.peek_at(1);
        let is_assign_eq = matches!(next, Some('=') | Some('＝'));

        Some(match c {
            '+' | '＋' => {
                if is_assign_eq {
                    (TokenKind::PlusAssign, 2)
                } else {
                    (TokenKind::Plus, 1)
                }
            }
            '-' | 'ー' => {
                if is_assign_eq {
                    (TokenKind::MinusAssign, 2)
                } else {
                    (TokenKind::Minus, 1)
                }
            }
            '*' | '＊' | '×' => {
                if is_assign_eq {
                    (TokenKind::AsteriskAssign, 2)
                } else {
                    (TokenKind::Asterisk, 1)
                }
            }
            '/' | '／' | '÷' => {
                if is_assign_eq {
                    (TokenKind::SlashAssign, 2)
                } else {
                    (TokenKind::Slash, 1)
                }
            }
            '^' | '＾' => (TokenKind::Caret, 1),
            '%' | '％' => (TokenKind::Percent, 1),
            '=' | '＝' => {
                if is_assign_eq {
                    (TokenKind::Eq, 2)
                } else {
                    (TokenKind::Assign, 1)
                }
            }
            '!' | '！' => {
                if is_assign_eq {
                    (TokenKind::NotEq, 2)
                } else {
                    (TokenKind::Not, 1)
                }
            }
            '<' | '＜' => {
                if is_assign_eq {
                    (TokenKind::Ge, 2)
                } else {
                    (TokenKind::Gt, 1)
                }
            }
            '>' | '＞' => {
                if is_assign_eq {
                    (TokenKind::Le, 2)
                } else {
                    (TokenKind::Lt, 1)
                }
            }
            '(' | '（' | '「' => (TokenKind::LParen, 1),
            ')' | '）' | '」' => (TokenKind::RParen, 1),
            '{' | '｛' => (TokenKind::LBrace, 1),
            '}' | '｝' => (TokenKind::RBrace, 1),
            '[' => (TokenKind::LSquareBrace, 1),
            ']' => (TokenKind::RSquareBrace, 1),
            ',' | '、' | '，' => (TokenKind::Comma, 1),
            '~' | '〜' => (TokenKind::Range, 1),
            '&' | '＆' if matches!(next, Some('&') | Some('＆')) => (TokenKind::And, 2),
            '|' | '｜' if matches!(next, Some('|') | Some('｜')) => (TokenKind::Or, 2),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    /// Property 1 (§8): a wide-form glyph and its narrow counterpart
    /// tokenize to the same `TokenKind` sequence.
    #[test_case("+", "＋")]
    #[test_case("*", "×")]
    #[test_case("/", "÷")]
    #[test_case("<=", "＜＝")]
    #[test_case("&&", "＆＆")]
    #[test_case("||", "｜｜")]
    #[test_case("!=", "！＝")]
    fn wide_and_narrow_operators_normalise_identically(narrow: &str, wide: &str) {
        assert_eq!(kinds(narrow), kinds(wide));
    }

    #[test]
    fn reserved_words_become_keywords() {
        assert_eq!(kinds("もし"), vec![TokenKind::If, TokenKind::Eof]);
        assert_eq!(
            kinds("それぞれ繰り返す"),
            vec![TokenKind::ForEach, TokenKind::Eof]
        );
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        assert_eq!(kinds("1 // comment\n2"), kinds("1\n2"));
        assert_eq!(kinds("1 /* comment */ 2"), kinds("1 2"));
        assert_eq!(kinds("１／／コメント\n２"), kinds("1\n2"));
    }

    #[test]
    fn string_literal_yields_quote_body_quote() {
        let kinds = kinds("\"abc\"");
        assert_eq!(
            kinds,
            vec![
                TokenKind::DoubleQuotes,
                TokenKind::StringBody,
                TokenKind::DoubleQuotes,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_has_no_closing_quote() {
        let kinds = kinds("\"abc");
        assert_eq!(kinds, vec![TokenKind::DoubleQuotes, TokenKind::StringBody, TokenKind::Eof]);
    }

    #[test]
    fn unknown_code_point_is_illegal_but_does_not_stop_the_scan() {
        let kinds = kinds("1 @ 2");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Integer,
                TokenKind::Illegal,
                TokenKind::Integer,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn minus_glyph_does_not_get_swallowed_by_katakana_identifier_scan() {
        // 'ー' (U+30FC) is both a Katakana code point and the MINUS glyph;
        // the symbol table must win so `5ー3` lexes as `5 MINUS 3`.
        assert_eq!(
            kinds("5ー3"),
            vec![TokenKind::Integer, TokenKind::Minus, TokenKind::Integer, TokenKind::Eof]
        );
    }
}
