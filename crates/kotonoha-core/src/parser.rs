//! The parser: hand-written recursive-descent with precedence climbing,
//! producing a [`Program`] plus a list of accumulated [`SyntaxError`]s.
//!
//! A `Parser` struct holds a cursor over the token stream and an
//! `errors` accumulator; one function per grammar production, each
//! returning `Option<T>` where `None` means "this production failed and
//! already recorded why." This grammar's error-recovery contract
//! (§4.2: continue at the next top-level statement) calls for
//! swallowing the failure locally instead of aborting the whole parse,
//! which an `Option` expresses more directly than a `Result` whose
//! `Err` case the caller always recovers from anyway.

use smallvec::smallvec;

use crate::ast::{Expr, ExprList, OperatorKind, ParamList, Program, Stmt};
use crate::error_parsing::{SyntaxError, SyntaxErrorKind};
use crate::token::{Position, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> (Program, Vec<SyntaxError>) {
        let mut nodes = Vec::new();
        while !self.at_eof() {
            match self.parse_top_level() {
                Some(stmt) => nodes.push(stmt),
                None => {
                    // The offending production already recorded its error;
                    // skip at least one token so top-level recovery makes
                    // progress instead of looping forever on the same token.
                    if !self.at_eof() {
                        self.advance();
                    }
                }
            }
        }
        (Program { nodes }, self.errors)
    }

    // -- cursor helpers -----------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, err_kind: SyntaxErrorKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            let pos = self.current().position;
            self.error(err_kind, message, pos);
            None
        }
    }

    fn error(&mut self, kind: SyntaxErrorKind, message: impl Into<String>, position: Position) {
        self.errors.push(SyntaxError::new(kind, message, position));
    }

    // -- program / func_decl -------------------------------------------

    fn parse_top_level(&mut self) -> Option<Stmt> {
        if self.check(TokenKind::Func) {
            self.parse_func_decl()
        } else {
            self.parse_stmt()
        }
    }

    /// `func_decl := FUNC (pre_form | post_form)`
    fn parse_func_decl(&mut self) -> Option<Stmt> {
        let position = self.current().position;
        self.advance(); // FUNC

        if self.check(TokenKind::Ident) {
            // pre_form: IDENT "(" params ")" block
            let name = self.advance().literal;
            self.expect(TokenKind::LParen, SyntaxErrorKind::UnexpectedToken, "expected ( after function name")?;
            let params = self.parse_params()?;
            self.expect(TokenKind::RParen, SyntaxErrorKind::MissingRParen, "missing ) in parameter list")?;
            let body = self.parse_block()?;
            Some(Stmt::Func { name, params, body: Box::new(body), position })
        } else if self.check(TokenKind::LParen) {
            // post_form: "(" params ")" IDENT block
            self.advance();
            let params = self.parse_params()?;
            self.expect(TokenKind::RParen, SyntaxErrorKind::MissingRParen, "missing ) in parameter list")?;
            if !self.check(TokenKind::Ident) {
                let pos = self.current().position;
                self.error(SyntaxErrorKind::MissingFunctionName, "expected function name", pos);
                return None;
            }
            let name = self.advance().literal;
            let body = self.parse_block()?;
            Some(Stmt::Func { name, params, body: Box::new(body), position })
        } else {
            self.error(SyntaxErrorKind::MissingFunctionName, "expected function name or (", position);
            None
        }
    }

    /// `params := (IDENT ("," IDENT)*)?`
    fn parse_params(&mut self) -> Option<ParamList> {
        let mut params: ParamList = smallvec![];
        if self.check(TokenKind::RParen) {
            return Some(params);
        }
        loop {
            if !self.check(TokenKind::Ident) {
                let pos = self.current().position;
                self.error(SyntaxErrorKind::UnexpectedToken, "expected parameter name", pos);
                return None;
            }
            // Duplicate parameter names are accepted here; the later
            // binding simply wins at call time (§9).
            params.push(self.advance().literal);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Some(params)
    }

    /// `block := "{" stmt* "}"`
    fn parse_block(&mut self) -> Option<Stmt> {
        let position = self.current().position;
        self.expect(TokenKind::LBrace, SyntaxErrorKind::UnexpectedToken, "expected {")?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            match self.parse_stmt() {
                Some(stmt) => statements.push(stmt),
                None => {
                    if !self.at_eof() {
                        self.advance();
                    }
                }
            }
        }
        self.expect(TokenKind::RBrace, SyntaxErrorKind::MissingRBrace, "missing }")?;
        Some(Stmt::Block { statements, position })
    }

    // -- stmt -----------------------------------------------------------

    /// `stmt := if_stmt | block | expr_tail`
    fn parse_stmt(&mut self) -> Option<Stmt> {
        if self.check(TokenKind::If) {
            self.parse_if_stmt()
        } else if self.check(TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.parse_expr_tail()
        }
    }

    /// `if_stmt := IF expr THEN? block (ELSE block)?`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let position = self.current().position;
        self.advance(); // IF
        let condition = self.parse_expr()?;
        if self.check(TokenKind::Then) {
            self.advance();
        }
        let consequence = self.parse_block()?;
        let alternative = if self.check(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };
        Some(Stmt::If {
            condition,
            consequence: Box::new(consequence),
            alternative,
            position,
        })
    }

    /// `expr_tail := expr ( FOREACH block | THEN? FOR block | RETURN | ε )`
    ///
    /// The postfix keyword decides what the already-parsed expression
    /// means: an array to iterate, a loop condition, a return value, or
    /// (absent any of those) a bare expression statement.
    fn parse_expr_tail(&mut self) -> Option<Stmt> {
        let position = self.current().position;
        let expr = self.parse_expr()?;

        if self.check(TokenKind::ForEach) {
            self.advance();
            let body = self.parse_block()?;
            Some(Stmt::ForEach { array: expr, body: Box::new(body), position })
        } else if self.check(TokenKind::Then) || self.check(TokenKind::For) {
            if self.check(TokenKind::Then) {
                self.advance();
            }
            self.expect(TokenKind::For, SyntaxErrorKind::UnexpectedToken, "expected 繰り返す")?;
            let body = self.parse_block()?;
            Some(Stmt::For { condition: expr, body: Box::new(body), position })
        } else if self.check(TokenKind::Return) {
            self.advance();
            Some(Stmt::Return { value: expr, position })
        } else {
            Some(Stmt::Expr(expr))
        }
    }

    // -- expr, by precedence, lowest to highest --------------------------

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_assign()
    }

    /// `assign := logical ( (ASSIGN|PA|MA|AA|SA) rhs )?`
    fn parse_assign(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let left = self.parse_logical()?;
        let op = match self.current().kind {
            TokenKind::Assign => OperatorKind::Assign,
            TokenKind::PlusAssign => OperatorKind::PlusAssign,
            TokenKind::MinusAssign => OperatorKind::MinusAssign,
            TokenKind::AsteriskAssign => OperatorKind::AsteriskAssign,
            TokenKind::SlashAssign => OperatorKind::SlashAssign,
            _ => return Some(left),
        };
        self.advance();
        let right = self.parse_assign()?;
        Some(Expr::Infix { left: Box::new(left), op, right: Box::new(right), position })
    }

    /// `logical := equality ( (AND|OR) logical )?` — right-associative.
    fn parse_logical(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let left = self.parse_equality()?;
        let op = match self.current().kind {
            TokenKind::And => OperatorKind::And,
            TokenKind::Or => OperatorKind::Or,
            _ => return Some(left),
        };
        self.advance();
        let right = self.parse_logical()?;
        Some(Expr::Infix { left: Box::new(left), op, right: Box::new(right), position })
    }

    /// `equality := relational ( (EQ|NOT_EQ) relational )*`
    fn parse_equality(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let mut node = self.parse_relational()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Eq => OperatorKind::Eq,
                TokenKind::NotEq => OperatorKind::NotEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            node = Expr::Infix { left: Box::new(node), op, right: Box::new(rhs), position };
        }
        Some(node)
    }

    /// `relational := list ( (GT|GE|LT|LE) add )*`
    ///
    /// §4.2's canonicalisation happens here. The lexer already names `<`
    /// as `Gt` and `<=` as `Ge` (the table in §4.1); this production
    /// swaps their operands so the evaluator only ever sees `Gt`/`Ge`
    /// meaning literal "greater than"/"greater or equal". `Lt`/`Le`
    /// (from `>`/`>=`) already read in the right direction, so they are
    /// renamed to `Gt`/`Ge` without swapping.
    fn parse_relational(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let mut node = self.parse_list()?;
        loop {
            match self.current().kind {
                TokenKind::Gt => {
                    self.advance();
                    let rhs = self.parse_add()?;
                    node = Expr::Infix { left: Box::new(rhs), op: OperatorKind::Gt, right: Box::new(node), position };
                }
                TokenKind::Ge => {
                    self.advance();
                    let rhs = self.parse_add()?;
                    node = Expr::Infix { left: Box::new(rhs), op: OperatorKind::Ge, right: Box::new(node), position };
                }
                TokenKind::Lt => {
                    self.advance();
                    let rhs = self.parse_add()?;
                    node = Expr::Infix { left: Box::new(node), op: OperatorKind::Gt, right: Box::new(rhs), position };
                }
                TokenKind::Le => {
                    self.advance();
                    let rhs = self.parse_add()?;
                    node = Expr::Infix { left: Box::new(node), op: OperatorKind::Ge, right: Box::new(rhs), position };
                }
                _ => break,
            }
        }
        Some(node)
    }

    /// `list := add ( RANGE add )?`
    fn parse_list(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let left = self.parse_add()?;
        if self.check(TokenKind::Range) {
            self.advance();
            let right = self.parse_add()?;
            Some(Expr::Infix { left: Box::new(left), op: OperatorKind::Range, right: Box::new(right), position })
        } else {
            Some(left)
        }
    }

    /// `add := mul ( (PLUS|MINUS) mul )*`
    fn parse_add(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let mut node = self.parse_mul()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => OperatorKind::Add,
                TokenKind::Minus => OperatorKind::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            node = Expr::Infix { left: Box::new(node), op, right: Box::new(rhs), position };
        }
        Some(node)
    }

    /// `mul := unary ( (ASTERISK|SLASH|CALET|PARCENT) unary )*`
    fn parse_mul(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let mut node = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Asterisk => OperatorKind::Mul,
                TokenKind::Slash => OperatorKind::Div,
                TokenKind::Caret => OperatorKind::Exponent,
                TokenKind::Percent => OperatorKind::Modulus,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            node = Expr::Infix { left: Box::new(node), op, right: Box::new(rhs), position };
        }
        Some(node)
    }

    /// `unary := (PLUS|MINUS|NOT)? primary`
    fn parse_unary(&mut self) -> Option<Expr> {
        let position = self.current().position;
        let op = match self.current().kind {
            TokenKind::Plus => Some(OperatorKind::Add),
            TokenKind::Minus => Some(OperatorKind::Sub),
            TokenKind::Not => Some(OperatorKind::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let right = self.parse_primary()?;
                Some(Expr::Prefix { op, right: Box::new(right), position })
            }
            None => self.parse_primary(),
        }
    }

    /// `primary := "(" paren_tail | ident_tail | array_lit
    ///           | string_lit | integer | float | boolean`
    fn parse_primary(&mut self) -> Option<Expr> {
        let position = self.current().position;
        match self.current().kind {
            TokenKind::LParen => {
                self.advance();
                self.parse_paren_tail(position)
            }
            TokenKind::Ident => {
                let name = self.advance().literal;
                self.parse_ident_tail(name, position)
            }
            TokenKind::LBrace => self.parse_array_lit(position),
            TokenKind::DoubleQuotes => self.parse_string_lit(position),
            TokenKind::Integer => {
                let literal = self.advance().literal;
                match normalize_digits(&literal).parse::<i64>() {
                    Ok(value) => Some(Expr::Integer { value, position }),
                    Err(_) => {
                        self.error(SyntaxErrorKind::UnexpectedToken, format!("invalid integer literal {literal}"), position);
                        None
                    }
                }
            }
            TokenKind::Float => {
                let literal = self.advance().literal;
                match normalize_digits(&literal).parse::<f64>() {
                    Ok(value) => Some(Expr::Float { value, position }),
                    Err(_) => {
                        self.error(SyntaxErrorKind::UnexpectedToken, format!("invalid float literal {literal}"), position);
                        None
                    }
                }
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::Boolean { value: true, position })
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::Boolean { value: false, position })
            }
            TokenKind::Illegal => {
                let literal = self.advance().literal;
                self.error(SyntaxErrorKind::IllegalCharacter, format!("illegal character {literal:?}"), position);
                None
            }
            _ => {
                let found = self.current().clone();
                self.error(SyntaxErrorKind::UnexpectedToken, format!("unexpected token {found}"), position);
                None
            }
        }
    }

    /// After `(` is consumed: either a grouped/ambiguous expression list,
    /// resolved per §4.2's paren/call ambiguity rule once we see (or
    /// don't see) a trailing `IDENT`.
    fn parse_paren_tail(&mut self, position: Position) -> Option<Expr> {
        let elements = self.parse_expr_list(TokenKind::RParen)?;
        self.expect(TokenKind::RParen, SyntaxErrorKind::MissingRParen, "missing )")?;

        if self.check(TokenKind::Ident) {
            let name = self.advance().literal;
            Some(Expr::Call { name, args: elements, position })
        } else if elements.len() == 1 {
            Some(elements.into_iter().next().unwrap())
        } else {
            let pos = self.current().position;
            self.error(
                SyntaxErrorKind::MissingFunctionName,
                "expected a function name after the argument list",
                pos,
            );
            None
        }
    }

    /// After an `IDENT` is consumed in `primary`: a prefix call, a
    /// chained index expression, or a bare identifier.
    fn parse_ident_tail(&mut self, name: String, position: Position) -> Option<Expr> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let args = self.parse_expr_list(TokenKind::RParen)?;
            self.expect(TokenKind::RParen, SyntaxErrorKind::MissingRParen, "missing )")?;
            Some(Expr::Call { name, args, position })
        } else if self.check(TokenKind::LSquareBrace) {
            let mut indices: ExprList = smallvec![];
            while self.check(TokenKind::LSquareBrace) {
                self.advance();
                indices.push(self.parse_expr()?);
                self.expect(TokenKind::RSquareBrace, SyntaxErrorKind::MissingRSquareBrace, "missing ]")?;
            }
            Some(Expr::Index { ident: name, indices, position })
        } else {
            Some(Expr::Ident { name, position })
        }
    }

    fn parse_array_lit(&mut self, position: Position) -> Option<Expr> {
        self.advance(); // '{'
        let elements = self.parse_expr_list(TokenKind::RBrace)?;
        self.expect(TokenKind::RBrace, SyntaxErrorKind::MissingRBrace, "missing }")?;
        Some(Expr::Array { elements: elements.into_vec(), position })
    }

    fn parse_string_lit(&mut self, position: Position) -> Option<Expr> {
        self.advance(); // opening quote
        let value = self
            .expect(TokenKind::StringBody, SyntaxErrorKind::UnexpectedToken, "expected string body")?
            .literal;
        self.expect(TokenKind::DoubleQuotes, SyntaxErrorKind::MissingDoubleQuotes, "missing closing quote")?;
        Some(Expr::Str { value, position })
    }

    /// A comma-separated expression list, stopping before `terminator`
    /// without consuming it. Shared by call argument lists, array
    /// literals, and the parenthesised paren/call-ambiguity list.
    fn parse_expr_list(&mut self, terminator: TokenKind) -> Option<ExprList> {
        let mut elements: ExprList = smallvec![];
        if self.check(terminator) {
            return Some(elements);
        }
        loop {
            elements.push(self.parse_expr()?);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Some(elements)
    }
}

fn normalize_digits(literal: &str) -> String {
    literal
        .chars()
        .map(|c| {
            if ('\u{FF10}'..='\u{FF19}').contains(&c) {
                char::from_u32(c as u32 - '\u{FF10}' as u32 + '0' as u32).unwrap()
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> (Program, Vec<SyntaxError>) {
        Parser::new(Lexer::new(source).tokenize()).parse_program()
    }

    fn parse_one_expr(source: &str) -> Expr {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        match program.nodes.into_iter().next().unwrap() {
            Stmt::Expr(expr) => expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn comparison_canonicalisation_matches_its_mirror() {
        assert_eq!(parse_one_expr("a < b"), parse_one_expr("b > a"));
        assert_eq!(parse_one_expr("a <= b"), parse_one_expr("b >= a"));
    }

    #[test]
    fn precedence_climbs_correctly() {
        let expr = parse_one_expr("1 + 2 * 3");
        match expr {
            Expr::Infix { op: OperatorKind::Add, right, .. } => {
                assert!(matches!(*right, Expr::Infix { op: OperatorKind::Mul, .. }));
            }
            other => panic!("expected a top-level Add, got {other:?}"),
        }
    }

    #[test]
    fn paren_followed_by_ident_is_a_call() {
        let expr = parse_one_expr("(2,3) 足す");
        match expr {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "足す");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a call, got {other:?}"),
        }
    }

    #[test]
    fn single_parenthesised_expr_without_ident_is_a_grouping() {
        let expr = parse_one_expr("(1 + 2) * 3");
        assert!(matches!(expr, Expr::Infix { op: OperatorKind::Mul, .. }));
    }

    #[test]
    fn chained_index_expression_parses_all_brackets() {
        let expr = parse_one_expr("a[1][0]");
        match expr {
            Expr::Index { ident, indices, .. } => {
                assert_eq!(ident, "a");
                assert_eq!(indices.len(), 2);
            }
            other => panic!("expected an index expr, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_block_reports_missing_rbrace_and_awaits_continuation() {
        let (_, errors) = parse("もし 真 ならば { a = 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, SyntaxErrorKind::MissingRBrace);
        assert!(errors[0].kind.awaits_continuation());
    }

    #[test]
    fn both_function_declaration_surface_forms_parse() {
        let (program, errors) = parse("関数 abc(a,b){ a 戻す }\n関数 (x,y) dfg { x 戻す }");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(program.nodes.len(), 2);
        for node in &program.nodes {
            assert!(matches!(node, Stmt::Func { .. }));
        }
    }

    #[test]
    fn empty_array_literal_parses() {
        let expr = parse_one_expr("{}");
        assert_eq!(expr, Expr::Array { elements: vec![], position: expr.position() });
    }
}
