//! Recursive-descent parser: tokens to [`ast::Program`] (`spec.md` §4.2).
//!
//! Statement dispatch is by first token. Expression parsing is precedence
//! climbing over five fixed levels (`OR` < `AND` < equality/relational <
//! additive < multiplicative), not a general Pratt table — the grammar
//! has no user-extensible operators, so a binding-power table would be
//! generality this language doesn't need.

pub mod ast;

pub use ast::*;

use pseudoc_lex::{Token, TokenKind};
use pseudoc_util::{Handler, Interner, Span, Stage, Symbol};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    interner: &'a Interner,
    handler: &'a mut Handler,
}

type PResult<T> = Option<T>;

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, interner: &'a Interner, handler: &'a mut Handler) -> Self {
        Self { tokens, position: 0, interner, handler }
    }

    pub fn parse(mut self) -> Option<Program> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Eof) {
            if self.handler.has_error() {
                return None;
            }
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => return None,
            }
        }
        if self.handler.has_error() {
            None
        } else {
            Some(stmts)
        }
    }

    // ---- token-stream primitives ----------------------------------

    fn current(&self) -> Token {
        self.tokens.get(self.position).copied().unwrap_or_else(|| {
            self.tokens.last().copied().expect("token stream always ends in EOF")
        })
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current();
        if !self.check(TokenKind::Eof) {
            self.position += 1;
        }
        tok
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            let span = self.current().span;
            self.error(format!("expected {:?}, found {:?}", kind, self.kind()), span);
            None
        }
    }

    fn expect_identifier(&mut self) -> PResult<Symbol> {
        let tok = self.expect(TokenKind::Identifier)?;
        Some(tok.lexeme)
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.handler.error(Stage::Parse, message, span);
    }

    fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn can_start_expr(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::IntegerLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Identifier
                | TokenKind::LParen
                | TokenKind::Minus
                | TokenKind::Not
        )
    }

    // ---- statements -------------------------------------------------

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.kind() {
            TokenKind::Declare => self.parse_declare(),
            TokenKind::Constant => self.parse_constant(),
            TokenKind::Type => self.parse_type_def(),
            TokenKind::Identifier => self.parse_assignment(),
            TokenKind::Output => self.parse_output(),
            TokenKind::Input => self.parse_input(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Case => self.parse_case(),
            TokenKind::Procedure => self.parse_procedure(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Call => self.parse_call_stmt(),
            TokenKind::Return => self.parse_return(),
            TokenKind::OpenFile => self.parse_openfile(),
            TokenKind::ReadFile => self.parse_readfile(),
            TokenKind::WriteFile => self.parse_writefile(),
            TokenKind::CloseFile => self.parse_closefile(),
            _ => {
                let span = self.current().span;
                self.error(format!("unexpected token {:?}", self.kind()), span);
                None
            }
        }
    }

    fn parse_scalar_type(&mut self) -> PResult<DataType> {
        let tok = self.expect(TokenKind::Identifier)?;
        let upper = self.resolve(tok.lexeme).to_ascii_uppercase();
        Some(match upper.as_str() {
            "INTEGER" => DataType::Integer,
            "REAL" => DataType::Real,
            "STRING" => DataType::String,
            "BOOLEAN" => DataType::Boolean,
            "CHAR" => DataType::Char,
            _ => DataType::User(tok.lexeme),
        })
    }

    fn parse_array_bound(&mut self) -> PResult<i64> {
        let negative = self.match_token(TokenKind::Minus);
        let tok = self.expect(TokenKind::IntegerLiteral)?;
        let text = self.resolve(tok.lexeme);
        let n: i64 = text.parse().ok().or_else(|| {
            self.error(format!("invalid integer literal '{}'", text), tok.span);
            None
        })?;
        Some(if negative { -n } else { n })
    }

    fn parse_declare(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Declare)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        if self.match_token(TokenKind::Array) {
            self.expect(TokenKind::LBracket)?;
            let mut dims = vec![self.parse_array_dim()?];
            while self.match_token(TokenKind::Comma) {
                dims.push(self.parse_array_dim()?);
            }
            self.expect(TokenKind::RBracket)?;
            self.expect(TokenKind::Of)?;
            let data_type = self.parse_scalar_type()?;
            Some(Stmt::Declare { name, data_type, array_dims: Some(dims), span: start })
        } else {
            let data_type = self.parse_scalar_type()?;
            Some(Stmt::Declare { name, data_type, array_dims: None, span: start })
        }
    }

    fn parse_array_dim(&mut self) -> PResult<ArrayDim> {
        let start = self.parse_array_bound()?;
        self.expect(TokenKind::Colon)?;
        let end = self.parse_array_bound()?;
        Some(ArrayDim { start, end })
    }

    /// `CONSTANT` requires an immediate literal; a leading `-` negates a
    /// numeric literal directly — a dedicated branch, not a fallthrough
    /// that only fires incidentally (`spec.md` §9 flags the ambiguity in
    /// the grounding description of this rule; this implementation always
    /// takes the direct path).
    fn parse_constant(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Constant)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Eq)?;
        let value = if self.match_token(TokenKind::Minus) {
            let tok = self.current();
            match tok.kind {
                TokenKind::IntegerLiteral => {
                    self.advance();
                    let n: i64 = self.resolve(tok.lexeme).parse().unwrap_or(0);
                    Expr::IntegerLiteral(-n, tok.span)
                }
                TokenKind::RealLiteral => {
                    self.advance();
                    let n: f64 = self.resolve(tok.lexeme).parse().unwrap_or(0.0);
                    Expr::RealLiteral(-n, tok.span)
                }
                _ => {
                    self.error("expected numeric literal after '-' in CONSTANT", tok.span);
                    return None;
                }
            }
        } else {
            self.parse_literal_value()?
        };
        Some(Stmt::Constant { name, value, span: start })
    }

    fn parse_literal_value(&mut self) -> PResult<Expr> {
        let tok = self.current();
        match tok.kind {
            TokenKind::IntegerLiteral => {
                self.advance();
                Some(Expr::IntegerLiteral(self.resolve(tok.lexeme).parse().unwrap_or(0), tok.span))
            }
            TokenKind::RealLiteral => {
                self.advance();
                Some(Expr::RealLiteral(self.resolve(tok.lexeme).parse().unwrap_or(0.0), tok.span))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Some(Expr::StringLiteral(tok.lexeme, tok.span))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::BooleanLiteral(true, tok.span))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::BooleanLiteral(false, tok.span))
            }
            _ => {
                self.error("expected a literal", tok.span);
                None
            }
        }
    }

    /// `TYPE … ENDTYPE` introduces a record: `DECLARE name : type` lines.
    /// Nested `ARRAY` fields are not supported (`spec.md` §4.2).
    fn parse_type_def(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Type)?;
        let name = self.expect_identifier()?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::EndType) {
            let fspan = self.current().span;
            self.expect(TokenKind::Declare)?;
            let fname = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_scalar_type()?;
            fields.push(TypeField { name: fname, ty, span: fspan });
        }
        self.expect(TokenKind::EndType)?;
        Some(Stmt::TypeDef { name, fields, span: start })
    }

    /// Parses the optional `[indices]` or `.field` suffix shared by
    /// assignment and `INPUT` targets.
    fn parse_target_suffix(&mut self) -> PResult<(Option<Vec<Expr>>, Option<Symbol>)> {
        if self.match_token(TokenKind::LBracket) {
            let mut indices = vec![self.parse_expr()?];
            while self.match_token(TokenKind::Comma) {
                indices.push(self.parse_expr()?);
            }
            self.expect(TokenKind::RBracket)?;
            Some((Some(indices), None))
        } else if self.match_token(TokenKind::Dot) {
            let field = self.expect_identifier()?;
            Some((None, Some(field)))
        } else {
            Some((None, None))
        }
    }

    fn parse_assignment(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        let name = self.expect_identifier()?;
        let (indices, field) = self.parse_target_suffix()?;
        self.expect(TokenKind::Arrow)?;
        let expr = self.parse_expr()?;
        Some(Stmt::Assignment { name, indices, field, expr, span: start })
    }

    fn parse_output(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Output)?;
        let mut values = vec![self.parse_expr()?];
        while self.match_token(TokenKind::Comma) {
            values.push(self.parse_expr()?);
        }
        Some(Stmt::Output { values, span: start })
    }

    fn parse_input(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Input)?;
        let name = self.expect_identifier()?;
        let (indices, field) = self.parse_target_suffix()?;
        Some(Stmt::Input { name, indices, field, span: start })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let mut then_branch = Vec::new();
        while !self.check(TokenKind::Else) && !self.check(TokenKind::EndIf) {
            then_branch.push(self.parse_stmt()?);
        }
        let else_branch = if self.match_token(TokenKind::Else) {
            let mut body = Vec::new();
            while !self.check(TokenKind::EndIf) {
                body.push(self.parse_stmt()?);
            }
            Some(body)
        } else {
            None
        };
        self.expect(TokenKind::EndIf)?;
        Some(Stmt::If { cond, then_branch, else_branch, span: start })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::While)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::EndWhile) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::EndWhile)?;
        Some(Stmt::While { cond, body, span: start })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::For)?;
        let loop_var = self.expect_identifier()?;
        self.expect(TokenKind::Arrow)?;
        let begin = self.parse_expr()?;
        self.expect(TokenKind::To)?;
        let end = self.parse_expr()?;
        let step = if self.match_token(TokenKind::Step) { Some(self.parse_expr()?) } else { None };
        let mut body = Vec::new();
        while !self.check(TokenKind::Next) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::Next)?;
        if self.check(TokenKind::Identifier) && self.current().lexeme == loop_var {
            self.advance();
        }
        Some(Stmt::For { loop_var, start: begin, end, step, body, span: start })
    }

    fn parse_repeat(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Repeat)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::Until) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::Until)?;
        let cond = self.parse_expr()?;
        Some(Stmt::Repeat { body, cond, span: start })
    }

    /// `CASE` branches are terminated heuristically: before each
    /// statement in a branch body, peek to see whether the upcoming
    /// tokens look like the next branch header (`value(, value)* :`);
    /// if so, stop the current branch. Lookahead always restores
    /// `position` (`spec.md` §4.2).
    fn looks_like_branch_header(&mut self) -> bool {
        let saved = self.position;
        let matched = self.try_scan_branch_header();
        self.position = saved;
        matched
    }

    fn try_scan_branch_header(&mut self) -> bool {
        if !self.is_case_value_start() {
            return false;
        }
        self.advance();
        while self.match_token(TokenKind::Comma) {
            if !self.is_case_value_start() {
                return false;
            }
            self.advance();
        }
        self.check(TokenKind::Colon)
    }

    fn is_case_value_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::IntegerLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Identifier
        )
    }

    fn parse_case(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Case)?;
        self.expect(TokenKind::Of)?;
        let expr = self.parse_expr()?;

        let mut branches = Vec::new();
        while !self.check(TokenKind::Otherwise) && !self.check(TokenKind::EndCase) {
            let mut values = vec![self.parse_literal_value()?];
            while self.match_token(TokenKind::Comma) {
                values.push(self.parse_literal_value()?);
            }
            self.expect(TokenKind::Colon)?;
            let mut body = Vec::new();
            while !self.check(TokenKind::EndCase)
                && !self.check(TokenKind::Otherwise)
                && !self.looks_like_branch_header()
            {
                body.push(self.parse_stmt()?);
            }
            branches.push(CaseBranch { values, body });
        }

        let otherwise = if self.match_token(TokenKind::Otherwise) {
            self.match_token(TokenKind::Colon);
            let mut body = Vec::new();
            while !self.check(TokenKind::EndCase) {
                body.push(self.parse_stmt()?);
            }
            Some(body)
        } else {
            None
        };
        self.expect(TokenKind::EndCase)?;
        Some(Stmt::Case { expr, branches, otherwise, span: start })
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let span = self.current().span;
                let mode = if self.match_token(TokenKind::ByRef) {
                    ParamMode::ByRef
                } else {
                    self.match_token(TokenKind::ByVal);
                    ParamMode::ByVal
                };
                let name = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_scalar_type()?;
                params.push(Param { name, ty, mode, span });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Some(params)
    }

    fn parse_procedure(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Procedure)?;
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let mut body = Vec::new();
        while !self.check(TokenKind::EndProcedure) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::EndProcedure)?;
        Some(Stmt::Procedure { name, params, body, span: start })
    }

    fn parse_function(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Function)?;
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        self.expect(TokenKind::Returns)?;
        let returns = self.parse_scalar_type()?;
        let mut body = Vec::new();
        while !self.check(TokenKind::EndFunction) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::EndFunction)?;
        Some(Stmt::Function { name, params, returns, body, span: start })
    }

    fn parse_arg_list(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.match_token(TokenKind::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        Some(args)
    }

    fn parse_call_stmt(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Call)?;
        let name = self.expect_identifier()?;
        let args = if self.match_token(TokenKind::LParen) {
            let args = self.parse_arg_list()?;
            self.expect(TokenKind::RParen)?;
            args
        } else {
            Vec::new()
        };
        Some(Stmt::Call { name, args, span: start })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Return)?;
        let value = if self.can_start_expr() { Some(self.parse_expr()?) } else { None };
        Some(Stmt::Return { value, span: start })
    }

    fn parse_openfile(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::OpenFile)?;
        let name = self.parse_expr()?;
        self.expect(TokenKind::For)?;
        let tok = self.expect(TokenKind::Identifier)?;
        let upper = self.resolve(tok.lexeme).to_ascii_uppercase();
        let mode = match upper.as_str() {
            "READ" => FileMode::Read,
            "WRITE" => FileMode::Write,
            "APPEND" => FileMode::Append,
            other => {
                self.error(format!("expected READ, WRITE, or APPEND, found '{}'", other), tok.span);
                return None;
            }
        };
        Some(Stmt::OpenFile { name, mode, span: start })
    }

    fn parse_readfile(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::ReadFile)?;
        let name = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let target = self.expect_identifier()?;
        Some(Stmt::ReadFile { name, target, span: start })
    }

    fn parse_writefile(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::WriteFile)?;
        let name = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let data = self.parse_expr()?;
        Some(Stmt::WriteFile { name, data, span: start })
    }

    fn parse_closefile(&mut self) -> PResult<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::CloseFile)?;
        let name = self.parse_expr()?;
        Some(Stmt::CloseFile { name, span: start })
    }

    // ---- expressions --------------------------------------------------

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut left = self.parse_and()?;
        while self.match_token(TokenKind::Or) {
            let right = self.parse_and()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { left: Box::new(left), op: BinOp::Or, right: Box::new(right), span };
        }
        Some(left)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.match_token(TokenKind::And) {
            let right = self.parse_equality()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { left: Box::new(left), op: BinOp::And, right: Box::new(right), span };
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Ampersand => BinOp::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Div => BinOp::IntDiv,
                TokenKind::Mod => BinOp::IntMod,
                TokenKind::Caret => BinOp::Pow,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.current().span;
        if self.match_token(TokenKind::Minus) {
            let expr = self.parse_unary()?;
            let span = start.to(expr.span());
            return Some(Expr::Unary { op: UnOp::Negate, expr: Box::new(expr), span });
        }
        if self.match_token(TokenKind::Not) {
            let expr = self.parse_unary()?;
            let span = start.to(expr.span());
            return Some(Expr::Unary { op: UnOp::Not, expr: Box::new(expr), span });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let tok = self.current();
        match tok.kind {
            TokenKind::IntegerLiteral => {
                self.advance();
                Some(Expr::IntegerLiteral(self.resolve(tok.lexeme).parse().unwrap_or(0), tok.span))
            }
            TokenKind::RealLiteral => {
                self.advance();
                Some(Expr::RealLiteral(self.resolve(tok.lexeme).parse().unwrap_or(0.0), tok.span))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Some(Expr::StringLiteral(tok.lexeme, tok.span))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::BooleanLiteral(true, tok.span))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::BooleanLiteral(false, tok.span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Some(expr)
            }
            TokenKind::Identifier => self.parse_identifier_suffixed(),
            _ => {
                self.error(format!("expected expression, found {:?}", tok.kind), tok.span);
                None
            }
        }
    }

    fn parse_identifier_suffixed(&mut self) -> PResult<Expr> {
        let tok = self.advance();
        let name = tok.lexeme;
        if self.match_token(TokenKind::LParen) {
            let args = self.parse_arg_list()?;
            let end = self.expect(TokenKind::RParen)?;
            Some(Expr::Call { name, args, span: tok.span.to(end.span) })
        } else if self.match_token(TokenKind::LBracket) {
            let mut indices = vec![self.parse_expr()?];
            while self.match_token(TokenKind::Comma) {
                indices.push(self.parse_expr()?);
            }
            let end = self.expect(TokenKind::RBracket)?;
            Some(Expr::ArrayAccess { name, indices, span: tok.span.to(end.span) })
        } else if self.match_token(TokenKind::Dot) {
            let field = self.expect_identifier()?;
            let span = tok.span;
            Some(Expr::FieldAccess { object: Box::new(Expr::Identifier(name, span)), field, span })
        } else {
            Some(Expr::Identifier(name, tok.span))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pseudoc_lex::Lexer;
    use pseudoc_util::{Handler, Interner};

    fn parse(src: &str) -> (Option<Program>, Handler) {
        let mut interner = Interner::new();
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, &mut interner, &mut handler).tokenize();
        assert!(!handler.has_error(), "lex error: {:?}", handler.error_ref());
        let program = Parser::new(tokens, &interner, &mut handler).parse();
        (program, handler)
    }

    #[test]
    fn parses_declare_and_assignment_and_output() {
        let (program, handler) = parse("DECLARE X : INTEGER\nX <- 2 + 3 * 4\nOUTPUT X");
        assert!(!handler.has_error());
        let program = program.unwrap();
        assert_eq!(program.len(), 3);
        assert!(matches!(program[0], Stmt::Declare { .. }));
        assert!(matches!(program[1], Stmt::Assignment { .. }));
        assert!(matches!(program[2], Stmt::Output { .. }));
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let (program, _) = parse("X <- 2 + 3 * 4");
        let Stmt::Assignment { expr, .. } = &program.unwrap()[0] else { panic!() };
        let Expr::Binary { op: BinOp::Add, right, .. } = expr else { panic!("expected top-level Add") };
        assert!(matches!(right.as_ref(), Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn constant_with_leading_minus_negates_literal() {
        let (program, _) = parse("CONSTANT Limit = -5");
        let Stmt::Constant { value, .. } = &program.unwrap()[0] else { panic!() };
        assert!(matches!(value, Expr::IntegerLiteral(-5, _)));
    }

    #[test]
    fn for_loop_parses_optional_step_and_trailing_var() {
        let (program, handler) = parse("FOR I <- 5 TO 1 STEP -1\nOUTPUT I\nNEXT I");
        assert!(!handler.has_error());
        assert!(matches!(program.unwrap()[0], Stmt::For { .. }));
    }

    #[test]
    fn case_multi_value_branch_stops_at_next_header() {
        let src = "CASE OF D\n6, 7: OUTPUT \"Weekend\"\nOTHERWISE: OUTPUT \"Other\"\nENDCASE";
        let (program, handler) = parse(src);
        assert!(!handler.has_error());
        let Stmt::Case { branches, otherwise, .. } = &program.unwrap()[0] else { panic!() };
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].values.len(), 2);
        assert!(otherwise.is_some());
    }

    #[test]
    fn array_declare_with_two_dimensions() {
        let (program, handler) = parse("DECLARE Grid : ARRAY[1:3, 1:3] OF INTEGER");
        assert!(!handler.has_error());
        let Stmt::Declare { array_dims, .. } = &program.unwrap()[0] else { panic!() };
        assert_eq!(array_dims.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn procedure_with_byref_param() {
        let src = "PROCEDURE Swap(BYREF A : INTEGER, BYREF B : INTEGER)\nENDPROCEDURE";
        let (program, handler) = parse(src);
        assert!(!handler.has_error());
        let Stmt::Procedure { params, .. } = &program.unwrap()[0] else { panic!() };
        assert!(params.iter().all(|p| p.mode == ParamMode::ByRef));
    }

    #[test]
    fn unknown_token_reports_parse_error() {
        let (program, handler) = parse("DECLARE 123 : INTEGER");
        assert!(handler.has_error());
        assert!(program.is_none());
    }
}
