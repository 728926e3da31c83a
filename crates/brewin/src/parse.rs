use std::{fmt, rc::Rc};

use smallvec::SmallVec;

use crate::expressions::{
    BinaryOp, CallExpr, Catcher, Expr, ExprRef, FieldDef, FuncDef, Param, Program, Stmt, StructDef, TypeName, UnaryOp,
    VarPath,
};

/// Maximum nesting depth for expressions during parsing.
///
/// Prevents stack overflow from pathological inputs like `((((…x…))))` or
/// `----…-x` before the recursive-descent parser blows the stack.
const MAX_NESTING_DEPTH: u16 = 200;

/// A syntax error with its source position (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at line {}, column {}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses Brewin source into a [`Program`].
///
/// The grammar is dialect-agnostic: type annotations, structs, `try` and the
/// rest of the surface syntax always parse, and the evaluator decides per
/// dialect what is actually permitted.
pub(crate) fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = lex(source)?;
    Parser::new(tokens).program()
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(Rc<str>),
    Int(i64),
    Str(Rc<str>),
    True,
    False,
    Nil,
    Func,
    Struct,
    Var,
    If,
    Else,
    For,
    Return,
    Try,
    Catch,
    Raise,
    New,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Colon,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    Assign,
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Int(value) => format!("integer literal `{value}`"),
            Self::Str(_) => "string literal".to_owned(),
            Self::True => "`true`".to_owned(),
            Self::False => "`false`".to_owned(),
            Self::Nil => "`nil`".to_owned(),
            Self::Func => "`func`".to_owned(),
            Self::Struct => "`struct`".to_owned(),
            Self::Var => "`var`".to_owned(),
            Self::If => "`if`".to_owned(),
            Self::Else => "`else`".to_owned(),
            Self::For => "`for`".to_owned(),
            Self::Return => "`return`".to_owned(),
            Self::Try => "`try`".to_owned(),
            Self::Catch => "`catch`".to_owned(),
            Self::Raise => "`raise`".to_owned(),
            Self::New => "`new`".to_owned(),
            Self::LBrace => "`{`".to_owned(),
            Self::RBrace => "`}`".to_owned(),
            Self::LParen => "`(`".to_owned(),
            Self::RParen => "`)`".to_owned(),
            Self::Semi => "`;`".to_owned(),
            Self::Colon => "`:`".to_owned(),
            Self::Comma => "`,`".to_owned(),
            Self::Dot => "`.`".to_owned(),
            Self::Plus => "`+`".to_owned(),
            Self::Minus => "`-`".to_owned(),
            Self::Star => "`*`".to_owned(),
            Self::Slash => "`/`".to_owned(),
            Self::EqEq => "`==`".to_owned(),
            Self::NotEq => "`!=`".to_owned(),
            Self::Lt => "`<`".to_owned(),
            Self::LtEq => "`<=`".to_owned(),
            Self::Gt => "`>`".to_owned(),
            Self::GtEq => "`>=`".to_owned(),
            Self::AndAnd => "`&&`".to_owned(),
            Self::OrOr => "`||`".to_owned(),
            Self::Bang => "`!`".to_owned(),
            Self::Assign => "`=`".to_owned(),
            Self::Eof => "end of input".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: u32,
    column: u32,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    }
    .run()
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
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

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            Some('*') if self.peek2() == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => {
                                return Err(ParseError {
                                    message: "unterminated block comment".to_owned(),
                                    line,
                                    column,
                                });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    tok: Tok::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };
            let tok = if c.is_ascii_alphabetic() || c == '_' {
                self.word()
            } else if c.is_ascii_digit() {
                self.integer()?
            } else if c == '"' {
                self.string()?
            } else {
                self.operator()?
            };
            tokens.push(Token { tok, line, column });
        }
    }

    fn word(&mut self) -> Tok {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match word.as_str() {
            "true" => Tok::True,
            "false" => Tok::False,
            "nil" => Tok::Nil,
            "func" => Tok::Func,
            "struct" => Tok::Struct,
            "var" => Tok::Var,
            "if" => Tok::If,
            "else" => Tok::Else,
            "for" => Tok::For,
            "return" => Tok::Return,
            "try" => Tok::Try,
            "catch" => Tok::Catch,
            "raise" => Tok::Raise,
            "new" => Tok::New,
            _ => Tok::Ident(Rc::from(word)),
        }
    }

    fn integer(&mut self) -> Result<Tok, ParseError> {
        let start = self.error("");
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        digits.parse::<i64>().map(Tok::Int).map_err(|_| ParseError {
            message: format!("integer literal `{digits}` out of range"),
            ..start
        })
    }

    fn string(&mut self) -> Result<Tok, ParseError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    return Ok(Tok::Str(Rc::from(text)));
                }
                Some('\n') | None => {
                    return Err(ParseError {
                        message: "unterminated string literal".to_owned(),
                        line,
                        column,
                    });
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn operator(&mut self) -> Result<Tok, ParseError> {
        let c = self.bump().expect("caller checked a character is present");
        let two = |lexer: &mut Self, next: char, yes: Tok, no: Tok| {
            if lexer.peek() == Some(next) {
                lexer.bump();
                yes
            } else {
                no
            }
        };
        Ok(match c {
            '{' => Tok::LBrace,
            '}' => Tok::RBrace,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ';' => Tok::Semi,
            ':' => Tok::Colon,
            ',' => Tok::Comma,
            '.' => Tok::Dot,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '=' => two(self, '=', Tok::EqEq, Tok::Assign),
            '!' => two(self, '=', Tok::NotEq, Tok::Bang),
            '<' => two(self, '=', Tok::LtEq, Tok::Lt),
            '>' => two(self, '=', Tok::GtEq, Tok::Gt),
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    Tok::AndAnd
                } else {
                    return Err(self.error("expected `&&`"));
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    Tok::OrOr
                } else {
                    return Err(self.error("expected `||`"));
                }
            }
            other => return Err(self.error(format!("unexpected character `{other}`"))),
        })
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u16,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn peek2(&self) -> &Tok {
        let next = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[next].tok
    }

    fn advance(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<(), ParseError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {}, found {}", tok.describe(), self.peek().describe())))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = &self.tokens[self.pos];
        ParseError {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }

    fn ident(&mut self, what: &str) -> Result<Rc<str>, ParseError> {
        if let Tok::Ident(name) = self.peek() {
            let name = Rc::clone(name);
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(format!("expected {what}, found {}", self.peek().describe())))
        }
    }

    fn program(&mut self) -> Result<Program, ParseError> {
        let mut structs = Vec::new();
        let mut functions = Vec::new();
        loop {
            match self.peek() {
                Tok::Struct => structs.push(self.struct_def()?),
                Tok::Func => functions.push(Rc::new(self.func_def()?)),
                Tok::Eof => break,
                other => {
                    return Err(self.error_here(format!("expected `struct` or `func`, found {}", other.describe())));
                }
            }
        }
        Ok(Program { structs, functions })
    }

    fn struct_def(&mut self) -> Result<StructDef, ParseError> {
        self.expect(&Tok::Struct)?;
        let name = self.ident("struct name")?;
        self.expect(&Tok::LBrace)?;
        let mut fields = Vec::new();
        while !self.eat(&Tok::RBrace) {
            let field_name = self.ident("field name")?;
            self.expect(&Tok::Colon)?;
            let declared_type = self.type_name()?;
            self.expect(&Tok::Semi)?;
            fields.push(FieldDef {
                name: field_name,
                declared_type,
            });
        }
        Ok(StructDef { name, fields })
    }

    fn func_def(&mut self) -> Result<FuncDef, ParseError> {
        self.expect(&Tok::Func)?;
        let name = self.ident("function name")?;
        self.expect(&Tok::LParen)?;
        let mut params = Vec::new();
        if !self.eat(&Tok::RParen) {
            loop {
                let param_name = self.ident("parameter name")?;
                let declared_type = if self.eat(&Tok::Colon) {
                    Some(self.type_name()?)
                } else {
                    None
                };
                params.push(Param {
                    name: param_name,
                    declared_type,
                });
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(&Tok::RParen)?;
        }
        let return_type = if self.eat(&Tok::Colon) {
            Some(self.type_name()?)
        } else {
            None
        };
        let body = self.block()?;
        Ok(FuncDef {
            name,
            params,
            return_type,
            body,
        })
    }

    fn type_name(&mut self) -> Result<TypeName, ParseError> {
        let name = self.ident("type name")?;
        Ok(match &*name {
            "int" => TypeName::Int,
            "bool" => TypeName::Bool,
            "string" => TypeName::String,
            "void" => TypeName::Void,
            _ => TypeName::Struct(name),
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&Tok::LBrace)?;
        let mut statements = Vec::new();
        while !self.eat(&Tok::RBrace) {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Tok::Var => {
                self.advance();
                let name = self.ident("variable name")?;
                let declared_type = if self.eat(&Tok::Colon) {
                    Some(self.type_name()?)
                } else {
                    None
                };
                self.expect(&Tok::Semi)?;
                Ok(Stmt::VarDef { name, declared_type })
            }
            Tok::If => {
                self.advance();
                self.expect(&Tok::LParen)?;
                let condition = self.expression()?;
                self.expect(&Tok::RParen)?;
                let then_body = self.block()?;
                let else_body = if self.eat(&Tok::Else) { self.block()? } else { Vec::new() };
                Ok(Stmt::If {
                    condition,
                    then_body,
                    else_body,
                })
            }
            Tok::For => {
                self.advance();
                self.expect(&Tok::LParen)?;
                let init = Box::new(self.simple_statement()?);
                self.expect(&Tok::Semi)?;
                let condition = self.expression()?;
                self.expect(&Tok::Semi)?;
                let update = Box::new(self.simple_statement()?);
                self.expect(&Tok::RParen)?;
                let body = self.block()?;
                Ok(Stmt::For {
                    init,
                    condition,
                    update,
                    body,
                })
            }
            Tok::Return => {
                self.advance();
                let expr = if self.peek() == &Tok::Semi {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&Tok::Semi)?;
                Ok(Stmt::Return { expr })
            }
            Tok::Try => {
                self.advance();
                let body = self.block()?;
                let mut catchers = Vec::new();
                while self.eat(&Tok::Catch) {
                    let Tok::Str(tag) = self.peek().clone() else {
                        return Err(self.error_here(format!(
                            "expected string literal after `catch`, found {}",
                            self.peek().describe()
                        )));
                    };
                    self.advance();
                    let handler = self.block()?;
                    catchers.push(Catcher { tag, body: handler });
                }
                Ok(Stmt::Try { body, catchers })
            }
            Tok::Raise => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&Tok::Semi)?;
                Ok(Stmt::Raise { expr })
            }
            Tok::Ident(_) => {
                let stmt = self.simple_statement()?;
                self.expect(&Tok::Semi)?;
                Ok(stmt)
            }
            other => Err(self.error_here(format!("expected statement, found {}", other.describe()))),
        }
    }

    /// An assignment or call without its trailing `;`, as used by statement
    /// position and the `for` header.
    fn simple_statement(&mut self) -> Result<Stmt, ParseError> {
        if let (Tok::Ident(_), Tok::LParen) = (self.peek(), self.peek2()) {
            let name = self.ident("function name")?;
            let args = self.call_args()?;
            return Ok(Stmt::Call(CallExpr { name, args }));
        }
        let target = self.var_path()?;
        self.expect(&Tok::Assign)?;
        let expr = self.expression()?;
        Ok(Stmt::Assign { target, expr })
    }

    fn var_path(&mut self) -> Result<VarPath, ParseError> {
        let mut segments: SmallVec<[Rc<str>; 2]> = SmallVec::new();
        segments.push(self.ident("variable name")?);
        while self.eat(&Tok::Dot) {
            segments.push(self.ident("field name")?);
        }
        Ok(VarPath { segments })
    }

    fn call_args(&mut self) -> Result<Vec<ExprRef>, ParseError> {
        self.expect(&Tok::LParen)?;
        let mut args = Vec::new();
        if self.eat(&Tok::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        self.expect(&Tok::RParen)?;
        Ok(args)
    }

    fn expression(&mut self) -> Result<ExprRef, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here("expression nesting too deep"));
        }
        self.depth += 1;
        let result = self.or_expr();
        self.depth -= 1;
        result
    }

    fn or_expr(&mut self) -> Result<ExprRef, ParseError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.and_expr()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<ExprRef, ParseError> {
        let mut lhs = self.equality_expr()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.equality_expr()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<ExprRef, ParseError> {
        let mut lhs = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Tok::EqEq => BinaryOp::Eq,
                Tok::NotEq => BinaryOp::NotEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.relational_expr()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn relational_expr(&mut self) -> Result<ExprRef, ParseError> {
        let mut lhs = self.additive_expr()?;
        loop {
            let op = match self.peek() {
                Tok::Lt => BinaryOp::Less,
                Tok::LtEq => BinaryOp::LessEq,
                Tok::Gt => BinaryOp::Greater,
                Tok::GtEq => BinaryOp::GreaterEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.additive_expr()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn additive_expr(&mut self) -> Result<ExprRef, ParseError> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinaryOp::Add,
                Tok::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative_expr()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative_expr(&mut self) -> Result<ExprRef, ParseError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Tok::Star => BinaryOp::Mul,
                Tok::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary_expr()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary_expr(&mut self) -> Result<ExprRef, ParseError> {
        let op = match self.peek() {
            Tok::Minus => UnaryOp::Neg,
            Tok::Bang => UnaryOp::Not,
            _ => return self.primary_expr(),
        };
        self.advance();
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here("expression nesting too deep"));
        }
        self.depth += 1;
        let operand = self.unary_expr();
        self.depth -= 1;
        Ok(Rc::new(Expr::Unary { op, operand: operand? }))
    }

    fn primary_expr(&mut self) -> Result<ExprRef, ParseError> {
        match self.peek().clone() {
            Tok::Int(value) => {
                self.advance();
                Ok(Rc::new(Expr::IntLiteral(value)))
            }
            Tok::Str(text) => {
                self.advance();
                Ok(Rc::new(Expr::StringLiteral(text)))
            }
            Tok::True => {
                self.advance();
                Ok(Rc::new(Expr::BoolLiteral(true)))
            }
            Tok::False => {
                self.advance();
                Ok(Rc::new(Expr::BoolLiteral(false)))
            }
            Tok::Nil => {
                self.advance();
                Ok(Rc::new(Expr::NilLiteral))
            }
            Tok::New => {
                self.advance();
                let struct_name = self.ident("struct name")?;
                Ok(Rc::new(Expr::New { struct_name }))
            }
            Tok::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            Tok::Ident(name) => {
                if self.peek2() == &Tok::LParen {
                    self.advance();
                    let args = self.call_args()?;
                    Ok(Rc::new(Expr::Call(CallExpr { name, args })))
                } else {
                    let path = self.var_path()?;
                    Ok(Rc::new(Expr::Var(path)))
                }
            }
            other => Err(self.error_here(format!("expected expression, found {}", other.describe()))),
        }
    }
}

fn binary(op: BinaryOp, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
    Rc::new(Expr::Binary { op, lhs, rhs })
}
