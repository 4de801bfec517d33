use std::str::FromStr;
use anyhow::{Result, anyhow, Context};
use std::fmt;
use inlinable_string::{InlinableString, StringExt};

use crate::util::char_to_string;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinOp { Add, Sub, Mul, Div }

impl BinOp {
    // static table of precedence for each operator; all are left-associative
    pub fn precedence(self) -> usize {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token { Number(InlinableString), OpenBracket, CloseBracket, Op(BinOp), Comma, Identifier(InlinableString), EOF }

#[derive(Debug)]
enum LexState {
    Number(InlinableString),
    Identifier(InlinableString),
    None
}

impl LexState {
    // commit whatever is being accumulated
    fn flush(self, toks: &mut Vec<Token>) {
        match self {
            LexState::Number(s) => toks.push(Token::Number(s)),
            LexState::Identifier(s) => toks.push(Token::Identifier(s)),
            LexState::None => ()
        }
    }
}

// lexer
// Anything outside digits, ASCII identifiers, + - * / ( ) , and whitespace is rejected here,
// so nothing else can ever reach the parser.
pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut toks = vec![];
    let mut state = LexState::None;
    for (index, char) in input.chars().enumerate() {
        state = match (char, state) {
            ('0'..='9' | '.', LexState::None) => LexState::Number(char_to_string(char)),
            ('0'..='9' | '.', LexState::Number(mut n)) => {
                n.push(char);
                LexState::Number(n)
            },
            // digits may continue an identifier (log10)
            ('0'..='9' | 'a'..='z' | 'A'..='Z' | '_', LexState::Identifier(mut s)) => {
                s.push(char);
                LexState::Identifier(s)
            },
            ('a'..='z' | 'A'..='Z' | '_', state) => {
                state.flush(&mut toks);
                LexState::Identifier(char_to_string(char))
            },
            ('+' | '-' | '*' | '/' | '(' | ')' | ',', state) => {
                state.flush(&mut toks);
                toks.push(match char {
                    '(' => Token::OpenBracket, ')' => Token::CloseBracket,
                    ',' => Token::Comma,
                    '+' => Token::Op(BinOp::Add), '-' => Token::Op(BinOp::Sub),
                    '*' => Token::Op(BinOp::Mul), _ => Token::Op(BinOp::Div)
                });
                LexState::None
            },
            (c, state) if c.is_whitespace() => {
                state.flush(&mut toks);
                LexState::None
            },
            (char, state) => return Err(anyhow!("unexpected {:?} in state {:?} (char {})", char, state, index))
        }
    }
    state.flush(&mut toks);
    toks.push(Token::EOF);
    Ok(toks)
}

#[derive(Debug)]
pub enum ParseError {
    Invalid(Token),
    BadNumber(InlinableString),
    TooDeep
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Invalid(tok) => write!(f, "invalid token {:?}", tok),
            ParseError::BadNumber(n) => write!(f, "malformed number {}", n),
            ParseError::TooDeep => write!(f, "expression nested too deeply")
        }
    }
}
impl std::error::Error for ParseError {}

// Bounds recursion so pathological input is an error rather than a stack overflow
const MAX_DEPTH: usize = 500;

// parser: contains the sequence of tokens being parsed and current position (index in that)
// one token of lookahead is used to tell calls from bare identifiers
struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize
}

impl Parser {
    // Get current token
    fn current(&self) -> Token { self.tokens[self.position].clone() }
    // Advance current token
    fn advance(&mut self) { self.position += 1 }

    // Match current token against predicate and propagate error if it is not matched
    fn expect<T, F: Fn(&Token) -> Result<T, ()>>(&mut self, pred: F) -> Result<T, ParseError> {
        let current = self.current();
        match pred(&current) {
            Ok(r) => {
                self.advance();
                Ok(r)
            },
            Err(()) => Err(ParseError::Invalid(current))
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH { Err(ParseError::TooDeep) } else { Ok(()) }
    }

    // Parse "leaf" expression: number, signed leaf, bracketed expression, identifier, or call (fn(arg1, arg2))
    fn parse_leaf(&mut self) -> Result<Ast, ParseError> {
        self.descend()?;
        let res = match self.current() {
            Token::OpenBracket => {
                self.advance();
                let res = self.parse_expr(0)?;
                self.expect(|t| if *t == Token::CloseBracket { Ok(()) } else { Err(()) })?;
                res
            },
            Token::Op(BinOp::Sub) => {
                self.advance();
                Ast::Neg(Box::new(self.parse_leaf()?))
            },
            Token::Op(BinOp::Add) => {
                self.advance();
                self.parse_leaf()?
            },
            Token::Number(n) => {
                let x = f64::from_str(&n).map_err(|_| ParseError::BadNumber(n.clone()))?;
                self.advance();
                Ast::Num(x)
            },
            Token::Identifier(s) => {
                self.advance();
                if let Token::OpenBracket = self.current() {
                    self.advance();
                    let mut args = vec![];
                    if self.current() == Token::CloseBracket {
                        self.advance();
                    } else {
                        loop {
                            args.push(self.parse_expr(0)?);
                            match self.expect(|t| if *t == Token::CloseBracket || *t == Token::Comma { Ok(t.clone()) } else { Err(()) })? {
                                Token::CloseBracket => break,
                                _ => ()
                            }
                        }
                    }
                    Ast::Call(s, args)
                } else {
                    Ast::Identifier(s)
                }
            }
            t => return Err(ParseError::Invalid(t))
        };
        self.depth -= 1;
        Ok(res)
    }

    // Parse expression including operators, using precedence climbing
    fn parse_expr(&mut self, prec: usize) -> Result<Ast, ParseError> {
        self.descend()?;
        let mut result = self.parse_leaf()?;
        // every operator absorbed here nests `result` one level deeper
        let mut absorbed = 0;
        loop {
            match self.current() {
                Token::Op(op) if op.precedence() >= prec => {
                    self.descend()?;
                    absorbed += 1;
                    self.advance();
                    let next = self.parse_expr(op.precedence() + 1)?;
                    result = Ast::Op(op, Box::new(result), Box::new(next))
                },
                // Break out of loop if operator's precedence is lower, or nonoperator thing encountered
                // This means that a lower-precedence operator will become part of the tree enclosing the current one
                _ => break
            };
        };
        self.depth -= 1 + absorbed;
        Ok(result)
    }
}

pub fn parse(t: Vec<Token>) -> Result<Ast> {
    let mut parser = Parser {
        tokens: t,
        position: 0,
        depth: 0
    };
    // Provide slightly more helpful error message indicating the token which isn't valid
    let result = parser.parse_expr(0).with_context(|| format!("at token {}", parser.position))?;
    if parser.current() != Token::EOF { return Err(anyhow!("Expected EOF at end of token sequence")) }
    Ok(result)
}

#[derive(Debug, PartialEq)]
pub enum Ast {
    Num(f64),
    Identifier(InlinableString),
    Neg(Box<Ast>),
    Op(BinOp, Box<Ast>, Box<Ast>),
    Call(InlinableString, Vec<Ast>)
}
