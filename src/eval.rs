use anyhow::{Result, Context, bail, ensure};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::env::Env;
use crate::parse::{self, Ast, BinOp};
use crate::rewrite::rewrite_percentages;

// The only names an expression may call. Everything else is rejected.
pub const MATH_FUNCTIONS: [&str; 12] = ["sqrt", "sin", "cos", "tan", "log", "log10", "exp", "pow", "abs", "ceil", "floor", "round"];

// Word boundary stops substitution inside number-adjacent text such as `2x` or `1e5`
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u:\b)[A-Za-z_][A-Za-z0-9_]*").unwrap());

// Replace each identifier bound in the environment with the text of its value
pub fn substitute_variables(expr: &str, env: &Env) -> String {
    IDENTIFIER.replace_all(expr, |caps: &Captures| {
        let name = &caps[0];
        match env.get(name) {
            Some(value) => value.to_string(),
            None => name.to_string()
        }
    }).into_owned()
}

fn finite(x: f64, what: &str) -> Result<f64> {
    ensure!(x.is_finite(), "{} produced a non-finite result", what);
    Ok(x)
}

fn call(name: &str, args: &[f64]) -> Result<f64> {
    let unary = |f: fn(f64) -> f64| -> Result<f64> {
        match args {
            [x] => Ok(f(*x)),
            _ => bail!("{} takes 1 argument, got {}", name, args.len())
        }
    };
    let result = match name {
        "sqrt" => unary(f64::sqrt)?,
        "sin" => unary(f64::sin)?,
        "cos" => unary(f64::cos)?,
        "tan" => unary(f64::tan)?,
        "log" => unary(f64::ln)?,
        "log10" => unary(f64::log10)?,
        "exp" => unary(f64::exp)?,
        "abs" => unary(f64::abs)?,
        "ceil" => unary(f64::ceil)?,
        "floor" => unary(f64::floor)?,
        // halves round toward positive infinity
        "round" => unary(|x| {
            let r = x.floor();
            if x - r >= 0.5 { r + 1.0 } else { r }
        })?,
        "pow" => match args {
            [a, b] => a.powf(*b),
            _ => bail!("pow takes 2 arguments, got {}", args.len())
        },
        _ => bail!("unknown function {}", name)
    };
    finite(result, name)
}

pub fn eval(ast: &Ast) -> Result<f64> {
    match ast {
        Ast::Num(x) => finite(*x, "literal"),
        Ast::Neg(a) => Ok(-eval(a)?),
        Ast::Op(op, a, b) => {
            let (a, b) = (eval(a)?, eval(b)?);
            let result = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b
            };
            finite(result, "arithmetic")
        },
        Ast::Call(name, args) => {
            let name: &str = name;
            ensure!(MATH_FUNCTIONS.contains(&name), "{} is not an allowed function", name);
            let args = args.iter().map(eval).collect::<Result<Vec<_>>>()?;
            call(name, &args)
        },
        Ast::Identifier(name) => bail!("unknown identifier {}", name)
    }
}

// Full evaluation of one expression: percentage rewrites, variable substitution, then the
// arithmetic grammar.
pub fn evaluate(expr: &str, env: &Env) -> Result<f64> {
    let rewritten = rewrite_percentages(expr);
    let substituted = substitute_variables(&rewritten, env);
    log::trace!("evaluating {:?} as {:?}", expr, substituted);
    let tokens = parse::lex(&substituted).context("lexing expression")?;
    let ast = parse::parse(tokens).context("parsing expression")?;
    eval(&ast).with_context(|| format!("evaluating {}", substituted))
}
