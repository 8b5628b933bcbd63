//! Expression language for path movement: `y = f(x)`

use flare_core::{FlareError, Result};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::f32::consts::{E, PI};

#[derive(Parser)]
#[grammar = "behaviors/path_expr.pest"]
struct PathExprParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Pow,
    Log,
    Min,
    Max,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "atan2" => Func::Atan2,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "sqrt" => Func::Sqrt,
            "pow" => Func::Pow,
            "log" => Func::Log,
            "min" => Func::Min,
            "max" => Func::Max,
            _ => return None,
        })
    }

    /// Accepted argument counts, inclusive.
    fn arity(self) -> (usize, usize) {
        match self {
            Func::Atan2 | Func::Pow => (2, 2),
            Func::Min | Func::Max => (1, usize::MAX),
            _ => (1, 1),
        }
    }

    fn apply(self, args: &[f32]) -> f32 {
        let a = args[0];
        match self {
            Func::Sin => a.sin(),
            Func::Cos => a.cos(),
            Func::Tan => a.tan(),
            Func::Asin => a.asin(),
            Func::Acos => a.acos(),
            Func::Atan => a.atan(),
            Func::Atan2 => a.atan2(args[1]),
            Func::Abs => a.abs(),
            Func::Floor => a.floor(),
            Func::Ceil => a.ceil(),
            // halves round towards positive infinity
            Func::Round => (a + 0.5).floor(),
            Func::Sqrt => a.sqrt(),
            Func::Pow => a.powf(args[1]),
            Func::Log => a.ln(),
            Func::Min => args.iter().copied().fold(f32::INFINITY, f32::min),
            Func::Max => args.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f32),
    X,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    fn eval(&self, x: f32) -> f32 {
        match self {
            Expr::Number(n) => *n,
            Expr::X => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Binary(op, a, b) => {
                let (a, b) = (a.eval(x), b.eval(x));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Rem => a % b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, args) => {
                let values: Vec<f32> = args.iter().map(|a| a.eval(x)).collect();
                func.apply(&values)
            }
        }
    }
}

/// A parsed path function, evaluated once per particle per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    source: String,
    root: Expr,
}

impl PathExpression {
    pub fn parse(source: &str) -> Result<Self> {
        let mut pairs = PathExprParser::parse(Rule::expression, source)
            .map_err(|e| FlareError::PathExpression(e.to_string()))?;
        let sum = pairs
            .next()
            .and_then(|expression| expression.into_inner().next())
            .ok_or_else(|| FlareError::PathExpression(format!("empty expression: {source}")))?;
        Ok(Self {
            source: source.to_string(),
            root: build(sum)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, x: f32) -> f32 {
        self.root.eval(x)
    }
}

fn build(pair: Pair<'_, Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::sum | Rule::product => {
            let mut inner = pair.into_inner();
            let mut lhs = match inner.next() {
                Some(first) => build(first)?,
                None => return Err(FlareError::PathExpression("missing operand".into())),
            };
            while let (Some(op), Some(rhs)) = (inner.next(), inner.next()) {
                let op = match op.as_str() {
                    "+" => BinOp::Add,
                    "-" => BinOp::Sub,
                    "*" => BinOp::Mul,
                    "/" => BinOp::Div,
                    _ => BinOp::Rem,
                };
                lhs = Expr::Binary(op, Box::new(lhs), Box::new(build(rhs)?));
            }
            Ok(lhs)
        }
        Rule::unary => {
            let mut negations = 0;
            let mut operand = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::neg => negations += 1,
                    _ => operand = Some(build(inner)?),
                }
            }
            let mut expr =
                operand.ok_or_else(|| FlareError::PathExpression("missing operand".into()))?;
            for _ in 0..negations {
                expr = Expr::Neg(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::power => {
            let mut inner = pair.into_inner();
            let base = match inner.next() {
                Some(base) => build(base)?,
                None => return Err(FlareError::PathExpression("missing operand".into())),
            };
            match inner.next() {
                Some(exponent) => Ok(Expr::Binary(
                    BinOp::Pow,
                    Box::new(base),
                    Box::new(build(exponent)?),
                )),
                None => Ok(base),
            }
        }
        Rule::number => pair
            .as_str()
            .parse::<f32>()
            .map(Expr::Number)
            .map_err(|e| FlareError::PathExpression(format!("{}: {e}", pair.as_str()))),
        Rule::symbol => match strip_math(pair.as_str()) {
            "x" => Ok(Expr::X),
            "PI" => Ok(Expr::Number(PI)),
            "E" => Ok(Expr::Number(E)),
            other => Err(FlareError::PathExpression(format!("unknown symbol: {other}"))),
        },
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner.next().map(|n| n.as_str()).unwrap_or_default();
            let func = Func::lookup(strip_math(name))
                .ok_or_else(|| FlareError::PathExpression(format!("unknown function: {name}")))?;
            let args = inner.map(build).collect::<Result<Vec<_>>>()?;
            let (min, max) = func.arity();
            if args.len() < min || args.len() > max {
                return Err(FlareError::PathExpression(format!(
                    "{name} takes {min} argument(s), got {}",
                    args.len()
                )));
            }
            Ok(Expr::Call(func, args))
        }
        other => Err(FlareError::PathExpression(format!(
            "unexpected {other:?} in expression"
        ))),
    }
}

fn strip_math(name: &str) -> &str {
    name.strip_prefix("Math.").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, x: f32) -> f32 {
        PathExpression::parse(src).unwrap().eval(x)
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("10 - 4 - 3", 0.0), 3.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0), 512.0);
        assert_eq!(eval("-2 ^ 2", 0.0), -4.0);
        assert_eq!(eval("7 % 4", 0.0), 3.0);
    }

    #[test]
    fn variable_and_functions() {
        assert!((eval("sin(x) * 20", PI / 2.0) - 20.0).abs() < 1e-4);
        assert!((eval("Math.cos(x / 10) * 5", 0.0) - 5.0).abs() < 1e-6);
        assert_eq!(eval("max(x, 3, -1)", 2.0), 3.0);
        assert_eq!(eval("pow(x, 2)", 3.0), 9.0);
        assert_eq!(eval("round(-2.5)", 0.0), -2.0);
        assert!((eval("Math.PI", 0.0) - PI).abs() < 1e-6);
        assert_eq!(eval("--x", 4.0), 4.0);
        assert_eq!(eval("1.5e2", 0.0), 150.0);
    }

    #[test]
    fn errors_are_reported() {
        for bad in ["", "x +", "foo(x)", "y * 2", "pow(x)", "(x"] {
            assert!(
                matches!(PathExpression::parse(bad), Err(FlareError::PathExpression(_))),
                "{bad:?} should fail"
            );
        }
    }
}
