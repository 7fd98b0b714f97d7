//! Bottom-up rewrite rules: constant folding, identities and a few
//! canonical forms (coefficient first, subtraction instead of adding a
//! negative). Passes repeat until the tree stops changing.

use super::{Expr, Func};

const MAX_PASSES: usize = 16;

impl Expr {
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_PASSES {
            let next = rewrite(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

fn is_integer(n: f64) -> bool {
    n.fract() == 0.0 && n.is_finite()
}

fn gcd(mut a: f64, mut b: f64) -> f64 {
    a = a.abs();
    b = b.abs();
    while b > 0.0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `a / b` as a reduced `(numerator, denominator)`. Whole numbers stay an
/// exact fraction (`2/4` → `(1, 2)`); anything else folds to `(a / b, 1)`.
/// `None` for a zero denominator.
fn ratio(a: f64, b: f64) -> Option<(f64, f64)> {
    if b == 0.0 {
        return None;
    }
    if !is_integer(a) || !is_integer(b) {
        return Some((a / b, 1.0));
    }
    let g = gcd(a, b);
    let (mut n, mut d) = (a / g, b / g);
    if d < 0.0 {
        n = -n;
        d = -d;
    }
    Some((n, d))
}

/// `c * e / d` with the constant fraction reduced.
fn scaled(c: f64, e: Expr, d: f64) -> Expr {
    match ratio(c, d) {
        Some((n, o)) if o == 1.0 => mul(Expr::Number(n), e),
        Some((n, d)) => Expr::div(mul(Expr::Number(n), e), Expr::Number(d)),
        None => Expr::div(Expr::mul(Expr::Number(c), e), Expr::Number(d)),
    }
}

fn rewrite(e: &Expr) -> Expr {
    match e {
        Expr::Number(_) | Expr::Symbol(_) => e.clone(),
        Expr::Neg(inner) => neg(rewrite(inner)),
        Expr::Add(a, b) => add(rewrite(a), rewrite(b)),
        Expr::Sub(a, b) => sub(rewrite(a), rewrite(b)),
        Expr::Mul(a, b) => mul(rewrite(a), rewrite(b)),
        Expr::Div(a, b) => div(rewrite(a), rewrite(b)),
        Expr::Pow(a, b) => pow(rewrite(a), rewrite(b)),
        Expr::Call(f, arg) => call(*f, rewrite(arg)),
    }
}

fn neg(e: Expr) -> Expr {
    match e {
        Expr::Number(n) => Expr::Number(-n),
        Expr::Neg(inner) => *inner,
        other => Expr::neg(other),
    }
}

fn add(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x + y),
        (Expr::Number(z), e) | (e, Expr::Number(z)) if z == 0.0 => e,
        (e, Expr::Number(n)) if n < 0.0 => Expr::sub(e, Expr::Number(-n)),
        (e, Expr::Neg(inner)) => Expr::sub(e, *inner),
        (Expr::Neg(inner), e) => Expr::sub(e, *inner),
        // constants trail: `2 + x` reads as `x + 2`
        (Expr::Number(n), e) => Expr::add(e, Expr::Number(n)),
        (a, b) if a == b => Expr::mul(Expr::Number(2.0), a),
        (a, b) => Expr::add(a, b),
    }
}

fn sub(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x - y),
        (e, Expr::Number(z)) if z == 0.0 => e,
        (Expr::Number(z), e) if z == 0.0 => neg(e),
        (e, Expr::Number(n)) if n < 0.0 => Expr::add(e, Expr::Number(-n)),
        (e, Expr::Neg(inner)) => Expr::add(e, *inner),
        (a, b) if a == b => Expr::Number(0.0),
        (a, b) => Expr::sub(a, b),
    }
}

fn mul(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x * y),
        (Expr::Number(z), _) | (_, Expr::Number(z)) if z == 0.0 => Expr::Number(0.0),
        (Expr::Number(o), e) | (e, Expr::Number(o)) if o == 1.0 => e,
        (Expr::Number(m), e) | (e, Expr::Number(m)) if m == -1.0 => neg(e),
        // coefficient first
        (e, Expr::Number(n)) => Expr::mul(Expr::Number(n), e),
        (Expr::Number(x), Expr::Mul(inner_a, inner_b)) => match *inner_a {
            Expr::Number(y) => Expr::mul(Expr::Number(x * y), *inner_b),
            other => Expr::mul(Expr::Number(x), Expr::mul(other, *inner_b)),
        },
        (Expr::Number(x), Expr::Div(num, den)) => match *den {
            Expr::Number(y) => scaled(x, *num, y),
            other => Expr::mul(Expr::Number(x), Expr::div(*num, other)),
        },
        (Expr::Neg(a), b) | (b, Expr::Neg(a)) => neg(mul(*a, b)),
        (a, b) if a == b => Expr::pow(a, Expr::Number(2.0)),
        (Expr::Pow(base, exp), other) | (other, Expr::Pow(base, exp)) if *base == other => {
            Expr::pow(*base, add(*exp, Expr::Number(1.0)))
        }
        (a, b) => match (a, b) {
            (Expr::Pow(b1, e1), Expr::Pow(b2, e2)) if b1 == b2 => Expr::pow(*b1, add(*e1, *e2)),
            (a, b) => Expr::mul(a, b),
        },
    }
}

fn div(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => match ratio(x, y) {
            Some((n, d)) if d == 1.0 => Expr::Number(n),
            Some((n, d)) => Expr::div(Expr::Number(n), Expr::Number(d)),
            None => Expr::div(Expr::Number(x), Expr::Number(y)),
        },
        (e, Expr::Number(o)) if o == 1.0 => e,
        (Expr::Number(z), _) if z == 0.0 => Expr::Number(0.0),
        (Expr::Neg(inner), b) => neg(div(*inner, b)),
        (a, b) if a == b => Expr::Number(1.0),
        // `(2*x)/2` → `x`, `(6*x)/4` → `3*x/2`
        (Expr::Mul(coef, rest), Expr::Number(d)) => match *coef {
            Expr::Number(c) => scaled(c, *rest, d),
            other => Expr::div(Expr::mul(other, *rest), Expr::Number(d)),
        },
        (a, b) => Expr::div(a, b),
    }
}

fn pow(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (_, Expr::Number(z)) if z == 0.0 => Expr::Number(1.0),
        (e, Expr::Number(o)) if o == 1.0 => e,
        (Expr::Number(o), _) if o == 1.0 => Expr::Number(1.0),
        (Expr::Number(x), Expr::Number(y)) if is_integer(y) => Expr::Number(x.powf(y)),
        (Expr::Pow(base, inner), Expr::Number(y)) => match *inner {
            Expr::Number(x) => Expr::pow(*base, Expr::Number(x * y)),
            other => Expr::pow(Expr::pow(*base, other), Expr::Number(y)),
        },
        (a, b) => Expr::pow(a, b),
    }
}

fn call(f: Func, arg: Expr) -> Expr {
    let folded = match (&f, &arg) {
        (Func::Sin | Func::Tan, Expr::Number(z)) if *z == 0.0 => Some(0.0),
        (Func::Cos | Func::Exp, Expr::Number(z)) if *z == 0.0 => Some(1.0),
        (Func::Ln, Expr::Number(o)) if *o == 1.0 => Some(0.0),
        (Func::Sqrt, Expr::Number(n)) if *n >= 0.0 && is_integer(n.sqrt()) => Some(n.sqrt()),
        (Func::Ln, Expr::Symbol(s)) if s == "E" => Some(1.0),
        _ => None,
    };
    match folded {
        Some(v) => Expr::Number(v),
        None => Expr::call(f, arg),
    }
}
