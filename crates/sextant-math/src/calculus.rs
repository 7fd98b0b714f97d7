//! Symbolic differentiation and integration with respect to `x`.

use crate::error::{MathError, MathResult};
use crate::expr::poly::Polynomial;
use crate::expr::{Expr, Func, VAR};

/// d/dx of `expr`, simplified.
pub fn differentiate(expr: &Expr) -> Expr {
    derive(expr).simplify()
}

fn derive(expr: &Expr) -> Expr {
    if !expr.depends_on_var() {
        return Expr::num(0.0);
    }

    match expr {
        Expr::Number(_) => Expr::num(0.0),
        Expr::Symbol(s) => Expr::num(if s == VAR { 1.0 } else { 0.0 }),
        Expr::Neg(e) => Expr::neg(derive(e)),
        Expr::Add(a, b) => Expr::add(derive(a), derive(b)),
        Expr::Sub(a, b) => Expr::sub(derive(a), derive(b)),
        Expr::Mul(a, b) => {
            if !a.depends_on_var() {
                Expr::mul((**a).clone(), derive(b))
            } else if !b.depends_on_var() {
                Expr::mul(derive(a), (**b).clone())
            } else {
                Expr::add(
                    Expr::mul(derive(a), (**b).clone()),
                    Expr::mul((**a).clone(), derive(b)),
                )
            }
        }
        Expr::Div(a, b) => {
            if !b.depends_on_var() {
                Expr::div(derive(a), (**b).clone())
            } else {
                // (a'b - ab') / b**2
                Expr::div(
                    Expr::sub(
                        Expr::mul(derive(a), (**b).clone()),
                        Expr::mul((**a).clone(), derive(b)),
                    ),
                    Expr::pow((**b).clone(), Expr::num(2.0)),
                )
            }
        }
        Expr::Pow(base, exp) => {
            let (base, exp) = (&**base, &**exp);
            if !exp.depends_on_var() {
                // n * u**(n-1) * u'
                Expr::mul(
                    Expr::mul(
                        exp.clone(),
                        Expr::pow(base.clone(), Expr::sub(exp.clone(), Expr::num(1.0))),
                    ),
                    derive(base),
                )
            } else if !base.depends_on_var() {
                // a**v * ln(a) * v'
                let log_base = match base {
                    Expr::Symbol(s) if s == "E" || s == "e" => Expr::num(1.0),
                    other => Expr::call(Func::Ln, other.clone()),
                };
                Expr::mul(Expr::mul(expr.clone(), log_base), derive(exp))
            } else {
                // u**v * (v' ln u + v u'/u)
                Expr::mul(
                    expr.clone(),
                    Expr::add(
                        Expr::mul(derive(exp), Expr::call(Func::Ln, base.clone())),
                        Expr::div(Expr::mul(exp.clone(), derive(base)), base.clone()),
                    ),
                )
            }
        }
        Expr::Call(func, arg) => {
            let u = (**arg).clone();
            let outer = match func {
                Func::Sin => Expr::call(Func::Cos, u),
                Func::Cos => Expr::neg(Expr::call(Func::Sin, u)),
                Func::Tan => Expr::div(
                    Expr::num(1.0),
                    Expr::pow(Expr::call(Func::Cos, u), Expr::num(2.0)),
                ),
                Func::Exp => Expr::call(Func::Exp, u),
                Func::Ln => Expr::div(Expr::num(1.0), u),
                Func::Sqrt => Expr::div(
                    Expr::num(1.0),
                    Expr::mul(Expr::num(2.0), Expr::call(Func::Sqrt, u)),
                ),
            };
            Expr::mul(outer, derive(arg))
        }
    }
}

/// Antiderivative of `expr` with respect to `x`, without the constant of
/// integration. Handles sums, constant multiples, powers of a linear
/// argument, `1/x`, and `sin`/`cos`/`exp` of a linear argument.
pub fn integrate(expr: &Expr) -> MathResult<Expr> {
    let simplified = expr.simplify();
    antiderivative(&simplified)
        .map(|e| e.simplify())
        .ok_or_else(|| MathError::NoClosedForm(expr.to_string()))
}

/// `(a, b)` when `expr` is `a*x + b` with `a != 0`.
fn linear(expr: &Expr) -> Option<(f64, f64)> {
    let poly = Polynomial::from_expr(expr)?;
    match poly.trimmed() {
        [b, a] if *a != 0.0 => Some((*a, *b)),
        _ => None,
    }
}

/// `e / a`, leaving `e` alone for the common `a == 1` case.
fn over(e: Expr, a: f64) -> Expr {
    if a == 1.0 {
        e
    } else {
        Expr::div(e, Expr::num(a))
    }
}

fn antiderivative(expr: &Expr) -> Option<Expr> {
    by_rule(expr).or_else(|| polynomial_antiderivative(expr))
}

fn by_rule(expr: &Expr) -> Option<Expr> {
    if !expr.depends_on_var() {
        return Some(Expr::mul(expr.clone(), Expr::var()));
    }

    match expr {
        Expr::Symbol(_) => Some(Expr::div(
            Expr::pow(Expr::var(), Expr::num(2.0)),
            Expr::num(2.0),
        )),
        Expr::Neg(e) => Some(Expr::neg(antiderivative(e)?)),
        Expr::Add(a, b) => Some(Expr::add(antiderivative(a)?, antiderivative(b)?)),
        Expr::Sub(a, b) => Some(Expr::sub(antiderivative(a)?, antiderivative(b)?)),
        Expr::Mul(a, b) if !a.depends_on_var() => {
            Some(Expr::mul((**a).clone(), antiderivative(b)?))
        }
        Expr::Mul(a, b) if !b.depends_on_var() => {
            Some(Expr::mul((**b).clone(), antiderivative(a)?))
        }
        Expr::Div(a, b) if !b.depends_on_var() => {
            Some(Expr::div(antiderivative(a)?, (**b).clone()))
        }
        Expr::Div(a, b) if !a.depends_on_var() => {
            // c / (k*x + m) = (c/k) * ln(k*x + m)
            let (k, _) = linear(b)?;
            Some(Expr::mul(
                (**a).clone(),
                over(Expr::call(Func::Ln, (**b).clone()), k),
            ))
        }
        Expr::Pow(base, exp) if !exp.depends_on_var() => {
            let (k, _) = linear(base)?;
            let n = exp.eval(0.0).ok()?;
            if n == -1.0 {
                Some(over(Expr::call(Func::Ln, (**base).clone()), k))
            } else {
                // u**(n+1) / ((n+1) k)
                let raised = Expr::pow((**base).clone(), Expr::num(n + 1.0));
                Some(Expr::div(raised, Expr::num((n + 1.0) * k)))
            }
        }
        Expr::Call(func, arg) => {
            let (k, _) = linear(arg)?;
            let u = (**arg).clone();
            let inner = match func {
                Func::Sin => Expr::neg(Expr::call(Func::Cos, u)),
                Func::Cos => Expr::call(Func::Sin, u),
                Func::Exp => Expr::call(Func::Exp, u),
                Func::Tan | Func::Ln | Func::Sqrt => return None,
            };
            Some(over(inner, k))
        }
        _ => None,
    }
}

/// Term-by-term integral of anything that expands to a polynomial, such as
/// `x*(x + 1)`. Highest power first.
fn polynomial_antiderivative(expr: &Expr) -> Option<Expr> {
    let poly = Polynomial::from_expr(expr)?;
    poly.trimmed()
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, c)| **c != 0.0)
        .map(|(power, c)| {
            let n = power as f64 + 1.0;
            let raised = if n == 1.0 {
                Expr::var()
            } else {
                Expr::pow(Expr::var(), Expr::num(n))
            };
            Expr::mul(Expr::num(*c), over(raised, n))
        })
        .reduce(Expr::add)
        .or(Some(Expr::num(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse;

    fn d(text: &str) -> String {
        differentiate(&parse(text).unwrap()).to_string()
    }

    fn i(text: &str) -> String {
        integrate(&parse(text).unwrap()).unwrap().to_string()
    }

    #[test]
    fn test_differentiate_polynomials() {
        assert_eq!(d("x**2"), "2*x");
        assert_eq!(d("x**3 + 2*x"), "3*x**2 + 2");
        assert_eq!(d("7"), "0");
        assert_eq!(d("x"), "1");
    }

    #[test]
    fn test_differentiate_functions() {
        assert_eq!(d("sin(x)"), "cos(x)");
        assert_eq!(d("cos(x)"), "-sin(x)");
        assert_eq!(d("exp(2*x)"), "2*exp(2*x)");
        assert_eq!(d("ln(x)"), "1/x");
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let cases = ["x*sin(x)", "sin(x)/x", "x**x", "sqrt(x**2 + 1)", "tan(x)", "2**x"];
        for text in cases {
            let f = parse(text).unwrap();
            let df = differentiate(&f);
            let x0 = 1.3;
            let h = 1e-6;
            let numeric = (f.eval(x0 + h).unwrap() - f.eval(x0 - h).unwrap()) / (2.0 * h);
            let symbolic = df.eval(x0).unwrap();
            assert!(
                (numeric - symbolic).abs() < 1e-5,
                "{text}: d/dx = {df} gave {symbolic}, expected {numeric}"
            );
        }
    }

    #[test]
    fn test_integrate_polynomials() {
        assert_eq!(i("x**2"), "x**3/3");
        assert_eq!(i("2*x + 1"), "x**2 + x");
        assert_eq!(i("5"), "5*x");
    }

    #[test]
    fn test_integrate_functions() {
        assert_eq!(i("cos(x)"), "sin(x)");
        assert_eq!(i("sin(x)"), "-cos(x)");
        assert_eq!(i("exp(3*x)"), "exp(3*x)/3");
        assert_eq!(i("1/x"), "log(x)");
        assert_eq!(i("x**-1"), "log(x)");
    }

    #[test]
    fn test_integral_differentiates_back() {
        for text in [
            "3*x**2 - 4*x + 2",
            "(2*x + 1)**3",
            "sin(2*x) + cos(x)",
            "4/(2*x + 1)",
            "x*(x + 1)",
            "(x + 1)*(x - 1)",
            "2*x**3*x",
            "x*(x + 1) + exp(x)",
            "(x**2 + 1)**2",
        ] {
            let f = parse(text).unwrap();
            let big_f = integrate(&f).unwrap();
            let back = differentiate(&big_f);
            for x0 in [0.3, 1.1, 2.7] {
                assert!(
                    (back.eval(x0).unwrap() - f.eval(x0).unwrap()).abs() < 1e-9,
                    "{text}: F = {big_f}, F' = {back}"
                );
            }
        }
    }

    #[test]
    fn test_integrate_products_of_polynomials() {
        assert_eq!(i("x*(x + 1)"), "x**3/3 + x**2/2");
        assert_eq!(i("(x + 1)*(x - 1)"), "x**3/3 - x");
    }

    #[test]
    fn test_integrate_without_closed_form() {
        let err = integrate(&parse("sin(x**2)").unwrap()).unwrap_err();
        assert!(matches!(err, MathError::NoClosedForm(ref s) if s == "sin(x**2)"));
    }
}
