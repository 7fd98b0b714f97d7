pub mod calculus;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod extract;
pub mod ops;
pub mod plot;
pub mod solve;

pub use calculus::{differentiate, integrate};
pub use dispatch::{Dispatcher, MathOperation, MathOutput};
pub use error::{MathError, MathResult, ParseError};
pub use expr::Expr;
pub use extract::{ExtractedParameters, PlotRequest, UnitQuery};
pub use ops::{BinaryOp, Statistics, TrigFunction};
pub use plot::plot_function;
pub use solve::solve_equation;
