pub mod solver;

pub use solver::{solve, solve_all, Route, RouteGraph};
