//! The handler-function boundary.

pub mod handler;

pub use handler::{FunctionValue, InvocationContext, PlinthError, PlinthFunction};
