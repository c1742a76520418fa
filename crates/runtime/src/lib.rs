pub mod builtins;
pub mod interpreter;
pub mod state;
pub mod values;

extern crate frontend;
extern crate tools;
