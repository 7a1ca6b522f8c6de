//! Accept loop that hands each connection to its own handler task.

pub mod listener;
