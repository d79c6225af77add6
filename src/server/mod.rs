//! TCP listener driving HTTP connections

pub mod listener;
