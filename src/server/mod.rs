//! Code supporting the `server *` sub commands.

pub mod rest;
