//! Code supporting the `db *` sub commands.

pub mod wipe;
