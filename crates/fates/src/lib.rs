//! Command line tools for *Fire Emblem Fates* `.bin` resource files.

pub mod commands;
