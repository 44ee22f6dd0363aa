//! Configuration helpers shared by the CLI option structs.

pub mod duration;
