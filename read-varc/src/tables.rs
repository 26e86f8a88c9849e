//! The various tables and structures used by `VARC`

pub mod coverage;
pub mod index;
pub mod mivs;
pub mod varc;
pub mod variations;
