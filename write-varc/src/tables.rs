//! Encoders and builders for each structure

pub mod coverage;
pub mod index;
pub mod mivs;
pub mod tuple_values;
pub mod var_int;
pub mod varc;
