pub mod config;
pub mod inspect;
pub mod replay;
pub mod synth;
