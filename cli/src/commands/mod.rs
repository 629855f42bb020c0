pub mod cli;
pub mod input;
pub mod plan;
pub mod run;
