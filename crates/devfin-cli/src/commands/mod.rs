pub mod scenarios;
pub mod simulation;
