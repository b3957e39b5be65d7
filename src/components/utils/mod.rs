//! Module commun aux composants.
//!
//! Contient notamment la persistance JSON, les tâches différées et la lecture des montants.

pub mod amount_parser;
pub mod data;
pub mod task;
