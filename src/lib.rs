#[allow(non_snake_case)]
pub mod Compounds;
#[allow(non_snake_case)]
pub mod Descriptors;
#[allow(non_snake_case)]
pub mod Export;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cli;
pub mod laboratory;
pub mod settings;
pub mod validation;
