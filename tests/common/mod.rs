#![allow(dead_code)]

pub mod endpoints;
pub mod utils;
