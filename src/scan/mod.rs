pub mod observer;
pub mod scanner;
