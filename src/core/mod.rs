pub mod assembler;
pub mod decision;
pub mod defaults;
pub mod dispatcher;
pub mod pattern;
pub mod reader;
pub mod scanner;
pub mod transcript;
