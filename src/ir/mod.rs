pub mod block;
pub mod inst;
pub mod opcode;
pub mod types;
pub mod value;
