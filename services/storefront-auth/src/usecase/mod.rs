pub mod code;
pub mod session;
