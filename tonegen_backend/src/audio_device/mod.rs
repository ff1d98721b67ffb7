pub mod enumeration;
pub mod negotiation;
pub mod stream;
