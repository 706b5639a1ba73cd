pub mod abi;
pub mod events;
pub mod node;
pub mod roles;
