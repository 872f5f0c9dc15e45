pub mod fork_types;
pub mod state;
pub mod vm;
