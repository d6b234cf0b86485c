mod identity;
mod mapper;
mod subordinate;

pub use identity::*;
pub use mapper::*;
pub use subordinate::*;
