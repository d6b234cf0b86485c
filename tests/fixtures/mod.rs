mod fixture_disg;

#[allow(unused_imports)]
pub use fixture_disg::*;
