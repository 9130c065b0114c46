//! Identity-domain identifiers, bearer credentials, and verified identity claims.

pub mod bearer;
pub mod claims;
pub mod id;

pub use bearer::*;
pub use claims::*;
pub use id::*;
