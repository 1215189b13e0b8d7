//! Channel membership and message posting.
//!
//! [`ChannelRepository`] is the entry point: it resolves the caller through an
//! [`IdentityResolver`], checks channel membership, and hands durable writes to
//! the stores in `telex-db`.

pub mod error;
pub mod identity;
pub mod repository;

pub use error::{ErrorKind, RtmError};
pub use identity::{IdentityResolver, JwtResolver, ResolveError, issue_token};
pub use repository::ChannelRepository;
