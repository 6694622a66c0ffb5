// Library surface for the console host and integration tests.
pub mod app_dirs;
pub mod config;
pub mod cursor;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod host;
pub mod phonetics;
pub mod profile;
pub mod report;
pub mod runtime;
pub mod session;

pub use dispatcher::Dispatcher;
pub use error::{SpellError, StoreError};
pub use event::{InboundEvent, Response};
pub use profile::{MemoryProfileStore, Profile, ProfileStore, SqliteProfileStore};
