//! Populate configuration structs from environment variables using per-field tags
//!
//! Each field that should be read from the environment carries a tag naming
//! its variable. Fields whose type is itself a struct use their tag as a
//! prefix for the tags inside, so nested configuration composes by plain
//! string concatenation.
//!
//! # Features
//!
//! - **Declarative**: `#[derive(Unmarshal)]` with `#[env("KEY")]` on each field
//! - **Nested structs**: the tag of a struct field prefixes its fields' keys
//! - **All or nothing**: every tagged field is required and the target is only
//!   written once the whole struct parsed
//! - **Custom unmarshalers**: types can take over with `#[env(custom)]`
//! - **Pluggable sources**: anything implementing [`EnvReader`]; the process
//!   environment, in-memory maps, dotenv files and `{KEY}_FILE` secrets ship
//!   with the crate
//!
//! # Value Parsing
//!
//! - Strings: `DATABASE_URL=postgres://localhost/db` (surrounding whitespace trimmed)
//! - Numbers: `MAX_CONNECTIONS=42`, range-checked against the field's width
//! - Booleans: `DEBUG=true` (`true`/`false`/`t`/`f`/`1`/`0`, any case)
//! - Durations: `TIMEOUT=1m30s` into [`Duration`] or [`std::time::Duration`]
//! - Lists: `HOSTS=a, b, c` into `Vec<T>`; an empty value is an empty list
//! - `Box<T>` is read exactly like `T`
//!
//! # Example
//!
//! ```rust
//! use envtag::{Duration, EnvMarshaler, MapEnv, Unmarshal};
//!
//! #[derive(Debug, Default, Unmarshal)]
//! struct Database {
//!     #[env("HOST")]
//!     pub host: String,
//!     #[env("PORT")]
//!     pub port: u16,
//! }
//!
//! #[derive(Debug, Default, Unmarshal)]
//! struct Config {
//!     #[env("DB_")]
//!     pub database: Database,
//!
//!     #[env("TIMEOUT")]
//!     pub timeout: Duration,
//!
//!     // no tag: left at its default
//!     pub started: bool,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let env = MapEnv::from([
//!     ("DB_HOST", "localhost"),
//!     ("DB_PORT", "5432"),
//!     ("TIMEOUT", "1m30s"),
//! ]);
//! let config: Config = EnvMarshaler::new(env).load()?;
//! assert_eq!(config.database.port, 5432);
//! assert_eq!(config.timeout, Duration::SECOND * 90);
//! # Ok(())
//! # }
//! ```
//!
//! # Attributes
//!
//! ## `#[env("KEY")]` / `#[env(name = "KEY")]`
//!
//! Bind a field to `KEY`, or for struct fields, use `KEY` as the prefix of
//! the nested keys. No separator is inserted, so prefixes usually end in `_`.
//! An empty tag is the same as no attribute.
//!
//! ## `#[env(custom)]`
//!
//! On the struct: skip field walking and call the type's
//! [`EnvUnmarshaler::unmarshal_env`] instead.

extern crate self as envtag;

#[doc(hidden)]
pub mod de;

mod duration;
mod env;
mod error;
mod parse;
mod unmarshal;

pub use duration::{Duration, DurationRangeError};
pub use env::{EnvReader, FileFallback, MapEnv, OsEnv, Prefixed};
pub use envtag_derive::Unmarshal;
pub use error::{Error, ParseError};
pub use parse::{parse, DefaultParser, FromEnvStr, Kind, Value};
pub use unmarshal::{
    from_env, EnvMarshaler, EnvUnmarshaler, FieldDescriptor, Shape, StructDescriptor, Unmarshal,
};

// Re-export for custom unmarshalers
pub use anyhow;
