//! Tag-driven struct unmarshalling

use crate::de;
use crate::duration::Duration;
use crate::env::{EnvReader, OsEnv};
use crate::error::Error;
use crate::parse::{FromEnvStr, Kind};
use std::any::type_name;

/// How [`EnvMarshaler`] treats a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Parsed from the single value stored under its key.
    Value(Kind),
    /// Walked field by field; the key is used as a prefix for the fields' tags.
    Struct(&'static StructDescriptor),
    /// Populates itself through [`EnvUnmarshaler`].
    Custom,
}

/// Static description of a struct deriving [`Unmarshal`](trait@Unmarshal).
#[derive(Debug, PartialEq, Eq)]
pub struct StructDescriptor {
    pub name: &'static str,
    /// All declared fields, in declaration (and traversal) order
    pub fields: &'static [FieldDescriptor],
}

impl StructDescriptor {
    /// Fields that take part in binding.
    pub fn bound_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.is_bound())
    }
}

/// One declared field: its name, tag and the type as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Key, or key prefix for struct fields; empty when the field is skipped
    pub tag: &'static str,
    pub type_name: &'static str,
}

impl FieldDescriptor {
    pub fn is_bound(&self) -> bool {
        !self.tag.is_empty()
    }
}

/// Types that can be built from an [`EnvReader`].
///
/// Derive it for structs with `#[derive(Unmarshal)]`. It is implemented by
/// the crate for every [`FromEnvStr`] type, `Vec<T>` and `Box<T>`; use
/// [`unmarshal_as_value!`](crate::unmarshal_as_value) for your own
/// [`FromEnvStr`] types.
pub trait Unmarshal: Sized {
    fn shape() -> Shape;

    /// Build a fresh value.
    ///
    /// For values `key` is the variable to read; for structs it is the prefix
    /// for the fields' tags.
    fn unmarshal_key(reader: &dyn EnvReader, key: &str) -> Result<Self, Error>;

    /// Populate `self` in place.
    ///
    /// The default builds a fresh value and only assigns it on success.
    fn unmarshal_into(&mut self, reader: &dyn EnvReader, key: &str) -> Result<(), Error> {
        *self = Self::unmarshal_key(reader, key)?;
        Ok(())
    }

    /// Append every fully composed key this type reads under `key`.
    fn collect_keys(key: &str, keys: &mut Vec<String>);
}

/// Opt-out of field walking: the type populates itself.
///
/// Enabled with `#[env(custom)]` next to `#[derive(Unmarshal)]`. Tags on the
/// fields of such a type are ignored.
///
/// ```rust
/// use envtag::{EnvMarshaler, EnvReader, EnvUnmarshaler, MapEnv, Unmarshal};
///
/// #[derive(Debug, Default, Unmarshal)]
/// #[env(custom)]
/// struct Endpoint {
///     host: String,
///     port: u16,
/// }
///
/// impl EnvUnmarshaler for Endpoint {
///     fn unmarshal_env(&mut self, reader: &dyn EnvReader) -> envtag::anyhow::Result<()> {
///         let raw = reader
///             .lookup_env("ENDPOINT")
///             .ok_or_else(|| envtag::anyhow::anyhow!("ENDPOINT is not set"))?;
///         let (host, port) = raw
///             .split_once(':')
///             .ok_or_else(|| envtag::anyhow::anyhow!("expected host:port"))?;
///         self.host = host.to_string();
///         self.port = envtag::parse(port)?;
///         Ok(())
///     }
/// }
///
/// let marshaler = EnvMarshaler::new(MapEnv::from([("ENDPOINT", "localhost:8080")]));
/// let endpoint: Endpoint = marshaler.load().unwrap();
/// assert_eq!(endpoint.port, 8080);
/// ```
pub trait EnvUnmarshaler {
    fn unmarshal_env(&mut self, reader: &dyn EnvReader) -> anyhow::Result<()>;
}

/// Unmarshals structs from a reader.
///
/// ```rust
/// use envtag::{EnvMarshaler, MapEnv, Unmarshal};
///
/// #[derive(Debug, Default, Unmarshal)]
/// struct CassandraConfig {
///     #[env("CASSANDRA_HOSTS")]
///     hosts: Vec<String>,
///     #[env("CASSANDRA_PORT")]
///     port: u16,
/// }
///
/// let marshaler = EnvMarshaler::new(MapEnv::from([
///     ("CASSANDRA_HOSTS", "10.0.0.1, 10.0.0.2"),
///     ("CASSANDRA_PORT", "9042"),
/// ]));
/// let mut config = CassandraConfig::default();
/// marshaler.unmarshal(&mut config).unwrap();
/// assert_eq!(config.hosts, ["10.0.0.1", "10.0.0.2"]);
/// assert_eq!(config.port, 9042);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvMarshaler<R> {
    reader: R,
    prefix: String,
}

impl<R: EnvReader> EnvMarshaler<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prefix: String::new(),
        }
    }

    /// Prefix prepended to every key, including those of the root struct.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Populate `target` from the reader.
    ///
    /// Custom unmarshalers get the reader and full control. Derived structs
    /// are built from scratch and written to `target` only if every field
    /// succeeded, so a failure leaves `target` untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStruct`] when `T` is a plain value
    /// - the first field failure in declaration order, wrapped in
    ///   [`Error::Field`]
    /// - [`Error::Custom`] when a custom hook fails
    pub fn unmarshal<T: Unmarshal>(&self, target: &mut T) -> Result<(), Error> {
        match T::shape() {
            Shape::Custom => target.unmarshal_into(&self.reader, &self.prefix),
            Shape::Struct(descriptor) => {
                log::debug!(
                    "unmarshaling {} with prefix {:?}",
                    descriptor.name,
                    self.prefix
                );
                let value = T::unmarshal_key(&self.reader, &self.prefix)?;
                *target = value;
                Ok(())
            }
            Shape::Value(_) => Err(Error::NotStruct {
                type_name: type_name::<T>(),
            }),
        }
    }

    /// Build a `T` starting from its default value.
    pub fn load<T: Unmarshal + Default>(&self) -> Result<T, Error> {
        let mut target = T::default();
        self.unmarshal(&mut target)?;
        Ok(target)
    }

    /// Keys `T` would read that the reader has no value for, in traversal
    /// order. Keys read by custom unmarshalers are not known in advance and
    /// never reported.
    pub fn missing_keys<T: Unmarshal>(&self) -> Vec<String> {
        let mut keys = Vec::new();
        T::collect_keys(&self.prefix, &mut keys);
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (_, missing) = self.reader.has_keys(&keys);
        missing
    }
}

/// Load `T` from the process environment.
///
/// # Errors
///
/// See [`EnvMarshaler::unmarshal`].
pub fn from_env<T: Unmarshal + Default>() -> Result<T, Error> {
    EnvMarshaler::new(OsEnv).load()
}

/// Implement [`Unmarshal`](trait@crate::Unmarshal) for types that already implement
/// [`FromEnvStr`](crate::FromEnvStr), so they can be used as struct fields.
#[macro_export]
macro_rules! unmarshal_as_value {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::Unmarshal for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::Value(<$ty as $crate::FromEnvStr>::kind())
            }

            fn unmarshal_key(
                reader: &dyn $crate::EnvReader,
                key: &str,
            ) -> ::core::result::Result<Self, $crate::Error> {
                $crate::de::unmarshal_value(reader, key)
            }

            fn collect_keys(key: &str, keys: &mut ::std::vec::Vec<::std::string::String>) {
                keys.push(key.to_string());
            }
        }
    )*};
}

unmarshal_as_value!(
    bool,
    String,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    isize,
    f32,
    f64,
    Duration,
    std::time::Duration,
);

impl<T: FromEnvStr> Unmarshal for Vec<T> {
    fn shape() -> Shape {
        Shape::Value(<Self as FromEnvStr>::kind())
    }

    fn unmarshal_key(reader: &dyn EnvReader, key: &str) -> Result<Self, Error> {
        de::unmarshal_value(reader, key)
    }

    fn collect_keys(key: &str, keys: &mut Vec<String>) {
        keys.push(key.to_string());
    }
}

impl<T: Unmarshal> Unmarshal for Box<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Value(kind) => Shape::Value(Kind::Pointer(Box::new(kind))),
            shape => shape,
        }
    }

    fn unmarshal_key(reader: &dyn EnvReader, key: &str) -> Result<Self, Error> {
        T::unmarshal_key(reader, key).map(Box::new)
    }

    fn unmarshal_into(&mut self, reader: &dyn EnvReader, key: &str) -> Result<(), Error> {
        (**self).unmarshal_into(reader, key)
    }

    fn collect_keys(key: &str, keys: &mut Vec<String>) {
        T::collect_keys(key, keys);
    }
}
