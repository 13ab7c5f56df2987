//! Helpers called by `#[derive(Unmarshal)]` generated code

use crate::env::{EnvReader, Prefixed};
use crate::error::Error;
use crate::parse::{parse, FromEnvStr};
use crate::unmarshal::{EnvUnmarshaler, Unmarshal};
use std::any::type_name;

/// Look up `key` and parse its value as `T`.
///
/// Used for every value-shaped field; a missing key is always an error.
#[doc(hidden)]
pub fn unmarshal_value<T: FromEnvStr>(reader: &dyn EnvReader, key: &str) -> Result<T, Error> {
    let Some(value) = reader.lookup_env(key) else {
        log::debug!("no value for required key '{key}'");
        return Err(reader
            .missing_cause(key)
            .unwrap_or_else(|| Error::missing_key(key)));
    };
    parse::<T>(&value).map_err(|source| Error::parse(key, source))
}

/// Unmarshal one tagged field, composing its key as `prefix + tag`.
#[doc(hidden)]
pub fn unmarshal_field<T: Unmarshal>(
    reader: &dyn EnvReader,
    prefix: &str,
    tag: &str,
    field: &'static str,
) -> Result<T, Error> {
    let key = format!("{prefix}{tag}");
    log::trace!("unmarshaling field {field} from '{key}'");
    T::unmarshal_key(reader, &key).map_err(|source| Error::Field {
        field,
        key,
        source: Box::new(source),
    })
}

/// Collect the keys of one tagged field.
#[doc(hidden)]
pub fn collect_field_keys<T: Unmarshal>(prefix: &str, tag: &str, keys: &mut Vec<String>) {
    T::collect_keys(&format!("{prefix}{tag}"), keys);
}

/// Run a type's own hook, scoping the reader to `prefix` when there is one.
#[doc(hidden)]
pub fn unmarshal_custom<T: EnvUnmarshaler>(
    target: &mut T,
    reader: &dyn EnvReader,
    prefix: &str,
) -> Result<(), Error> {
    log::debug!(
        "delegating {} to its custom unmarshaler (prefix {prefix:?})",
        type_name::<T>()
    );
    let result = if prefix.is_empty() {
        target.unmarshal_env(reader)
    } else {
        target.unmarshal_env(&Prefixed::new(reader, prefix))
    };
    result.map_err(|source| Error::Custom {
        type_name: type_name::<T>(),
        source,
    })
}

/// Trace entry into a derived struct.
#[doc(hidden)]
pub fn enter_struct(name: &str, prefix: &str) {
    log::trace!("unmarshaling struct {name} with prefix {prefix:?}");
}
