//! # JSON Secrets
//!
//! Helpers for secrets whose payload is a JSON document, such as the common
//! `{"username": ..., "password": ...}` database credential shape.
//!
//! [`decoder`] builds a [`Decode`](crate::service::Decode) capability that checks every
//! fetched secret against a Rust type and hands the other capabilities a canonical
//! text encoding of it. [`Secret::from_json`] and [`Secret::to_json`] cover the
//! generate side.

use crate::secret::Secret;
use crate::service::Decode;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

impl Secret {
    /// Encode `value` as a text secret
    pub fn from_json<T: Serialize>(value: &T) -> Result<Self> {
        let text = serde_json::to_string(value).context("Failed to encode secret as JSON")?;
        Ok(Secret::Text(text))
    }

    /// Parse the payload as JSON into `T`, whichever variant holds it
    pub fn to_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(self.value()).context("Secret payload is not valid JSON for the expected shape")
    }
}

/// Decode capability that round-trips every secret through `T`
pub struct JsonDecoder<T> {
    _shape: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("shape", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Decode for JsonDecoder<T>
where
    T: DeserializeOwned + Serialize,
{
    fn decode(&self, secret: Secret) -> Result<Secret> {
        let value: T = secret.to_json().with_context(|| {
            format!("Failed to decode secret into {}", std::any::type_name::<T>())
        })?;
        Secret::from_json(&value)
    }
}

/// A [`Decode`] capability that requires every secret to be JSON shaped like `T`
#[must_use]
pub fn decoder<T>() -> JsonDecoder<T>
where
    T: DeserializeOwned + Serialize,
{
    JsonDecoder {
        _shape: PhantomData,
    }
}
