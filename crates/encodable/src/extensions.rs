//! # Model Extensions
//!
//! [`EncodableExt`] lets any [`Model`] serialize itself through a [`Serializer`],
//! so call sites read `user.encode(&serializer, &request)` instead of passing the
//! object into the serializer.

use crate::Encoded;
use crate::error::SerializationError;
use crate::model::Model;
use crate::request::SerializationRequest;
use crate::serializer::Serializer;
use crate::view::ViewName;
use serde_json::Value;

/// Ergonomic serialization for models. Implemented for every [`Model`].
pub trait EncodableExt: Model {
    /// Serializes `self` with an explicit request.
    ///
    /// # Errors
    /// See [`Serializer::serialize`].
    fn encode(
        &self,
        serializer: &Serializer,
        request: &SerializationRequest,
    ) -> Result<Encoded, SerializationError>
    where
        Self: Sized,
    {
        serializer.serialize(self, request)
    }

    /// Serializes `self` under a named view.
    ///
    /// # Errors
    /// See [`Serializer::as_json`].
    fn as_json(
        &self,
        serializer: &Serializer,
        view: impl Into<ViewName>,
    ) -> Result<Value, SerializationError>
    where
        Self: Sized,
    {
        serializer.as_json(self, view)
    }
}

impl<T: Model> EncodableExt for T {}
