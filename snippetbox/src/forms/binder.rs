//! Decoding of URL-encoded form submissions into typed forms
//!
//! [`FormValues`] is the raw multi-valued view of a submitted body. Form
//! structs implement [`FromForm`] to pull their fields out of it, and
//! handlers receive them through the [`PostForm`] extractor.
//!
//! Binding only decodes. Rule checks run afterwards, against the form's own
//! `Validator`.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::str::FromStr;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors produced while decoding a form submission
#[derive(Debug, thiserror::Error)]
pub enum FormDecodeError {
    /// Request did not declare a URL-encoded body
    #[error("expected an application/x-www-form-urlencoded request body")]
    UnsupportedContentType,

    /// Body could not be read
    #[error("failed to read form body: {0}")]
    Body(String),

    /// Body bytes were not UTF-8
    #[error("form body is not valid UTF-8")]
    InvalidEncoding,

    /// A required field was absent
    #[error("missing form field `{0}`")]
    MissingField(String),

    /// A field could not be converted to the expected type
    #[error("form field `{field}` is not a valid {expected}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Human name of the expected type
        expected: &'static str,
    },
}

impl IntoResponse for FormDecodeError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "rejecting malformed form submission");
        let status = StatusCode::BAD_REQUEST;
        (status, status.canonical_reason().unwrap_or("Bad Request")).into_response()
    }
}

/// Decoded `name=value` pairs of a form body
///
/// Repeated names keep every value; lookups return the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: HashMap<String, Vec<String>>,
}

impl FormValues {
    /// Decode a URL-encoded body
    pub fn parse(body: &[u8]) -> Result<Self, FormDecodeError> {
        if std::str::from_utf8(body).is_err() {
            return Err(FormDecodeError::InvalidEncoding);
        }

        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in form_urlencoded::parse(body) {
            values
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Ok(Self { values })
    }

    /// First value submitted under `field`
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value submitted under `field`, in submission order
    #[must_use]
    pub fn get_all(&self, field: &str) -> &[String] {
        self.values.get(field).map_or(&[], Vec::as_slice)
    }

    /// First value of `field` as an owned string
    pub fn required_str(&self, field: &str) -> Result<String, FormDecodeError> {
        self.get(field)
            .map(str::to_owned)
            .ok_or_else(|| FormDecodeError::MissingField(field.to_owned()))
    }

    /// First value of `field` parsed as an integer
    pub fn required_int<T: FromStr>(&self, field: &str) -> Result<T, FormDecodeError> {
        self.get(field)
            .ok_or_else(|| FormDecodeError::MissingField(field.to_owned()))?
            .trim()
            .parse()
            .map_err(|_| FormDecodeError::InvalidValue {
                field: field.to_owned(),
                expected: "integer",
            })
    }
}

/// A form type that can be built from decoded values
pub trait FromForm: Sized {
    /// Pull every field out of `values`
    fn from_form(values: &FormValues) -> Result<Self, FormDecodeError>;
}

/// Encode `pairs` as a URL-encoded body
#[must_use]
pub fn encode_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name.as_ref(), value.as_ref());
    }
    serializer.finish()
}

pub(crate) fn is_form_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Extractor that binds a URL-encoded request body into `T`
///
/// Rejects with 400 Bad Request when the body cannot be bound.
///
/// ```rust,no_run
/// use snippetbox::forms::{PostForm, SnippetCreateForm};
///
/// async fn create(PostForm(form): PostForm<SnippetCreateForm>) -> String {
///     form.title
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PostForm<T>(pub T);

impl<T, S> FromRequest<S> for PostForm<T>
where
    T: FromForm,
    S: Send + Sync,
{
    type Rejection = FormDecodeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_form_content_type(req.headers()) {
            return Err(FormDecodeError::UnsupportedContentType);
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|err| FormDecodeError::Body(err.body_text()))?;

        let values = FormValues::parse(&body)?;
        T::from_form(&values).map(Self)
    }
}
