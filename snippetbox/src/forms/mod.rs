//! Form binding and validation
//!
//! Each endpoint that accepts a submission has its own form type. A form is
//! bound from the request body with [`PostForm`], then checked with its
//! `validate` method, which fills the form's [`Validator`]. Invalid forms are
//! rendered back to the visitor with the errors attached.

pub mod binder;
pub mod snippet;
pub mod user;
pub mod validator;

pub use binder::{FormDecodeError, FormValues, FromForm, PostForm};
pub use snippet::SnippetCreateForm;
pub use user::{LoginForm, PasswordUpdateForm, SignupForm};
pub use validator::Validator;
