//! Snippet creation form

use super::binder::{FormDecodeError, FormValues, FromForm};
use super::validator::{max_chars, not_blank, permitted_value, Validator};

/// Lifetimes, in days, a new snippet may be given
pub const PERMITTED_EXPIRES: [i64; 3] = [1, 7, 365];

/// Submission of `POST /snippet/create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetCreateForm {
    /// Snippet title
    pub title: String,
    /// Snippet body
    pub content: String,
    /// Days until the snippet expires
    pub expires: i64,
    /// Errors found by [`Self::validate`]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: 365,
            validator: Validator::new(),
        }
    }
}

impl SnippetCreateForm {
    /// Run the field rules, returning true when the form is valid
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank");
        v.check_field(
            permitted_value(&self.expires, &PERMITTED_EXPIRES),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v.valid()
    }

    /// Field values as submitted
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("content", self.content.clone()),
            ("expires", self.expires.to_string()),
        ]
    }
}

impl FromForm for SnippetCreateForm {
    fn from_form(values: &FormValues) -> Result<Self, FormDecodeError> {
        Ok(Self {
            title: values.required_str("title")?,
            content: values.required_str("content")?,
            expires: values.required_int("expires")?,
            validator: Validator::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::binder::encode_pairs;

    fn bind(body: &str) -> Result<SnippetCreateForm, FormDecodeError> {
        SnippetCreateForm::from_form(&FormValues::parse(body.as_bytes())?)
    }

    #[test]
    fn test_valid_submission() {
        let mut form = bind("title=O+snail&content=Climb+Mount+Fuji&expires=7").unwrap();
        assert_eq!(form.title, "O snail");
        assert!(form.validate());
    }

    #[test]
    fn test_permitted_expires_values() {
        for days in PERMITTED_EXPIRES {
            let mut form = bind(&format!("title=t&content=c&expires={days}")).unwrap();
            assert!(form.validate(), "{days} should be accepted");
        }
        for days in [0, 2, 30, 366, -1] {
            let mut form = bind(&format!("title=t&content=c&expires={days}")).unwrap();
            assert!(!form.validate(), "{days} should be rejected");
            assert_eq!(
                form.validator.field_error("expires"),
                Some("This field must equal 1, 7 or 365")
            );
        }
    }

    #[test]
    fn test_non_integer_expires_fails_to_bind() {
        let err = bind("title=t&content=c&expires=week").unwrap_err();
        assert!(matches!(err, FormDecodeError::InvalidValue { .. }));
    }

    #[test]
    fn test_blank_title_reports_blank_only() {
        let mut form = bind("title=+++&content=c&expires=1").unwrap();
        assert!(!form.validate());
        assert_eq!(form.validator.field_error("title"), Some("This field cannot be blank"));
        assert_eq!(form.validator.field_error("content"), None);
    }

    #[test]
    fn test_title_length_limit() {
        let mut ok = SnippetCreateForm {
            title: "x".repeat(100),
            content: "c".into(),
            ..SnippetCreateForm::default()
        };
        assert!(ok.validate());

        let mut long = SnippetCreateForm {
            title: "x".repeat(101),
            content: "c".into(),
            ..SnippetCreateForm::default()
        };
        assert!(!long.validate());
        assert_eq!(
            long.validator.field_error("title"),
            Some("This field cannot be more than 100 characters long")
        );
    }

    #[test]
    fn test_round_trip_through_body() {
        let form = SnippetCreateForm {
            title: "A & B".into(),
            content: "line one\nline two".into(),
            expires: 365,
            validator: Validator::new(),
        };
        let rebound = bind(&encode_pairs(&form.to_pairs())).unwrap();
        assert_eq!(rebound, form);
    }
}
