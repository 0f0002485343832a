//! Account forms: signup, login and password change

use super::binder::{FormDecodeError, FormValues, FromForm};
use super::validator::{matches, min_chars, not_blank, Validator, EMAIL_RX};

/// Shortest password accepted at signup or on change
pub const MIN_PASSWORD_CHARS: usize = 8;

const BLANK: &str = "This field cannot be blank";

/// Submission of `POST /user/signup`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    /// Display name
    pub name: String,
    /// Login e-mail address
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Errors found by [`Self::validate`] or the signup handler
    pub validator: Validator,
}

impl SignupForm {
    /// Run the field rules, returning true when the form is valid
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(
            min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
        v.valid()
    }

    /// Field values as submitted
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("password", self.password.clone()),
        ]
    }
}

impl FromForm for SignupForm {
    fn from_form(values: &FormValues) -> Result<Self, FormDecodeError> {
        Ok(Self {
            name: values.required_str("name")?,
            email: values.required_str("email")?,
            password: values.required_str("password")?,
            validator: Validator::new(),
        })
    }
}

/// Submission of `POST /user/login`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Login e-mail address
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Errors found by [`Self::validate`] or the login handler
    pub validator: Validator,
}

impl LoginForm {
    /// Run the field rules, returning true when the form is valid
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.valid()
    }

    /// Field values as submitted
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone()), ("password", self.password.clone())]
    }
}

impl FromForm for LoginForm {
    fn from_form(values: &FormValues) -> Result<Self, FormDecodeError> {
        Ok(Self {
            email: values.required_str("email")?,
            password: values.required_str("password")?,
            validator: Validator::new(),
        })
    }
}

/// Submission of `POST /account/password/update`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordUpdateForm {
    /// Password the account has now
    pub current_password: String,
    /// Replacement password
    pub new_password: String,
    /// Replacement password, typed again
    pub new_password_confirmation: String,
    /// Errors found by [`Self::validate`] or the update handler
    pub validator: Validator,
}

impl PasswordUpdateForm {
    /// Run the field rules, returning true when the form is valid
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.current_password), "currentPassword", BLANK);
        v.check_field(not_blank(&self.new_password), "newPassword", BLANK);
        v.check_field(
            min_chars(&self.new_password, MIN_PASSWORD_CHARS),
            "newPassword",
            "This field must be at least 8 characters long",
        );
        v.check_field(
            not_blank(&self.new_password_confirmation),
            "newPasswordConfirmation",
            BLANK,
        );
        v.check_field(
            self.new_password == self.new_password_confirmation,
            "newPasswordConfirmation",
            "Passwords do not match",
        );
        v.valid()
    }

    /// Field values as submitted
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("currentPassword", self.current_password.clone()),
            ("newPassword", self.new_password.clone()),
            ("newPasswordConfirmation", self.new_password_confirmation.clone()),
        ]
    }
}

impl FromForm for PasswordUpdateForm {
    fn from_form(values: &FormValues) -> Result<Self, FormDecodeError> {
        Ok(Self {
            current_password: values.required_str("currentPassword")?,
            new_password: values.required_str("newPassword")?,
            new_password_confirmation: values.required_str("newPasswordConfirmation")?,
            validator: Validator::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::binder::encode_pairs;

    fn values(body: &str) -> FormValues {
        FormValues::parse(body.as_bytes()).unwrap()
    }

    #[test]
    fn test_signup_valid() {
        let mut form =
            SignupForm::from_form(&values("name=Alice&email=alice%40example.com&password=pa55word1"))
                .unwrap();
        assert!(form.validate());
    }

    #[test]
    fn test_signup_reports_each_field() {
        let mut form = SignupForm::from_form(&values("name=&email=nope&password=short")).unwrap();
        assert!(!form.validate());

        let v = &form.validator;
        assert_eq!(v.field_error("name"), Some(BLANK));
        assert_eq!(v.field_error("email"), Some("This field must be a valid email address"));
        assert_eq!(
            v.field_error("password"),
            Some("This field must be at least 8 characters long")
        );
    }

    #[test]
    fn test_signup_blank_email_reports_blank() {
        let mut form = SignupForm::from_form(&values("name=a&email=&password=longenough")).unwrap();
        assert!(!form.validate());
        assert_eq!(form.validator.field_error("email"), Some(BLANK));
    }

    #[test]
    fn test_signup_missing_field_fails_to_bind() {
        let err = SignupForm::from_form(&values("name=a&email=a%40b.c")).unwrap_err();
        assert!(matches!(err, FormDecodeError::MissingField(field) if field == "password"));
    }

    #[test]
    fn test_login_form_round_trip() {
        let form = LoginForm {
            email: "bob@example.com".into(),
            password: "p&ss w=rd".into(),
            validator: Validator::new(),
        };
        let rebound = LoginForm::from_form(&values(&encode_pairs(&form.to_pairs()))).unwrap();
        assert_eq!(rebound, form);
    }

    #[test]
    fn test_password_update_mismatch() {
        let mut form = PasswordUpdateForm {
            current_password: "oldpassword".into(),
            new_password: "newpassword".into(),
            new_password_confirmation: "newpassw0rd".into(),
            validator: Validator::new(),
        };
        assert!(!form.validate());
        assert_eq!(
            form.validator.field_error("newPasswordConfirmation"),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn test_password_update_binds_camel_case_fields() {
        let mut form = PasswordUpdateForm::from_form(&values(
            "currentPassword=oldpassword&newPassword=newpassword&newPasswordConfirmation=newpassword",
        ))
        .unwrap();
        assert!(form.validate());
        assert_eq!(form.new_password, "newpassword");
    }
}
