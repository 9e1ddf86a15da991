//! Request validation with translated messages.

use std::sync::Arc;

use agora_common::{AppError, AppResult, FieldError};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::i18n::Translator;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-z0-9+#\-.]{1,35}$").unwrap()
});

/// `validator` custom rule for tag slugs.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// `validator` custom rule for lists of tag slugs.
pub fn validate_slugs(slugs: &[String]) -> Result<(), ValidationError> {
    slugs.iter().try_for_each(|s| validate_slug(s))
}

/// Validates request bodies and reports every failing field at once.
#[derive(Debug, Clone)]
pub struct Validator {
    translator: Arc<Translator>,
}

impl Validator {
    #[must_use]
    pub const fn new(translator: Arc<Translator>) -> Self {
        Self { translator }
    }

    /// Validate `value`, translating messages into `language`.
    pub fn check<T: Validate>(&self, value: &T, language: &str) -> AppResult<()> {
        value
            .validate()
            .map_err(|errors| AppError::Validation(self.field_errors(&errors, language)))
    }

    /// Flatten validation errors into translated field errors, sorted by field.
    #[must_use]
    pub fn field_errors(&self, errors: &ValidationErrors, language: &str) -> Vec<FieldError> {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                errs.first()
                    .map(|err| FieldError::new(field.to_string(), self.message(err, language)))
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields
    }

    fn message(&self, err: &ValidationError, language: &str) -> String {
        let key = match err.code.as_ref() {
            "required" => "validation.required",
            "length" => "validation.length",
            "range" => "validation.range",
            "email" => "validation.email",
            "url" => "validation.url",
            "slug" => "validation.slug",
            _ => "validation.invalid",
        };
        self.translator.tr(language, key)
    }
}
