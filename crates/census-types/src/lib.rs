//! Validated text primitives shared across the census workspace.

/// Rejections for census text that must carry a value.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("value cannot be blank")]
    Empty,
}

/// Trimmed, non-blank text: operator identifiers and worksheet titles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// A setting that may be unset or left blank in the environment, in which case `fallback`
    /// is used instead.
    pub fn or_fallback(value: Option<impl AsRef<str>>, fallback: &str) -> Result<Self, TextError> {
        match value.as_ref().map(|v| v.as_ref().trim()) {
            Some(v) if !v.is_empty() => Self::new(v),
            _ => Self::new(fallback),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A general-medicine service code such as `GM3`.
///
/// Operators usually type just the number, so construction goes through
/// [`ServiceCode::normalise`], which supplies the `GM` prefix when it is missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceCode(String);

impl ServiceCode {
    /// Prefix shared by every general-medicine service.
    pub const PREFIX: &'static str = "GM";

    /// Normalises operator input into a service code.
    ///
    /// The input is trimmed. If it already starts with `GM` (any case) the prefix is upper-cased,
    /// otherwise `GM` is prepended. Normalising an already-normalised code is a no-op.
    pub fn normalise(input: impl AsRef<str>) -> Self {
        let trimmed = input.as_ref().trim();
        match trimmed.get(..2) {
            Some(head) if head.eq_ignore_ascii_case(Self::PREFIX) => {
                Self(format!("{}{}", Self::PREFIX, &trimmed[2..]))
            }
            _ => Self(format!("{}{}", Self::PREFIX, trimmed)),
        }
    }

    /// Wraps a code exactly as stored, without normalisation.
    pub fn verbatim(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ServiceCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ServiceCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        let text = NonEmptyText::new("  GM ward  ").expect("should accept text");
        assert_eq!(text.as_str(), "GM ward");

        let err = NonEmptyText::new("   ").expect_err("blank text should be rejected");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn blank_settings_fall_back() {
        let title = NonEmptyText::or_fallback(Some("  Ward 3  "), "Census").expect("title");
        assert_eq!(title.as_str(), "Ward 3");

        let title = NonEmptyText::or_fallback(Some("   "), "Census").expect("title");
        assert_eq!(title.as_str(), "Census");

        let title = NonEmptyText::or_fallback(None::<String>, "Census").expect("title");
        assert_eq!(title.as_str(), "Census");

        assert!(matches!(
            NonEmptyText::or_fallback(None::<&str>, " "),
            Err(TextError::Empty)
        ));
    }

    #[test]
    fn service_code_prefixes_bare_numbers() {
        assert_eq!(ServiceCode::normalise("3").as_str(), "GM3");
        assert_eq!(ServiceCode::normalise(" 6 ").as_str(), "GM6");
    }

    #[test]
    fn service_code_upper_cases_existing_prefix() {
        assert_eq!(ServiceCode::normalise("gm4").as_str(), "GM4");
        assert_eq!(ServiceCode::normalise("Gm2").as_str(), "GM2");
    }

    #[test]
    fn service_code_normalisation_is_idempotent() {
        let once = ServiceCode::normalise("5");
        let twice = ServiceCode::normalise(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn service_code_handles_multibyte_input() {
        assert_eq!(ServiceCode::normalise("é").as_str(), "GMé");
    }
}
