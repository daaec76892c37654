/// Display language setting. Only two values exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Locale {
    #[default]
    En,
    Am,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Am => "am",
        }
    }

    /// Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "am" => Self::Am,
            _ => Self::En,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Am,
            Self::Am => Self::En,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_between_the_two_languages() {
        assert_eq!(Locale::En.toggled(), Locale::Am);
        assert_eq!(Locale::Am.toggled().toggled(), Locale::Am);
    }

    #[test]
    fn unknown_codes_default_to_english() {
        assert_eq!(Locale::from_code("am"), Locale::Am);
        assert_eq!(Locale::from_code("fr"), Locale::En);
    }
}
