use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Mother tongues offered to learners. Codes are the Norwegian language names.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "arabisk", name: "Arabisk" },
    Language { code: "dari", name: "Dari" },
    Language { code: "farsi", name: "Farsi/Persisk" },
    Language { code: "kurmandsji", name: "Kurmandsji (Kurdisk)" },
    Language { code: "mandarin", name: "Mandarin (Kinesisk)" },
    Language { code: "polsk", name: "Polsk" },
    Language { code: "portugisisk", name: "Portugisisk" },
    Language { code: "russisk", name: "Russisk" },
    Language { code: "ukrainsk", name: "Ukrainsk" },
    Language { code: "somali", name: "Somali" },
    Language { code: "swahili", name: "Swahili" },
    Language { code: "thai", name: "Thai" },
    Language { code: "tigrinja", name: "Tigrinja" },
    Language { code: "tyrkisk", name: "Tyrkisk" },
    Language { code: "vietnamesisk", name: "Vietnamesisk" },
];

pub fn find_language(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES.iter().find(|lang| lang.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_by_code() {
        assert_eq!(find_language("polsk").map(|l| l.name), Some("Polsk"));
        assert!(find_language("klingon").is_none());
    }
}
