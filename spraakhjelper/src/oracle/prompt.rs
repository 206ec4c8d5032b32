use askama::Template;
use serde_json::{Value, json};

/// Field the structured-output schema wraps the analysis array in.
pub const ANALYSIS_WRAPPER: &str = "sentences";

#[derive(Template)]
#[template(path = "split.txt")]
pub struct SplitPrompt<'a> {
    pub text: &'a str,
    pub native_language: &'a str,
}

#[derive(Template)]
#[template(path = "analyze.txt")]
pub struct AnalyzePrompt<'a> {
    pub native_language: &'a str,
    pub transfer_errors: Option<&'static str>,
    /// Whether examples show the array wrapped in an object, matching the schema.
    pub wrapped: bool,
}

impl<'a> AnalyzePrompt<'a> {
    pub fn new(native_language: &'a str, wrapped: bool) -> Self {
        AnalyzePrompt {
            native_language,
            transfer_errors: transfer_errors(native_language),
            wrapped,
        }
    }
}

#[derive(Template)]
#[template(path = "check.txt")]
pub struct CheckPrompt<'a> {
    pub sentence: &'a str,
    pub correct_sentence: &'a str,
    pub native_language: &'a str,
}

pub fn analysis_user_message(text: &str) -> String {
    format!("Tekst fra eleven: {text}")
}

const ARABIC: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Preteritum og perfektum i verbbøying
  • Substantivbøying, bl.a. bestemt og ubestemt form";

const PERSIAN: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • «Det»-setninger, der «det» er formelt subjekt
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Ord med mange konsonanter etter hverandre
  • Plassering av «ikke»
  • Substantivbøying, bl.a. bestemt og ubestemt form";

const KURMANJI: &str = "\
  • Bestemt artikkel
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • «Det»-setninger, der «det» er formelt subjekt
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Ord med mange konsonanter etter hverandre
  • Plassering av «ikke»";

const MANDARIN: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Ord med mange konsonanter etter hverandre
  • Substantivbøying
  • Verbbøying";

const POLISH: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Preteritum og perfektum i verbbøying
  • Pronomen
  • Substantivbøying, bl.a. bestemt og ubestemt form";

const PORTUGUESE: &str = "\
  • Bestemt artikkel
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Adjektiv: gradbøying og plassering
  • Konsonantene «s», «h» og «r»
  • Ubestemt artikkel (en, ett)
  • Nektelse
  • Sammensatte substantiv og spørresetninger";

const RUSSIAN_UKRAINIAN: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Ubestemt artikkel
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Preteritum og perfektum i verbbøying
  • Substantivbøying, bl.a. bestemt og ubestemt form";

const SOMALI: &str = "\
  • Bestemt artikkel
  • Konsonantene «p», «v» og «kj»
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Vokalen «y»
  • Kjønn på substantiv
  • Preposisjoner";

const SWAHILI: &str = "\
  • Adjektiv
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Diftonger
  • Ord med mange konsonanter etter hverandre
  • Pronomen
  • Substantiv- og verbbøying";

const THAI: &str = "\
  • Konsonantene «l» og «r»
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Ord med mange konsonanter etter hverandre
  • Krav om subjekt i setningen
  • Substantiv- og verbbøying";

const TIGRINYA: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • «Det»-setninger, der «det» er formelt subjekt
  • Norske vokaler, spesielt «u», «y» og «ø»
  • Ord med mange konsonanter etter hverandre
  • Preteritum og perfektum i verbbøying
  • Substantivbøying, bl.a. bestemt og ubestemt form";

const TURKISH: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Vokalen «y»
  • Ord med mange konsonanter etter hverandre
  • Pronomen
  • Substantivbøying, bl.a. bestemt og ubestemt form
  • Leddsetninger";

const VIETNAMESE: &str = "\
  • V2-regelen: verbet skal stå på andre plass i helsetninger
  • Konsonantene «f», «j», «w» og «z»
  • Passive setninger
  • Sammensatte substantiv
  • Lydene «kj», «sy» og «øy»
  • Substantivbøying, bl.a. bestemt og ubestemt form
  • Verbbøying i fortid";

/// Common transfer errors for learners with the given mother tongue.
pub fn transfer_errors(native_language: &str) -> Option<&'static str> {
    let errors = match native_language.trim().to_lowercase().as_str() {
        "arabisk" => ARABIC,
        "dari" | "farsi" | "persisk" => PERSIAN,
        "kurmandsji" | "kurdisk" => KURMANJI,
        "mandarin" | "kinesisk" => MANDARIN,
        "polsk" => POLISH,
        "portugisisk" => PORTUGUESE,
        "russisk" | "ukrainsk" => RUSSIAN_UKRAINIAN,
        "somali" => SOMALI,
        "swahili" => SWAHILI,
        "thai" => THAI,
        "tigrinja" => TIGRINYA,
        "tyrkisk" => TURKISH,
        "vietnamesisk" => VIETNAMESE,
        _ => return None,
    };
    Some(errors)
}

/// JSON schema for backends with constrained decoding.
pub fn analysis_schema(native_language: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            ANALYSIS_WRAPPER: {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "bruker_setning": {
                            "type": "string",
                            "description": "Den opprinnelige setningen slik eleven skrev den."
                        },
                        "riktig_setning": {
                            "type": "string",
                            "description": "Setningen omskrevet korrekt."
                        },
                        "forklaring": {
                            "type": "string",
                            "description": "Punktvis forklaring på norsk av hva som er galt og hvorfor."
                        },
                        "forklaring_morsmaal": {
                            "type": "string",
                            "description": format!("Forklaringen oversatt til {native_language}.")
                        },
                        "setning_status": {
                            "type": "string",
                            "enum": ["riktig", "feil"],
                            "description": "Status 'riktig' hvis setningen er korrekt (se bort fra tegnsetting)."
                        }
                    },
                    "required": ["bruker_setning", "riktig_setning", "forklaring", "forklaring_morsmaal", "setning_status"],
                    "additionalProperties": false
                }
            }
        },
        "required": [ANALYSIS_WRAPPER],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_prompt_embeds_text_and_language() {
        let prompt = SplitPrompt {
            text: "jeg heter ole jeg er fra norge",
            native_language: "polsk",
        }
        .render()
        .unwrap();
        assert!(prompt.contains("polsk som morsmål"));
        assert!(prompt.contains("Tekst: jeg heter ole jeg er fra norge"));
    }

    #[test]
    fn analyze_prompt_lists_transfer_errors_for_known_language() {
        let prompt = AnalyzePrompt::new("polsk", false).render().unwrap();
        assert!(prompt.contains("##Vanlige overføringsfeil fra polsk"));
        assert!(prompt.contains("Pronomen"));
        assert!(!prompt.contains("\"sentences\""));
    }

    #[test]
    fn analyze_prompt_omits_transfer_errors_for_unknown_language() {
        let prompt = AnalyzePrompt::new("esperanto", true).render().unwrap();
        assert!(!prompt.contains("overføringsfeil fra"));
        assert!(!prompt.contains("(se listen under)"));
        assert!(prompt.contains("\"sentences\""));
    }

    #[test]
    fn analyze_prompt_is_deterministic() {
        let a = AnalyzePrompt::new("somali", false).render().unwrap();
        let b = AnalyzePrompt::new("somali", false).render().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn check_prompt_quotes_both_sentences() {
        let prompt = CheckPrompt {
            sentence: "Hun går til skole.",
            correct_sentence: "Hun går til skolen.",
            native_language: "arabisk",
        }
        .render()
        .unwrap();
        assert!(prompt.contains("Elevens setning: \"Hun går til skole.\""));
        assert!(prompt.contains("Korrekt setning: \"Hun går til skolen.\""));
    }

    #[test]
    fn aliases_share_transfer_errors() {
        assert_eq!(transfer_errors("farsi"), transfer_errors("dari"));
        assert_eq!(transfer_errors("Ukrainsk"), transfer_errors("russisk"));
        assert!(transfer_errors("norsk").is_none());
    }

    #[test]
    fn schema_wraps_array_in_named_field() {
        let schema = analysis_schema("thai");
        assert_eq!(schema["required"][0], ANALYSIS_WRAPPER);
        assert_eq!(schema["properties"][ANALYSIS_WRAPPER]["type"], "array");
    }
}
