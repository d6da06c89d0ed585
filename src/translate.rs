//! Prompts for TranslateGemma-style translation models.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

const LANGUAGES: &[Language] = &[
    Language { code: "ar", name: "Arabic" },
    Language { code: "cs", name: "Czech" },
    Language { code: "da", name: "Danish" },
    Language { code: "de", name: "German" },
    Language { code: "el", name: "Greek" },
    Language { code: "en", name: "English" },
    Language { code: "es", name: "Spanish" },
    Language { code: "fi", name: "Finnish" },
    Language { code: "fr", name: "French" },
    Language { code: "he", name: "Hebrew" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "hu", name: "Hungarian" },
    Language { code: "id", name: "Indonesian" },
    Language { code: "it", name: "Italian" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "nl", name: "Dutch" },
    Language { code: "no", name: "Norwegian" },
    Language { code: "pl", name: "Polish" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "ro", name: "Romanian" },
    Language { code: "ru", name: "Russian" },
    Language { code: "sv", name: "Swedish" },
    Language { code: "th", name: "Thai" },
    Language { code: "tr", name: "Turkish" },
    Language { code: "uk", name: "Ukrainian" },
    Language { code: "vi", name: "Vietnamese" },
    Language { code: "zh", name: "Chinese" },
];

/// Look up an ISO 639-1 code, ignoring case.
pub fn language(code: &str) -> Result<Language> {
    let code = code.trim();
    LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(code))
        .copied()
        .ok_or_else(|| Error::UnknownLanguage(code.to_string()))
}

pub fn translation_prompt(source: Language, target: Language, text: &str) -> String {
    let (s, t) = (source.name, target.name);
    format!(
        "You are a professional {s} ({sc}) to {t} ({tc}) translator.\n\
         Your goal is to accurately convey the meaning and nuances of the original\n\
         {s} text while adhering to {t} grammar, vocabulary, and cultural\n\
         sensitivities. Produce only the {t} translation, without any additional\n\
         explanations or commentary. Please translate the following {s} text into\n\
         {t}:\n\
         \n\
         \n\
         {text}\n",
        sc = source.code,
        tc = target.code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_to_spanish_prompt() {
        let prompt = translation_prompt(
            language("en").unwrap(),
            language("es").unwrap(),
            "Hello, how are you?",
        );
        let expected = "You are a professional English (en) to Spanish (es) translator.
Your goal is to accurately convey the meaning and nuances of the original
English text while adhering to Spanish grammar, vocabulary, and cultural
sensitivities. Produce only the Spanish translation, without any additional
explanations or commentary. Please translate the following English text into
Spanish:


Hello, how are you?
";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(language("FR").unwrap().name, "French");
        assert_eq!(language(" de ").unwrap().name, "German");
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = language("xx").unwrap_err();
        assert!(matches!(err, Error::UnknownLanguage(c) if c == "xx"));
    }

    #[test]
    fn multiline_text_is_kept_verbatim() {
        let prompt = translation_prompt(
            language("en").unwrap(),
            language("ja").unwrap(),
            "Line one.\nLine two.",
        );
        assert!(prompt.ends_with("Japanese:\n\n\nLine one.\nLine two.\n"));
    }
}
