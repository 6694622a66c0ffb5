//! Letter-by-letter and phonics renderings of a word, with SSML pauses
//! between the spoken units.

use crate::error::SpellError;

/// Pause placed between letters when spelling out a word.
pub const LETTER_PAUSE_MS: u32 = 500;

/// Pause placed between phoneme tokens.
pub const PHONEME_PAUSE_MS: u32 = 300;

/// SSML break of the given length, e.g. `<break time='0.5s'/>`.
pub fn pause(millis: u32) -> String {
    format!("<break time='{}s'/>", millis as f64 / 1000.0)
}

/// Phonics sound for a single Latin letter. Uppercase letters are folded to
/// lowercase; anything else is rejected.
pub fn letter_to_phoneme(letter: char) -> Result<&'static str, SpellError> {
    let phoneme = match letter.to_ascii_lowercase() {
        'a' => "ah",
        'b' => "buh",
        'c' => "cuh",
        'd' => "duh",
        'e' => "eh",
        'f' => "fuh",
        'g' => "guh",
        'h' => "huh",
        'i' => "eeh",
        'j' => "jawh",
        'k' => "cuh",
        'l' => "ul",
        'm' => "mmm",
        'n' => "uhn",
        'o' => "ohh",
        'p' => "pppuh",
        'q' => "koo",
        'r' => "err",
        's' => "sshh",
        't' => "ttuh",
        'u' => "uh",
        'v' => "vvvooh",
        'w' => "wuh",
        'x' => "kusssshhh",
        'y' => "yuh",
        'z' => "zzizz",
        _ => return Err(SpellError::UnsupportedLetter(letter)),
    };
    Ok(phoneme)
}

/// The word's characters, separated by letter pauses.
pub fn spell_letters(word: &str) -> String {
    let separator = pause(LETTER_PAUSE_MS);
    word.chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(separator.as_str())
}

/// The phoneme of every letter, separated by phoneme pauses.
pub fn spell_phonetic(word: &str) -> Result<String, SpellError> {
    let tokens = word
        .chars()
        .map(letter_to_phoneme)
        .collect::<Result<Vec<_>, _>>()?;
    let separator = format!(" {} ", pause(PHONEME_PAUSE_MS));
    Ok(tokens.join(separator.as_str()))
}

/// Removes SSML tags so speech can be shown as plain text.
pub fn strip_markup(speech: &str) -> String {
    let mut plain = String::with_capacity(speech.len());
    let mut in_tag = false;
    for c in speech.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                plain.push(' ');
            }
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}
