// Tone-mark stripping for fallback dictionary keys.
//
// Orthographies for tonal languages mark tone with combining diacritics
// (grave, acute, circumflex, caron, macron) over vowels and syllabic
// nasals, either as combining code points or as precomposed letters.
// `detone` removes both spellings, is total (unknown characters pass
// through unchanged) and idempotent (its output contains no tone marks).

/// Combining marks used for tone in practical orthographies.
fn is_tone_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'   // grave
        | '\u{0301}' // acute
        | '\u{0302}' // circumflex
        | '\u{0304}' // macron
        | '\u{030C}' // caron
        | '\u{0340}' // legacy grave
        | '\u{0341}' // legacy acute
    )
}

/// Fold a precomposed tone-marked letter to its base letter.
/// Letters without a tone mark are returned unchanged.
fn fold_precomposed(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ā' | 'ǎ' => 'a',
        'è' | 'é' | 'ê' | 'ē' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ī' | 'ǐ' => 'i',
        'ò' | 'ó' | 'ô' | 'ō' | 'ǒ' => 'o',
        'ù' | 'ú' | 'û' | 'ū' | 'ǔ' => 'u',
        'ǹ' | 'ń' | 'ň' => 'n',
        'ỳ' | 'ý' | 'ŷ' => 'y',
        'À' | 'Á' | 'Â' | 'Ā' | 'Ǎ' => 'A',
        'È' | 'É' | 'Ê' | 'Ē' | 'Ě' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ī' | 'Ǐ' => 'I',
        'Ò' | 'Ó' | 'Ô' | 'Ō' | 'Ǒ' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ū' | 'Ǔ' => 'U',
        'Ǹ' | 'Ń' | 'Ň' => 'N',
        'Ỳ' | 'Ý' | 'Ŷ' => 'Y',
        other => other,
    }
}

/// Strip all tone marks from a form.
pub fn detone(form: &str) -> String {
    form.chars()
        .filter(|&c| !is_tone_mark(c))
        .map(fold_precomposed)
        .collect()
}
