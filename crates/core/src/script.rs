//! Unicode script classification used by the LRCX filter and the line splitter.

/// Hangul syllables and jamo.
pub fn is_hangul(c: char) -> bool {
    matches!(c, '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' | '\u{AC00}'..='\u{D7AF}')
}

/// Hiragana and katakana, which only occur in Japanese text.
pub fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

/// Han ideographs.
pub fn is_han(c: char) -> bool {
    matches!(
        c,
        '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}'
    )
}

/// Any character that wraps without word boundaries: Han, kana, Hangul,
/// CJK punctuation and fullwidth forms.
pub fn is_cjk(c: char) -> bool {
    is_han(c)
        || is_kana(c)
        || is_hangul(c)
        || matches!(c, '\u{3000}'..='\u{303F}' | '\u{FF00}'..='\u{FFEF}')
}

/// True when `text` carries Korean or Japanese-exclusive script.
pub fn has_korean_or_kana(text: &str) -> bool {
    text.chars().any(|c| is_hangul(c) || is_kana(c))
}

pub fn has_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_scripts() {
        assert!(has_korean_or_kana("사랑해"));
        assert!(has_korean_or_kana("ありがとう"));
        assert!(has_korean_or_kana("カタカナ"));
        assert!(!has_korean_or_kana("你好世界"));
        assert!(!has_korean_or_kana("hello"));
        assert!(has_cjk("你好"));
        assert!(has_cjk("。"));
        assert!(!has_cjk("plain latin, text."));
    }
}
