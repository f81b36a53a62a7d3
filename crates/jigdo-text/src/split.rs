//! Word-splitting and quoting for entry values, mirroring the shell-style
//! tokenising the original `.jigdo` reader applies to `[Parts]`/`[Servers]`
//! values before the first word is treated as a URL and the rest as
//! `--try-first`/`--try-last` options.

/// Split `value` into whitespace-separated words, honouring `"`/`'`
/// quoting and `\`-escapes inside and outside quotes. An unquoted,
/// unescaped `#` terminates the value outright (spec.md §3 "A comment `#`
/// outside quotes terminates the value"), so nothing at or after it is
/// ever part of a returned word.
pub fn split_words(value: &str) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    let mut words = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() || chars[i] == '#' {
            break;
        }
        let (word, next) = split_one(&chars, i);
        words.push(word);
        i = next;
    }
    words
}

/// Parse a single word starting at `chars[start]`, returning the
/// unescaped word and the index just past its last character. Stops
/// early, without consuming it, at an unquoted `#`.
fn split_one(chars: &[char], mut i: usize) -> (String, usize) {
    let mut word = String::new();
    while i < chars.len() && !chars[i].is_whitespace() {
        match chars[i] {
            '#' => break,
            '"' | '\'' => {
                let quote = chars[i];
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    // `\` is only an escape character inside double quotes;
                    // single quotes take every character, including `\`,
                    // literally (spec.md §4.4 "`\` escapes... outside
                    // single quotes").
                    if quote == '"' && chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                    }
                    word.push(chars[i]);
                    i += 1;
                }
                if i < chars.len() {
                    i += 1; // skip closing quote
                }
            }
            '\\' if i + 1 < chars.len() => {
                word.push(chars[i + 1]);
                i += 2;
            }
            c => {
                word.push(c);
                i += 1;
            }
        }
    }
    (word, i)
}

/// Quote `word` for writing back into a `.jigdo` entry value, only if it
/// actually needs it (contains whitespace or a character with special
/// meaning to [`split_words`]).
pub fn quote(word: &str) -> String {
    let needs_quoting = word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '#'));
    if !needs_quoting {
        return word.to_string();
    }
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for c in word.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_whitespace() {
        assert_eq!(
            split_words("http://h/ --try-first"),
            vec!["http://h/".to_string(), "--try-first".to_string()]
        );
    }

    #[test]
    fn honours_double_quotes_with_embedded_space() {
        assert_eq!(
            split_words("\"a b\" c"),
            vec!["a b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn honours_backslash_escape_outside_quotes() {
        assert_eq!(split_words("a\\ b"), vec!["a b".to_string()]);
    }

    #[test]
    fn unquoted_hash_terminates_the_value() {
        assert_eq!(
            split_words("http://h/ --try-first # comment"),
            vec!["http://h/".to_string(), "--try-first".to_string()]
        );
        assert_eq!(split_words("abc#def"), vec!["abc".to_string()]);
        assert_eq!(split_words("# nothing but comment"), Vec::<String>::new());
    }

    #[test]
    fn quoted_hash_is_kept_literal() {
        assert_eq!(split_words("\"a#b\""), vec!["a#b".to_string()]);
    }

    #[test]
    fn backslash_is_literal_inside_single_quotes() {
        assert_eq!(split_words("'a\\b'"), vec!["a\\b".to_string()]);
    }

    #[test]
    fn backslash_still_escapes_inside_double_quotes() {
        assert_eq!(split_words("\"a\\\"b\""), vec!["a\"b".to_string()]);
    }

    #[test]
    fn quote_round_trips_through_split() {
        for raw in ["plain", "has space", "quote\"inside", "back\\slash", ""] {
            let quoted = quote(raw);
            let words = split_words(&quoted);
            assert_eq!(words.len(), 1, "quoting {raw:?} -> {quoted:?}");
            assert_eq!(words[0], raw);
        }
    }

    #[test]
    fn quote_leaves_simple_words_unquoted() {
        assert_eq!(quote("simple-word_1.2"), "simple-word_1.2");
    }
}
