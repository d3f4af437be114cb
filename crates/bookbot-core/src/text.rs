/// Telegram HTML parse mode only recognizes a handful of entities, everything
/// else must be escaped.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Upper bound for one annotation page.
pub const MAX_CHUNK: usize = 2048;

const SENTENCE_ENDS: [char; 3] = ['.', '!', '?'];

/// Split `text` into ordered chunks of at most `max_chunk` characters,
/// preferring to break after the last sentence end in the window, then after
/// the last newline, then hard-cutting.
///
/// Concatenating the chunks reproduces the input exactly. The final chunk may
/// exceed `max_chunk` only in the degenerate case where the sole break
/// candidate sits at the window start and no forward progress is possible.
pub fn split_text(text: &str, max_chunk: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts: Vec<String> = Vec::new();
    let mut offset = 0usize;

    loop {
        if chars.len() - offset <= max_chunk {
            parts.push(chars[offset..].iter().collect());
            return parts;
        }

        let window = &chars[offset..offset + max_chunk];
        let break_at = window
            .iter()
            .rposition(|c| SENTENCE_ENDS.contains(c))
            .or_else(|| window.iter().rposition(|c| *c == '\n'));

        let end = match break_at {
            // The only break candidate is the window's first character;
            // advancing past it would find the same spot again next round.
            Some(0) => {
                parts.push(chars[offset..].iter().collect());
                return parts;
            }
            Some(i) => offset + i + 1,
            None => offset + max_chunk,
        };

        parts.push(chars[offset..end].iter().collect());
        offset = end;
    }
}

/// Catalog search treats `ё` and `е` as distinct; users rarely do.
pub fn normalize_query(input: &str) -> String {
    input.trim().replace('ё', "е").replace('Ё', "Е")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_one_empty_chunk() {
        assert_eq!(split_text("", MAX_CHUNK), vec![String::new()]);
    }

    #[test]
    fn short_input_is_one_chunk() {
        let text = "Одна короткая аннотация.";
        assert_eq!(split_text(text, MAX_CHUNK), vec![text.to_string()]);
    }

    #[test]
    fn concatenation_reproduces_input() {
        let mut text = String::new();
        for i in 0..400 {
            text.push_str(&format!("Предложение номер {i}. "));
        }
        let parts = split_text(&text, 100);
        assert!(parts.len() > 1);
        assert!(parts.iter().all(|p| p.chars().count() <= 100));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn breaks_after_last_sentence_end() {
        let parts = split_text("abc. def. ghij", 10);
        assert_eq!(parts, vec!["abc. def.", " ghij"]);
    }

    #[test]
    fn sentence_end_wins_over_later_newline() {
        let parts = split_text("ab.cd\nefgh", 8);
        assert_eq!(parts, vec!["ab.", "cd\nefgh"]);
    }

    #[test]
    fn falls_back_to_newline() {
        let parts = split_text("abcd\nefgh", 6);
        assert_eq!(parts, vec!["abcd\n", "efgh"]);
    }

    #[test]
    fn hard_cut_without_any_break() {
        let text = "x".repeat(25);
        let parts = split_text(&text, 10);
        assert_eq!(parts, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn exact_multiple_leaves_no_empty_tail() {
        let text = "z".repeat(30);
        let parts = split_text(&text, 10);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn break_at_window_start_flushes_remainder() {
        // First window breaks after "abcdefghi."; the next window starts
        // with "." and holds no other break, so the rest goes out whole.
        let tail = format!(".{}", "y".repeat(30));
        let text = format!("abcdefghi.{tail}");
        let parts = split_text(&text, 10);
        assert_eq!(parts, vec!["abcdefghi.".to_string(), tail]);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn cyrillic_is_counted_in_chars_not_bytes() {
        let text = "я".repeat(25);
        let parts = split_text(&text, 10);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 10));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn escape_html_replaces_markup_chars() {
        assert_eq!(
            escape_html(r#"<b>"War & Peace"</b>"#),
            "&lt;b&gt;&quot;War &amp; Peace&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn normalize_query_folds_yo() {
        assert_eq!(normalize_query(" Ёжик в тумане "), "Ежик в тумане");
    }
}
