//! Builds a safe attachment filename from book metadata. Telegram rejects
//! documents whose names carry certain punctuation, and Cyrillic names render
//! poorly on some clients, so everything is romanized.

const STRIPPED: [char; 13] = [
    '(', ')', ',', '…', '.', '’', '!', '"', '?', '»', '«', '\'', ':',
];

/// `authors` are pre-shortened display names; they end up joined by
/// underscores with a `_-_` separator before the title.
pub fn book_filename(authors: &[String], title: &str, file_type: &str) -> String {
    let mut stem = String::new();
    if !authors.is_empty() {
        stem.push_str(&authors.join("_"));
        stem.push_str("_-_");
    }
    stem.push_str(title.strip_suffix(' ').unwrap_or(title));

    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if STRIPPED.contains(&c) {
            continue;
        }
        match c {
            '—' | '–' => out.push('-'),
            '/' => out.push('_'),
            '№' => out.push('N'),
            ' ' | '\u{a0}' => out.push('_'),
            'á' => out.push('a'),
            other => transliterate_into(other, &mut out),
        }
    }

    out.push('.');
    out.push_str(file_type);
    out
}

fn transliterate_into(c: char, out: &mut String) {
    let lower = c.is_lowercase();
    let mapped: &str = match c.to_lowercase().next().unwrap_or(c) {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => {
            out.push(c);
            return;
        }
    };

    if lower || mapped.is_empty() {
        out.push_str(mapped);
        return;
    }

    // Capitalize only the first letter of multi-char mappings (Щ -> Shch).
    let mut chars = mapped.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_authors_and_title() {
        let authors = vec!["Толстой Лев".to_string()];
        assert_eq!(
            book_filename(&authors, "Война и мир", "fb2"),
            "Tolstoy_Lev_-_Voyna_i_mir.fb2"
        );
    }

    #[test]
    fn multiple_authors_are_underscore_joined() {
        let authors = vec!["Ильф И".to_string(), "Петров Е".to_string()];
        assert_eq!(
            book_filename(&authors, "Двенадцать стульев", "epub"),
            "Ilf_I_Petrov_E_-_Dvenadtsat_stulev.epub"
        );
    }

    #[test]
    fn no_authors_means_bare_title() {
        assert_eq!(book_filename(&[], "Азбука", "mobi"), "Azbuka.mobi");
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(
            book_filename(&[], "Кто виноват?", "fb2"),
            "Kto_vinovat.fb2"
        );
        assert_eq!(book_filename(&[], "П.С.С.", "fb2"), "PSS.fb2");
    }

    #[test]
    fn replacements_apply() {
        assert_eq!(book_filename(&[], "Палата № 6", "fb2"), "Palata_N_6.fb2");
        assert_eq!(
            book_filename(&[], "Война — и мир/том 1", "fb2"),
            "Voyna_-_i_mir_tom_1.fb2"
        );
    }

    #[test]
    fn single_trailing_space_is_dropped() {
        assert_eq!(book_filename(&[], "Рассказ ", "fb2"), "Rasskaz.fb2");
    }

    #[test]
    fn latin_titles_pass_through() {
        assert_eq!(
            book_filename(&[], "The Time Machine", "epub"),
            "The_Time_Machine.epub"
        );
    }
}
