//! Visible-text extraction from HTML.
//!
//! This is not a full HTML parser. It walks the markup once, drops tags,
//! comments and `<script>`/`<style>` bodies, decodes the entities a Spanish
//! page realistically uses and collapses whitespace. Tags contribute no
//! characters, the same as concatenating a DOM's text nodes.

/// Returns the visible text of an HTML document.
#[must_use]
pub fn extract_text(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len() / 2);
    let mut i = 0;

    while i < html.len() {
        match bytes[i] {
            b'<' if starts_markup(&bytes[i + 1..]) => {
                let rest = &lower[i..];
                let skip = if rest.starts_with("<!--") {
                    rest[4..].find("-->").map(|end| 4 + end + 3)
                } else if let Some(tag) = raw_text_tag(rest) {
                    skip_raw_text(rest, tag)
                } else {
                    rest.find('>').map(|end| end + 1)
                };
                match skip {
                    Some(len) => i += len,
                    // Unterminated markup runs to the end of the document.
                    None => break,
                }
            }
            b'&' => match decode_entity(&html[i..]) {
                Some((ch, len)) => {
                    out.push(ch);
                    i += len;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            },
            _ => {
                let Some(ch) = html[i..].chars().next() else {
                    break;
                };
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }

    collapse_whitespace(&out)
}

/// Collapse runs of whitespace into a single space and trim.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

// `<` only opens markup when followed by a tag name, `/`, `!` or `?`.
fn starts_markup(after: &[u8]) -> bool {
    matches!(after.first().copied(), Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

fn raw_text_tag(rest: &str) -> Option<&'static str> {
    ["script", "style"].into_iter().find(|tag| {
        rest[1..].starts_with(tag)
            && matches!(
                rest.as_bytes().get(1 + tag.len()).copied(),
                Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r')
            )
    })
}

fn skip_raw_text(rest: &str, tag: &str) -> Option<usize> {
    let close = format!("</{tag}");
    let close_at = rest.find(&close)?;
    let end = rest[close_at..].find('>')?;
    Some(close_at + end + 1)
}

fn decode_entity(s: &str) -> Option<(char, usize)> {
    let semi = s.bytes().take(12).position(|b| b == b';')?;
    let name = s.get(1..semi)?;
    let ch = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        named_entity(name)?
    };
    Some((ch, semi + 1))
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "aacute" => 'á',
        "eacute" => 'é',
        "iacute" => 'í',
        "oacute" => 'ó',
        "uacute" => 'ú',
        "Aacute" => 'Á',
        "Eacute" => 'É',
        "Iacute" => 'Í',
        "Oacute" => 'Ó',
        "Uacute" => 'Ú',
        "ntilde" => 'ñ',
        "Ntilde" => 'Ñ',
        "uuml" => 'ü',
        "Uuml" => 'Ü',
        "iexcl" => '¡',
        "iquest" => '¿',
        "ordm" => 'º',
        "ordf" => 'ª',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_without_inserting_separators() {
        let html = "<p>Turnos <b>enfermos</b></p><div>x</div>";
        assert_eq!(extract_text(html), "Turnos enfermosx");
    }

    #[test]
    fn drops_script_style_and_comments() {
        let html = r#"<html><head><style>p { color: red }</style>
            <script type="text/javascript">var s = "turnos enfermos mayores de 18 años";</script>
            </head><body><!-- turnos enfermos menores de 17 años --><h1>Inicio</h1></body></html>"#;
        assert_eq!(extract_text(html), "Inicio");
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(extract_text("a&ntilde;os"), "años");
        assert_eq!(extract_text("a&#241;os a&#xF1;os"), "años años");
        assert_eq!(extract_text("Tom&amp;Jerry&nbsp;&lt;3"), "Tom&Jerry <3");
    }

    #[test]
    fn leaves_unknown_entities_and_bare_angle_brackets() {
        assert_eq!(extract_text("a &bogus; b"), "a &bogus; b");
        assert_eq!(extract_text("3 < 4 y 5 > 2"), "3 < 4 y 5 > 2");
        assert_eq!(extract_text("R&D"), "R&D");
    }

    #[test]
    fn collapses_whitespace_and_keeps_utf8() {
        let html = "<td>\n  Mayores   de\n18 años </td>";
        assert_eq!(extract_text(html), "Mayores de 18 años");
    }

    #[test]
    fn unterminated_tag_ends_the_text() {
        assert_eq!(extract_text("visible <div class=\"x"), "visible");
    }
}
