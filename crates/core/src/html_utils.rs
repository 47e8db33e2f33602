// ABOUTME: HTML utility functions for scraped text fragments.
// ABOUTME: Provides tag stripping, HTML entity decoding and whitespace collapsing.

/// Strips HTML tags from a string, returning plain text.
/// Tags are replaced by a space so adjacent inline fragments do not fuse.
pub fn strip_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => {
                in_tag = true;
                result.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    clean_text(&result)
}

/// Decodes entities, then collapses whitespace and trims.
pub fn clean_text(s: &str) -> String {
    collapse_whitespace(&decode_entities(s))
}

/// Decodes the HTML entities that show up in venue names and addresses.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = s.to_string();

    // `&amp;` goes last so "&amp;lt;" decodes once, to "&lt;".
    let entities = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&apos;", "'"),
        ("&#39;", "'"),
        ("&nbsp;", " "),
        ("&ndash;", "–"),
        ("&mdash;", "—"),
        ("&lsquo;", "'"),
        ("&rsquo;", "'"),
        ("&ldquo;", "\u{201C}"),
        ("&rdquo;", "\u{201D}"),
        ("&hellip;", "…"),
        ("&middot;", "·"),
        ("&deg;", "°"),
        ("&ordm;", "º"),
        ("&ordf;", "ª"),
        ("&aacute;", "á"),
        ("&eacute;", "é"),
        ("&iacute;", "í"),
        ("&oacute;", "ó"),
        ("&uacute;", "ú"),
        ("&Aacute;", "Á"),
        ("&Eacute;", "É"),
        ("&Iacute;", "Í"),
        ("&Oacute;", "Ó"),
        ("&Uacute;", "Ú"),
        ("&agrave;", "à"),
        ("&egrave;", "è"),
        ("&atilde;", "ã"),
        ("&otilde;", "õ"),
        ("&ntilde;", "ñ"),
        ("&Ntilde;", "Ñ"),
        ("&ccedil;", "ç"),
        ("&auml;", "ä"),
        ("&ouml;", "ö"),
        ("&uuml;", "ü"),
        ("&Auml;", "Ä"),
        ("&Ouml;", "Ö"),
        ("&Uuml;", "Ü"),
        ("&szlig;", "ß"),
    ];

    for (entity, replacement) in &entities {
        result = result.replace(entity, replacement);
    }

    result = decode_numeric_entities(&result);
    result.replace("&amp;", "&")
}

/// Decodes numeric HTML entities like &#123; and &#x7B;
fn decode_numeric_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '&' || chars.peek() != Some(&'#') {
            result.push(c);
            continue;
        }

        chars.next(); // '#'
        let is_hex = matches!(chars.peek(), Some('x') | Some('X'));
        if is_hex {
            chars.next();
        }

        let mut num_str = String::new();
        let mut terminated = false;
        while let Some(&nc) = chars.peek() {
            if nc == ';' {
                chars.next();
                terminated = true;
                break;
            }
            let accepted = if is_hex {
                nc.is_ascii_hexdigit()
            } else {
                nc.is_ascii_digit()
            };
            if !accepted {
                break;
            }
            num_str.push(nc);
            chars.next();
        }

        let code = if is_hex {
            u32::from_str_radix(&num_str, 16).ok()
        } else {
            num_str.parse::<u32>().ok()
        };

        match code.and_then(char::from_u32) {
            Some(decoded) => result.push(decoded),
            None => {
                result.push_str("&#");
                if is_hex {
                    result.push('x');
                }
                result.push_str(&num_str);
                if terminated {
                    result.push(';');
                }
            }
        }
    }

    result
}

/// Collapses runs of whitespace into single spaces and trims both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_basic() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(
            strip_html("<b>Bold</b> and <i>italic</i>"),
            "Bold and italic"
        );
        assert_eq!(strip_html("<h2>Onyx<br>Coffee</h2>"), "Onyx Coffee");
    }

    #[test]
    fn test_strip_html_with_entities() {
        assert_eq!(strip_html("<p>Toby&#8217;s &amp; Co</p>"), "Toby’s & Co");
    }

    #[test]
    fn test_decode_entities_named() {
        assert_eq!(decode_entities("&amp;"), "&");
        assert_eq!(decode_entities("&lt;&gt;"), "<>");
        assert_eq!(decode_entities("Bogot&aacute;"), "Bogotá");
        assert_eq!(decode_entities("&nbsp;"), " ");
    }

    #[test]
    fn test_decode_entities_does_not_double_decode() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_decode_entities_numeric() {
        assert_eq!(decode_entities("&#38;"), "&");
        assert_eq!(decode_entities("&#x26;"), "&");
        assert_eq!(decode_entities("S&#xE3;o Paulo"), "São Paulo");
        assert_eq!(decode_entities("&#zz;"), "&#zz;");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Lisbon \n\t Portugal "), "Lisbon Portugal");
        assert_eq!(collapse_whitespace(""), "");
    }
}
