// ============================================================================
// Annonces : décodage et découpage du texte brut
// ============================================================================
// Le flux d'annonces renvoie un texte où :
// - les caractères sont parfois encodés en références numériques
//   ("&#20844;" ou "&20844;")
// - chaque annonce commence par un numéro suivi d'un point ("1.", "2.")
// ============================================================================

/// Remplace les références numériques par le caractère correspondant
///
/// Seules les formes `&#NNN;` et `&NNN;` sont décodées ; une référence dont
/// le code n'est pas un caractère Unicode valide est laissée telle quelle,
/// comme tout le reste du texte.
pub fn decode_entities(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        output.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        match parse_reference(candidate) {
            Some((ch, consumed)) => {
                output.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Lit une référence au début de `input` (qui commence par '&')
///
/// Retourne le caractère décodé et le nombre d'octets consommés.
fn parse_reference(input: &str) -> Option<(char, usize)> {
    let body = input.strip_prefix('&')?;
    let (body, prefix_len) = match body.strip_prefix('#') {
        Some(stripped) => (stripped, 2),
        None => (body, 1),
    };

    let digits = body.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || !body[digits..].starts_with(';') {
        return None;
    }

    let code: u32 = body[..digits].parse().ok()?;
    let ch = char::from_u32(code)?;
    Some((ch, prefix_len + digits + 1))
}

/// Découpe le texte sur chaque marqueur "<chiffres>." et retire les morceaux vides
pub fn split_sections(input: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if !c.is_ascii_digit() {
            current.push(c);
            continue;
        }

        let mut digits = String::from(c);
        while let Some(&next) = chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            digits.push(next);
            chars.next();
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            sections.push(std::mem::take(&mut current));
        } else {
            current.push_str(&digits);
        }
    }
    sections.push(current);

    sections
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Décode puis découpe le texte brut du flux
pub fn parse_announcements(raw: &str) -> Vec<String> {
    split_sections(&decode_entities(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_both_reference_forms() {
        assert_eq!(decode_entities("&#72;&#105;"), "Hi");
        assert_eq!(decode_entities("&72;&105;!"), "Hi!");
        assert_eq!(decode_entities("&#20844;&#21578;"), "公告");
    }

    #[test]
    fn test_decode_leaves_other_text() {
        assert_eq!(decode_entities("a & b; c"), "a & b; c");
        assert_eq!(decode_entities("&amp;"), "&amp;");
        assert_eq!(decode_entities("&#;"), "&#;");
        assert_eq!(decode_entities("tail &"), "tail &");
    }

    #[test]
    fn test_split_sections() {
        assert_eq!(split_sections("1.foo 2.bar"), vec!["foo", "bar"]);
        assert_eq!(split_sections("  1. 2.seul"), vec!["seul"]);
        assert_eq!(split_sections("sans numéro 42"), vec!["sans numéro 42"]);
    }

    #[test]
    fn test_parse_announcements() {
        let raw = "1.&#72;&#105; 2.&#79;&#75;";
        assert_eq!(parse_announcements(raw), vec!["Hi", "OK"]);
    }
}
