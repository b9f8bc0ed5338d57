//! Narration cleanup shared by the table and line parsers

/// Generic narration fragments that carry no description on their own:
/// `TO TRF.`, `BY TRF.`, `UPI RRN…`, `RRN 123…`, bare digits and bare punctuation.
pub fn is_noise_line(line: &str) -> bool {
    let u = line.trim().to_uppercase();
    if u.is_empty() {
        return true;
    }
    let words: Vec<&str> = u.split_whitespace().collect();
    let transfer_stub = words.len() == 2
        && (words[0] == "TO" || words[0] == "BY")
        && words[1].trim_end_matches('.') == "TRF";
    let rrn = u.starts_with("UPI RRN")
        || (words.len() >= 2
            && words[0] == "RRN"
            && words[1].starts_with(|c: char| c.is_ascii_digit()));
    let digits_only = u.chars().all(|c| c.is_ascii_digit());
    let punctuation_only = u.chars().all(|c| !c.is_alphanumeric());
    transfer_stub || rrn || digits_only || punctuation_only
}

/// Join narration fragments, dropping noise and collapsing whitespace.
/// Keeps the raw fragments when everything was noise.
pub fn merge_description<S: AsRef<str>>(lines: &[S]) -> String {
    let kept: Vec<&str> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect();
    let meaningful: Vec<&str> = kept.iter().copied().filter(|l| !is_noise_line(l)).collect();
    let chosen = if meaningful.is_empty() { kept } else { meaningful };
    collapse_whitespace(&chosen.join(" "))
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TO TRF.", true)]
    #[case("by trf", true)]
    #[case("UPI RRN 412345678901", true)]
    #[case("RRN 412345678901", true)]
    #[case("4123456", true)]
    #[case("-- / --", true)]
    #[case("TRF TO RAVI KUMAR", false)]
    #[case("RRNX PAYMENTS", false)]
    #[case("UPI/SWIGGY/1234567890/DR", false)]
    fn test_noise(#[case] line: &str, #[case] noise: bool) {
        assert_eq!(is_noise_line(line), noise, "{line}");
    }

    #[test]
    fn test_merge_drops_noise() {
        let merged = merge_description(&["NEFT DR-HDFC0001", "TO TRF.", "  RAVI   KUMAR ", "123456"]);
        assert_eq!(merged, "NEFT DR-HDFC0001 RAVI KUMAR");
    }

    #[test]
    fn test_merge_keeps_something() {
        assert_eq!(merge_description(&["TO TRF."]), "TO TRF.");
        assert_eq!(merge_description::<&str>(&[]), "");
    }
}
