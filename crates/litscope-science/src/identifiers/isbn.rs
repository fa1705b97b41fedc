use super::first_listed;

fn strip_isbn(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

fn check_isbn10(digits: &[u8]) -> bool {
    // digits[9] may be 10 (X)
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| (10 - i as u32) * d as u32)
        .sum();
    sum % 11 == 0
}

fn isbn13_sum(digits: &[u8]) -> u32 {
    digits
        .iter()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d as u32 } else { d as u32 * 3 })
        .sum()
}

fn isbn10_to_isbn13(digits10: &[u8]) -> String {
    let mut d13: Vec<u8> = vec![9, 7, 8];
    d13.extend_from_slice(&digits10[..9]);
    let check = (10 - (isbn13_sum(&d13) % 10)) % 10;
    d13.push(check as u8);
    d13.iter().map(|d| d.to_string()).collect()
}

/// The ISBN-13 digits of a checksum-valid ISBN-10 or ISBN-13.
pub fn to_isbn13(input: &str) -> Option<String> {
    let stripped = strip_isbn(input);

    match stripped.len() {
        13 => {
            let digits: Vec<u8> = stripped
                .chars()
                .map(|c| c.to_digit(10).map(|d| d as u8))
                .collect::<Option<_>>()?;
            (isbn13_sum(&digits) % 10 == 0).then_some(stripped)
        }
        10 => {
            let mut digits: Vec<u8> = Vec::with_capacity(10);
            for (i, c) in stripped.chars().enumerate() {
                match c {
                    'X' if i == 9 => digits.push(10),
                    c if c.is_ascii_digit() => digits.push(c as u8 - b'0'),
                    _ => return None,
                }
            }
            check_isbn10(&digits).then(|| isbn10_to_isbn13(&digits))
        }
        _ => None,
    }
}

/// First ISBN of a list; valid ISBNs become ISBN-13, others are kept trimmed.
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let first = first_listed(raw)?;
    Some(to_isbn13(first).unwrap_or_else(|| first.to_string()))
}
