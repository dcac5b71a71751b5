//! Deterministic usernames derived from customer ids.
//!
//! Each decimal digit maps to a two-letter syllable; ids shorter than
//! [`MIN_DIGITS`] are left-padded with zeros, so id 0 becomes `BABABABA`.

const SYLLABLES: [&str; 10] = ["BA", "OG", "AL", "RI", "RE", "SE", "AT", "UL", "IN", "NG"];

pub const MIN_DIGITS: usize = 4;

pub fn username_for(id: u64) -> String {
    let digits = format!("{id:0width$}", width = MIN_DIGITS);
    digits
        .bytes()
        .map(|b| SYLLABLES[usize::from(b - b'0')])
        .collect()
}

pub fn password_for(username: &str) -> String {
    username.to_lowercase()
}
