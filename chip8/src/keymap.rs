use anyhow::{bail, Result};

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// This original layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
pub fn keymap(key: char) -> Option<u8> {
    match key.to_ascii_uppercase() {
        'X' => Some(0x0),
        '1' => Some(0x1),
        '2' => Some(0x2),
        '3' => Some(0x3),
        'Q' => Some(0x4),
        'W' => Some(0x5),
        'E' => Some(0x6),
        'A' => Some(0x7),
        'S' => Some(0x8),
        'D' => Some(0x9),
        'Z' => Some(0xA),
        'C' => Some(0xB),
        '4' => Some(0xC),
        'R' => Some(0xD),
        'F' => Some(0xE),
        'V' => Some(0xF),
        _ => None,
    }
}

/// Maps a string of typed keys onto keypad keys, ignoring whitespace and commas
pub fn parse_keys(keys: &str) -> Result<Vec<u8>> {
    let mut mapped = Vec::with_capacity(keys.len());
    for key in keys.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        match keymap(key) {
            Some(k) => mapped.push(k),
            None => bail!("'{}' is not on the keypad", key),
        }
    }
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_covers_keypad() {
        let mut keys: Vec<u8> = "1234qwerasdfzxcv".chars().filter_map(keymap).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0x0..=0xF).collect::<Vec<u8>>());
    }

    #[test]
    fn test_keymap_ignores_case() {
        assert_eq!(keymap('v'), Some(0xF));
        assert_eq!(keymap('V'), Some(0xF));
        assert_eq!(keymap('5'), None);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(parse_keys("x, 1 4").unwrap(), vec![0x0, 0x1, 0xC]);
        assert!(parse_keys("").unwrap().is_empty());
        assert!(parse_keys("qp").is_err());
    }
}
