//! Metaphone reduction of a name to its approximate pronunciation.
//!
//! Non-letters are dropped first, so `py-yaml` and `pyyaml` encode identically.
//! `0` stands for "th" and `X` for "sh"/"ch".

const VOWELS: &[char] = &['A', 'E', 'I', 'O', 'U'];

fn is_vowel(c: Option<char>) -> bool {
  c.is_some_and(|c| VOWELS.contains(&c))
}

fn is_front_vowel(c: Option<char>) -> bool {
  matches!(c, Some('E' | 'I' | 'Y'))
}

pub fn metaphone(word: &str) -> String {
  let letters: Vec<char> = word
    .chars()
    .filter(|c| c.is_ascii_alphabetic())
    .map(|c| c.to_ascii_uppercase())
    .collect();
  if letters.is_empty() {
    return String::new();
  }

  let (mut chars, mut out) = initial_transform(&letters);
  if chars.is_empty() {
    return out;
  }

  // Adjacent duplicates collapse to one letter, except C.
  chars.dedup_by(|b, a| a == b && *a != 'C');

  let at = |i: isize| -> Option<char> {
    if i < 0 {
      None
    } else {
      chars.get(i as usize).copied()
    }
  };

  let len = chars.len() as isize;
  let mut i: isize = 0;
  while i < len {
    let c = chars[i as usize];
    let prev = at(i - 1);
    let next = at(i + 1);
    let after = at(i + 2);
    let mut skip = 0;

    match c {
      'A' | 'E' | 'I' | 'O' | 'U' => {
        if i == 0 && out.is_empty() {
          out.push(c);
        }
      }
      'B' => {
        if !(prev == Some('M') && i == len - 1) {
          out.push('B');
        }
      }
      'C' => {
        if next == Some('I') && after == Some('A') {
          out.push('X');
        } else if next == Some('H') {
          out.push(if prev == Some('S') { 'K' } else { 'X' });
          skip = 1;
        } else if is_front_vowel(next) {
          if prev != Some('S') {
            out.push('S');
          }
        } else {
          out.push('K');
        }
      }
      'D' => {
        if next == Some('G') && is_front_vowel(after) {
          out.push('J');
          skip = 2;
        } else {
          out.push('T');
        }
      }
      'G' => {
        let silent_gh = next == Some('H') && !(i + 2 >= len || is_vowel(after));
        let gned_ending = after == Some('E') && at(i + 3) == Some('D') && i + 4 == len;
        let silent_gn = next == Some('N') && (i + 2 == len || gned_ending);
        let after_d = prev == Some('D') && is_front_vowel(next);
        if silent_gh || silent_gn || after_d {
          // silent
        } else if is_front_vowel(next) && prev != Some('G') {
          out.push('J');
        } else {
          out.push('K');
        }
        if next == Some('H') && !silent_gh {
          skip = 1;
        }
      }
      'H' => {
        let after_modifier = matches!(prev, Some('C' | 'S' | 'P' | 'T' | 'G'));
        if is_vowel(next) && !after_modifier {
          out.push('H');
        }
      }
      'K' => {
        if prev != Some('C') {
          out.push('K');
        }
      }
      'P' => {
        if next == Some('H') {
          out.push('F');
          skip = 1;
        } else {
          out.push('P');
        }
      }
      'Q' => out.push('K'),
      'S' => {
        if next == Some('H') {
          out.push('X');
          skip = 1;
        } else if next == Some('I') && matches!(after, Some('O' | 'A')) {
          out.push('X');
        } else {
          out.push('S');
        }
      }
      'T' => {
        if next == Some('I') && matches!(after, Some('O' | 'A')) {
          out.push('X');
        } else if next == Some('H') {
          out.push('0');
          skip = 1;
        } else if !(next == Some('C') && after == Some('H')) {
          out.push('T');
        }
      }
      'V' => out.push('F'),
      'W' | 'Y' => {
        if is_vowel(next) {
          out.push(c);
        }
      }
      'X' => {
        out.push('K');
        out.push('S');
      }
      'Z' => out.push('S'),
      'F' | 'J' | 'L' | 'M' | 'N' | 'R' => out.push(c),
      _ => {}
    }

    i += 1 + skip;
  }

  out
}

/// Leading-letter exceptions: silent first letters, initial X and WH.
fn initial_transform(letters: &[char]) -> (Vec<char>, String) {
  let first = letters[0];
  let second = letters.get(1).copied();
  match (first, second) {
    ('A', Some('E')) => (letters[1..].to_vec(), "E".to_string()),
    ('G' | 'K' | 'P', Some('N')) => (letters[1..].to_vec(), String::new()),
    ('W', Some('R')) => (letters[1..].to_vec(), String::new()),
    ('X', _) => (letters[1..].to_vec(), "S".to_string()),
    ('W', Some('H')) => {
      let mut rest = vec!['W'];
      rest.extend_from_slice(&letters[2..]);
      (rest, String::new())
    }
    _ => (letters.to_vec(), String::new()),
  }
}
