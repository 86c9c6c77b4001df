//! Source key derivation from field paths.
//!
//! A field path like `["database", "max_conns"]` becomes `DATABASE_MAX_CONNS`
//! for the environment and `database-max-conns` for flags. Each source owns a
//! [`NamingPolicy`]; an explicit override name on a field skips the policy.

/// Splits one path segment into lowercase words.
pub type Tokenizer = fn(&str) -> Vec<String>;

/// Case applied to a derived key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    Upper,
    Lower,
    #[default]
    Preserve,
}

impl KeyCase {
    fn apply(self, key: String) -> String {
        match self {
            KeyCase::Upper => key.to_uppercase(),
            KeyCase::Lower => key.to_lowercase(),
            KeyCase::Preserve => key,
        }
    }
}

/// Per-source rules for turning a field path into a key.
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    pub delimiter: String,
    pub prefix: Option<String>,
    pub case: KeyCase,
    pub tokenizer: Tokenizer,
}

impl NamingPolicy {
    /// `UPPER_SNAKE` keys, no prefix.
    pub fn env() -> Self {
        Self {
            delimiter: "_".to_string(),
            prefix: None,
            case: KeyCase::Upper,
            tokenizer: split_segment,
        }
    }

    /// `lower-kebab` keys, no prefix.
    pub fn flags() -> Self {
        Self {
            delimiter: "-".to_string(),
            prefix: None,
            case: KeyCase::Lower,
            tokenizer: split_segment,
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the prefix; an empty prefix clears it.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn with_case(mut self, case: KeyCase) -> Self {
        self.case = case;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Derive the key for a field path. See [`resolve_key`].
    pub fn key<S: AsRef<str>>(&self, path: &[S], name_override: Option<&str>) -> String {
        resolve_key(path, self, name_override)
    }
}

/// Derive a source key for `path` under `policy`.
///
/// A non-empty `name_override` is returned unchanged. Otherwise the tokens of
/// every segment are joined with the delimiter, the prefix is prepended and
/// the policy's case is applied.
pub fn resolve_key<S: AsRef<str>>(
    path: &[S],
    policy: &NamingPolicy,
    name_override: Option<&str>,
) -> String {
    if let Some(name) = name_override.filter(|name| !name.is_empty()) {
        return name.to_string();
    }

    let tokens: Vec<String> = path
        .iter()
        .flat_map(|segment| (policy.tokenizer)(segment.as_ref()))
        .collect();
    let mut key = tokens.join(&policy.delimiter);

    if let Some(prefix) = &policy.prefix {
        key = format!("{}{}{}", prefix, policy.delimiter, key);
    }

    policy.case.apply(key)
}

/// Default tokenizer: split on `_`, then split each piece into compound words.
///
/// `http_bind_address` and `HTTPBindAddress` both give
/// `["http", "bind", "address"]`.
pub fn split_segment(segment: &str) -> Vec<String> {
    segment
        .split('_')
        .flat_map(split_compound_word)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_numeric() {
        CharClass::Digit
    } else {
        CharClass::Other
    }
}

/// Split a compound word into lowercase tokens on character-class changes.
///
/// An uppercase run followed by a lowercase run gives up its last letter to
/// the lowercase run, so acronyms stay whole: `HTTPRequest` -> `http`, `request`.
/// Runs of digits and of other characters are tokens of their own.
pub fn split_compound_word(word: &str) -> Vec<String> {
    let mut runs: Vec<(CharClass, Vec<char>)> = Vec::new();
    for c in word.chars() {
        let class = classify(c);
        match runs.last_mut() {
            Some((last, chars)) if *last == class => chars.push(c),
            _ => runs.push((class, vec![c])),
        }
    }

    for i in 0..runs.len().saturating_sub(1) {
        if runs[i].0 == CharClass::Upper && runs[i + 1].0 == CharClass::Lower {
            if let Some(c) = runs[i].1.pop() {
                runs[i + 1].1.insert(0, c);
            }
        }
    }

    runs.into_iter()
        .filter(|(_, chars)| !chars.is_empty())
        .map(|(_, chars)| chars.into_iter().collect::<String>().to_lowercase())
        .collect()
}
