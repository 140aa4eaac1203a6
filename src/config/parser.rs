use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigToken {
    String(String),
    Float(f32),
    Number(i32),
}

impl ConfigToken {
    /// Return the token as it appeared in the source text.
    pub fn as_text(&self) -> String {
        match self {
            ConfigToken::String(s) => s.clone(),
            ConfigToken::Float(value) => value.to_string(),
            ConfigToken::Number(value) => value.to_string(),
        }
    }
}

impl From<ConfigToken> for String {
    fn from(value: ConfigToken) -> Self {
        match value {
            ConfigToken::String(s) => s,
            _ => Default::default(),
        }
    }
}

impl From<ConfigToken> for i32 {
    fn from(value: ConfigToken) -> Self {
        match value {
            ConfigToken::Number(value) => value,
            _ => Default::default(),
        }
    }
}

impl From<ConfigToken> for f32 {
    fn from(value: ConfigToken) -> Self {
        match value {
            ConfigToken::Float(value) => value,
            ConfigToken::Number(value) => value as f32,
            _ => Default::default(),
        }
    }
}

impl From<ConfigToken> for bool {
    fn from(value: ConfigToken) -> Self {
        match value {
            ConfigToken::String(s) => s.eq_ignore_ascii_case("true"),
            ConfigToken::Number(value) => value != 0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Params(Vec<ConfigToken>);

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLine {
    pub key: String,
    pub params: Params,
    /// 1-based line number in the source text.
    pub line_number: usize,
}

impl ConfigLine {
    pub fn params(&self) -> &[ConfigToken] {
        &self.params.0
    }

    pub fn param<T: From<ConfigToken> + Default>(&self, index: usize) -> T {
        self.params
            .0
            .get(index)
            .cloned()
            .map(T::from)
            .unwrap_or_default()
    }

    pub fn maybe_param<T: From<ConfigToken> + Default>(&self, index: usize) -> Option<T> {
        self.params.0.get(index).map(|t| T::from(t.clone()))
    }

    pub fn string(&self, index: usize) -> String {
        self.param::<String>(index)
    }

    /// Return the parameter at `index` as raw text, whatever type it was parsed as.
    pub fn text(&self, index: usize) -> String {
        self.params
            .0
            .get(index)
            .map(ConfigToken::as_text)
            .unwrap_or_default()
    }
}

fn parse_string(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<(String, bool)> {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next(); // Skip leading whitespace
    }

    let mut result = String::new();

    match chars.peek()? {
        '"' => {
            chars.next(); // Skip opening quote
            while let Some(ch) = chars.next() {
                match ch {
                    '"' => break,
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            result.push(escaped);
                        }
                    }
                    _ => result.push(ch),
                }
            }
            Some((result, true))
        }
        _ => {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                result.push(ch);
                chars.next();
            }
            Some((result, false))
        }
    }
}

pub fn parse_line(line: &str) -> Option<ConfigLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return None;
    }

    let mut chars = line.chars().peekable();

    let (key, _) = parse_string(&mut chars)?;

    let mut params = Vec::new();
    while let Some((param_str, quoted)) = parse_string(&mut chars) {
        // Quoted values always stay text so that "10" round-trips as a string.
        if quoted {
            params.push(ConfigToken::String(param_str));
        } else if let Ok(num) = param_str.parse::<i32>() {
            params.push(ConfigToken::Number(num));
        } else if let Ok(num) = param_str.parse::<f32>() {
            params.push(ConfigToken::Float(num));
        } else {
            params.push(ConfigToken::String(param_str));
        }
    }

    Some(ConfigLine {
        key,
        params: Params(params),
        line_number: 0,
    })
}

pub struct ConfigLines {
    lines: Vec<ConfigLine>,
}

impl ConfigLines {
    pub fn parse(s: &str) -> Self {
        Self {
            lines: s
                .lines()
                .enumerate()
                .filter_map(|(index, line)| {
                    parse_line(line).map(|mut line| {
                        line.line_number = index + 1;
                        line
                    })
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigLine> {
        self.lines.iter()
    }

    pub fn into_iter(self) -> impl Iterator<Item = ConfigLine> {
        self.lines.into_iter()
    }
}

/// Builds text that [ConfigLines::parse] reads back.
#[derive(Default)]
pub struct ConfigWriter {
    out: String,
}

impl ConfigWriter {
    /// Start a new line with `key`.
    pub fn line(&mut self, key: &str) -> &mut Self {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(key);
        self
    }

    /// Append a bare (unquoted) parameter.
    pub fn bare(&mut self, value: impl std::fmt::Display) -> &mut Self {
        let _ = write!(self.out, " {value}");
        self
    }

    /// Append a quoted parameter, escaping `"` and `\` with a backslash.
    pub fn quoted(&mut self, value: &str) -> &mut Self {
        self.out.push_str(" \"");
        for ch in value.chars() {
            if matches!(ch, '"' | '\\') {
                self.out.push('\\');
            }
            self.out.push(ch);
        }
        self.out.push('"');
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.line(";").bare(text)
    }

    pub fn finish(mut self) -> String {
        self.out.push('\n');
        self.out
    }
}
