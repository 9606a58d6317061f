use std::fmt;

/// Class name filter with JDWP `ClassMatch` semantics.
///
/// A pattern is either an exact class name, or a name with a single leading or
/// trailing `*` wildcard (`com.example.Foo$*`, `*.Foo`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassPattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
}

impl ClassPattern {
    pub fn parse(pattern: &str) -> Self {
        if let Some(prefix) = pattern.strip_suffix('*') {
            Self::Prefix(prefix.to_string())
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            Self::Suffix(suffix.to_string())
        } else {
            Self::Exact(pattern.to_string())
        }
    }

    /// Every type nested (at any depth) inside `outer`.
    pub fn nested_in(outer: &str) -> Self {
        Self::Prefix(format!("{outer}$"))
    }

    pub fn matches(&self, class_name: &str) -> bool {
        match self {
            Self::Exact(name) => class_name == name,
            Self::Prefix(prefix) => class_name.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => class_name.ends_with(suffix.as_str()),
        }
    }
}

impl fmt::Display for ClassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Suffix(suffix) => write!(f, "*{suffix}"),
        }
    }
}
