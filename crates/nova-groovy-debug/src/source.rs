//! Source files, line indexing and debugger source positions.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use text_size::TextSize;

use crate::index::ModuleId;
use crate::lexical::ScopeArena;
use crate::outline;

/// File extensions treated as Groovy sources.
pub const GROOVY_EXTENSIONS: &[&str] = &["groovy", "gvy", "gy", "gsh"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// Byte offsets of line starts for one text snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    /// Lines end at `\n`, `\r\n` or a lone `\r`.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![TextSize::from(0)];
        for (idx, &b) in bytes.iter().enumerate() {
            let ends_line = match b {
                b'\n' => true,
                b'\r' => bytes.get(idx + 1) != Some(&b'\n'),
                _ => false,
            };
            if ends_line {
                line_starts.push(TextSize::from((idx + 1) as u32));
            }
        }
        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// Zero-based line containing `offset`; offsets past the end clamp to the
    /// last line.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        let offset = offset.min(self.len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(insert) => insert.saturating_sub(1) as u32,
        }
    }

    /// End of `line`, excluding the line terminator.
    pub fn line_end(&self, text: &str, line: u32) -> Option<TextSize> {
        let start = self.line_start(line)?;
        let next = self.line_start(line + 1).unwrap_or(self.len);
        let slice = &text[u32::from(start) as usize..u32::from(next) as usize];
        let trimmed = slice.trim_end_matches(['\n', '\r']);
        Some(start + TextSize::from(trimmed.len() as u32))
    }
}

/// A parsed source file: text, line index and its lexical scope arena.
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: FileId,
    module: ModuleId,
    path: PathBuf,
    text: String,
    line_index: LineIndex,
    scopes: ScopeArena,
}

impl SourceFile {
    pub(crate) fn new(id: FileId, module: ModuleId, path: PathBuf, text: String) -> Self {
        let scopes = if is_groovy_path(&path) {
            let script_name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("script");
            outline::scan(&text, script_name)
        } else {
            ScopeArena::default()
        };
        Self {
            id,
            module,
            line_index: LineIndex::new(&text),
            path,
            text,
            scopes,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    /// Whether this file can contain Groovy type definitions.
    pub fn is_groovy(&self) -> bool {
        is_groovy_path(&self.path)
    }

    /// Offset of the first non-whitespace character on `line`, or the line
    /// start for blank lines. `None` if the line does not exist.
    pub fn first_code_offset(&self, line: u32) -> Option<TextSize> {
        let start = self.line_index.line_start(line)?;
        let end = self.line_index.line_end(&self.text, line)?;
        let slice = &self.text[u32::from(start) as usize..u32::from(end) as usize];
        let indent = slice.len() - slice.trim_start().len();
        if indent == slice.len() {
            Some(start)
        } else {
            Some(start + TextSize::from(indent as u32))
        }
    }

    /// Offset used for lexical lookups at `position`.
    pub fn offset_of(&self, position: &SourcePosition) -> Option<TextSize> {
        match position.offset {
            Some(offset) if u32::from(offset) as usize <= self.text.len() => Some(offset),
            Some(_) => None,
            None => self.first_code_offset(position.line),
        }
    }

    pub(crate) fn replace_text(&mut self, text: String) {
        *self = Self::new(self.id, self.module, std::mem::take(&mut self.path), text);
    }
}

pub fn is_groovy_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            GROOVY_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// A position in a source file as seen by the debugger.
///
/// Positions compare and hash by `(file, line)` only; the optional offset
/// refines lexical lookups but does not change which line a position denotes.
#[derive(Debug, Clone, Copy)]
pub struct SourcePosition {
    pub file: FileId,
    /// Zero-based line.
    pub line: u32,
    pub offset: Option<TextSize>,
}

impl SourcePosition {
    pub fn from_offset(file: &SourceFile, offset: TextSize) -> Self {
        Self {
            file: file.id(),
            line: file.line_index().line_of(offset),
            offset: Some(offset),
        }
    }

    pub fn from_line(file: FileId, line: u32) -> Self {
        Self {
            file,
            line,
            offset: None,
        }
    }
}

impl PartialEq for SourcePosition {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.line == other.line
    }
}

impl Eq for SourcePosition {}

impl Hash for SourcePosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file.hash(state);
        self.line.hash(state);
    }
}
