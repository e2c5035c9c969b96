use std::{
    fs::{self, File},
    io::{self, BufWriter, Read as _, StdoutLock, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;

/// Path argument that stands for standard input.
pub const STDIN_PATH: &str = "-";

/// Destination of a command's results.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutLock<'static>),
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Creates the file at `path`, or locks stdout when no path is given.
    pub fn open(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stdout(io::stdout().lock()));
        };
        let file = File::create(&path)
            .with_context(|| format!("cannot create output file {}", path.display()))?;
        Ok(Self::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    fn name(&self) -> String {
        match self {
            Self::Stdout(_) => "stdout".to_owned(),
            Self::File { path, .. } => path.display().to_string(),
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(writer) => writer,
            Self::File { writer, .. } => writer,
        }
    }

    /// Writes pretty-printed JSON and a trailing newline, then flushes.
    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        let name = self.name();
        let writer = self.writer();
        serde_json::to_writer_pretty(&mut *writer, value)
            .with_context(|| format!("cannot write JSON to {name}"))?;
        writeln!(writer).with_context(|| format!("cannot write to {name}"))?;
        self.finish()
    }

    pub fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        let name = self.name();
        self.writer()
            .write_all(text.as_bytes())
            .with_context(|| format!("cannot write to {name}"))
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        let name = self.name();
        self.writer()
            .flush()
            .with_context(|| format!("cannot flush {name}"))
    }
}

/// Reads a whole text file, or standard input when `path` is `-`.
///
/// # Errors
///
/// Returns error if the file or stdin cannot be read as UTF-8 text
pub fn read_text_input(file_kind: &str, path: &Path) -> anyhow::Result<String> {
    if path == Path::new(STDIN_PATH) {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .with_context(|| format!("cannot read {file_kind} from stdin"))?;
        return Ok(text);
    }
    fs::read_to_string(path)
        .with_context(|| format!("cannot read {file_kind} file {}", path.display()))
}

pub fn read_json_file<T>(file_kind: &str, path: &Path) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let text = read_text_input(file_kind, path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid {file_kind} JSON in {}", display_input_path(path)))
}

/// Human-readable name of an input path.
pub fn display_input_path(path: &Path) -> String {
    if path == Path::new(STDIN_PATH) {
        "<stdin>".to_owned()
    } else {
        path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_input_path() {
        assert_eq!(display_input_path(Path::new("-")), "<stdin>");
        assert_eq!(display_input_path(Path::new("maze.txt")), "maze.txt");
    }

    #[test]
    fn test_read_json_file_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!("gauntlet-util-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let err = read_json_file::<serde_json::Value>("grading config", &path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("invalid grading config JSON"));
    }
}
