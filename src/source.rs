//! Input lines from stdin, a file, or a directory of files.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Yields input lines one reader at a time.
///
/// Each reader is consumed to its end before the next one starts, so a final
/// line without a newline stays its own line. Line endings are stripped and
/// invalid UTF-8 is replaced rather than treated as an error.
pub struct LineSource<'a> {
    readers: VecDeque<Box<dyn BufRead + Send + 'a>>,
    buf: Vec<u8>,
}

impl<'a> LineSource<'a> {
    /// Lines from a single reader
    pub fn from_reader<R: BufRead + Send + 'a>(reader: R) -> Self {
        Self::from_readers(vec![Box::new(reader) as Box<dyn BufRead + Send + 'a>])
    }

    /// Lines from several readers, in order
    pub fn from_readers(readers: Vec<Box<dyn BufRead + Send + 'a>>) -> Self {
        Self {
            readers: readers.into(),
            buf: Vec::new(),
        }
    }

    /// Lines from standard input
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    /// Lines from a file, or from every regular file directly inside a
    /// directory in file name order.
    pub fn open(path: &Path) -> io::Result<Self> {
        if !path.is_dir() {
            let file = File::open(path)?;
            return Ok(Self::from_reader(BufReader::new(file)));
        }

        let files = directory_files(path)?;
        if files.is_empty() {
            log::warn!("Directory {} contains no files", path.display());
        }
        let mut readers: Vec<Box<dyn BufRead + Send + 'a>> = Vec::with_capacity(files.len());
        for file in files {
            log::debug!("Queued input file {}", file.display());
            readers.push(Box::new(BufReader::new(File::open(&file)?)));
        }
        Ok(Self::from_readers(readers))
    }

    /// Lines from `path`, or standard input when no path is given
    pub fn open_or_stdin(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::stdin()),
        }
    }
}

impl Iterator for LineSource<'_> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let reader = self.readers.front_mut()?;
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.readers.pop_front();
                }
                Ok(_) => {
                    if self.buf.last() == Some(&b'\n') {
                        self.buf.pop();
                        if self.buf.last() == Some(&b'\r') {
                            self.buf.pop();
                        }
                    }
                    return Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()));
                }
                Err(e) => {
                    self.readers.pop_front();
                    return Some(Err(e));
                }
            }
        }
    }
}

fn directory_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
