// Source: https://stackoverflow.com/questions/45882329/read-large-files-line-by-line-in-rust
use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{self, prelude::*},
    path::Path,
    rc::Rc,
};

/// Line iterator; bytes that are not valid UTF-8 are replaced with U+FFFD.
pub struct TextReader<R: Read> {
    pub reader: io::BufReader<R>,
    buf: Rc<String>,
    raw_line: Vec<u8>,
}

fn new_buf(capacity: usize) -> Rc<String> {
    Rc::new(String::with_capacity(capacity))
}

impl<R: Read> TextReader<R> {
    pub fn from_reader(inner: R, capacity: usize) -> Self {
        let buf = new_buf(capacity);
        let reader = io::BufReader::with_capacity(buf.capacity().max(1), inner);

        Self { reader, buf, raw_line: Vec::with_capacity(capacity) }
    }
}

impl<R: Read> Iterator for TextReader<R> {
    type Item = io::Result<Rc<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = match Rc::get_mut(&mut self.buf) {
            Some(buf) => {
                buf.clear();
                buf
            }
            // the previous line is still borrowed by the caller
            None => {
                self.buf = new_buf(1024);
                Rc::make_mut(&mut self.buf)
            }
        };

        self.raw_line.clear();
        match self.reader.read_until(b'\n', &mut self.raw_line) {
            Ok(0) => None,
            Ok(_) => {
                buf.push_str(&String::from_utf8_lossy(&self.raw_line));
                Some(Ok(Rc::clone(&self.buf)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Reads one formula per line. Blank lines are kept so row numbers stay aligned.
pub fn read_formula_lines<R: Read>(inner: R) -> Result<Vec<String>> {
    let mut formulas = Vec::new();

    for (line_idx, line_res) in TextReader::from_reader(inner, 64 * 1024).enumerate() {
        let line = line_res.with_context(|| format!("can't read line {}", line_idx + 1))?;
        let mut content = line.trim_end_matches(&['\r', '\n'][..]);
        if line_idx == 0 {
            content = content.trim_start_matches('\u{feff}');
        }
        formulas.push(content.to_string());
    }

    Ok(formulas)
}

pub fn read_formula_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("can't open {}", path.display()))?;
    read_formula_lines(file)
}
