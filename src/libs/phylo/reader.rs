use super::tree::Tree;
use std::io::BufRead;

/// Read a single Newick tree from a file (or "stdin").
pub fn from_file(infile: &str) -> anyhow::Result<Tree> {
    let text = crate::libs::io::read_to_string(infile);
    let tree = Tree::from_newick(&text)?;
    Ok(tree)
}

/// Lazily streams `;`-terminated trees from a reader.
///
/// Accepts one tree per line as well as several trees concatenated on the
/// same line; trees are yielded as soon as their terminating `;` has been
/// read, so a large replicate file is never held in memory at once.
pub struct TreeReader {
    reader: Box<dyn BufRead>,
    buffer: String,
    done: bool,
}

impl TreeReader {
    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self {
            reader,
            buffer: String::new(),
            done: false,
        }
    }

    pub fn from_file(infile: &str) -> Self {
        Self::new(crate::libs::io::reader(infile))
    }
}

impl Iterator for TreeReader {
    type Item = anyhow::Result<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pos) = self.buffer.find(';') {
                let chunk: String = self.buffer.drain(..=pos).collect();
                return Some(Tree::from_newick(&chunk).map_err(Into::into));
            }
            if self.done {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                // Leftover text without a terminating ';' - let the parser
                // produce the diagnostic
                let chunk = std::mem::take(&mut self.buffer);
                return Some(Tree::from_newick(&chunk).map_err(Into::into));
            }

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.done = true,
                Ok(_) => self.buffer.push_str(&line),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
