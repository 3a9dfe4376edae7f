/// S-expression reader for KiCad board files.
///
/// Only what the board reader needs: nested lists of atoms, where quoted
/// strings and bare symbols both become `Atom`.

#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    List(Vec<SExpr>),
    Atom(String),
}

impl SExpr {
    /// First atom of a list, e.g. `footprint` in `(footprint ...)`.
    pub fn tag(&self) -> Option<&str> {
        match self {
            SExpr::List(items) => items.first().and_then(SExpr::as_atom),
            SExpr::Atom(_) => None,
        }
    }

    /// Everything after the tag.
    pub fn children(&self) -> &[SExpr] {
        match self {
            SExpr::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(s) => Some(s.as_str()),
            SExpr::List(_) => None,
        }
    }

    /// First child list with the given tag.
    pub fn find(&self, tag: &str) -> Option<&SExpr> {
        self.children().iter().find(|c| c.tag() == Some(tag))
    }

    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a SExpr> + 'a {
        self.children().iter().filter(move |c| c.tag() == Some(tag))
    }

    /// Value of a `(tag value)` child.
    pub fn value(&self, tag: &str) -> Option<&str> {
        self.find(tag).and_then(|node| node.atom_at(0))
    }

    /// Nth atom after the tag.
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.children().get(index).and_then(SExpr::as_atom)
    }

    pub fn f64_at(&self, index: usize) -> Option<f64> {
        self.atom_at(index).and_then(|v| v.parse().ok())
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn read_string(&mut self) -> Result<String, String> {
        let open = self.pos;
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(format!("unterminated string starting at byte {open}")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| format!("unterminated string starting at byte {open}"))?;
                    bytes.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        other => other,
                    });
                    self.pos += 1;
                }
                Some(b) => {
                    bytes.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_symbol(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'(' | b')' | b'"') {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn read_expr(&mut self) -> Result<SExpr, String> {
        self.skip_whitespace();
        match self.peek() {
            None => Err("unexpected end of input".to_string()),
            Some(b'(') => {
                let open = self.pos;
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b')') => {
                            self.pos += 1;
                            return Ok(SExpr::List(items));
                        }
                        None => return Err(format!("unclosed list starting at byte {open}")),
                        _ => items.push(self.read_expr()?),
                    }
                }
            }
            Some(b')') => Err(format!("unexpected ')' at byte {}", self.pos)),
            Some(b'"') => self.read_string().map(SExpr::Atom),
            Some(_) => Ok(SExpr::Atom(self.read_symbol())),
        }
    }
}

/// Parse a single top-level S-expression.
pub fn parse(input: &[u8]) -> Result<SExpr, String> {
    let mut reader = Reader::new(input);
    reader.skip_whitespace();
    if reader.peek().is_none() {
        return Err("empty input".to_string());
    }
    reader.read_expr()
}
