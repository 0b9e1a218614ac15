//! S-expression reader.
//!
//! Consumes a byte cursor and produces heap values: lists, strings,
//! integers, and interned symbols. A close paren at top level (and end of
//! input) reads as absence rather than a value.

use crate::core::error::LispError;
use crate::core::interner::MAX_SYMBOL_LEN;
use crate::core::value::{Handle, LispStr, Val};
use crate::vm::engine::Interp;

pub struct Reader<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Read one value. `Ok(None)` means absence: end of input, or a close
    /// paren the enclosing list loop will consume.
    pub fn read(&mut self, interp: &mut Interp) -> Result<Option<Handle>, LispError> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(None),
            Some(b')') => Ok(None),
            Some(b'(') => self.read_list(interp).map(Some),
            Some(b'"') => self.read_string(interp).map(Some),
            Some(_) => self.read_token(interp).map(Some),
        }
    }

    fn read_list(&mut self, interp: &mut Interp) -> Result<Handle, LispError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            match self.read(interp)? {
                Some(item) => items.push(item),
                None => {
                    if self.peek() == Some(b')') {
                        self.bump();
                        break;
                    }
                    return Err(LispError::Shape(
                        "unexpected end of input in list".to_string(),
                    ));
                }
            }
        }
        let mut out = interp.nil;
        for &item in items.iter().rev() {
            out = interp.heap.alloc(Val::Cons(item, out));
        }
        Ok(out)
    }

    fn read_string(&mut self, interp: &mut Interp) -> Result<Handle, LispError> {
        self.bump();
        let mut out = LispStr::new();
        loop {
            match self.bump() {
                None => {
                    return Err(LispError::Shape("unterminated string".to_string()));
                }
                Some(b'"') => break,
                Some(b'\\') => match self.peek() {
                    Some(b'n') => {
                        self.bump();
                        out.push(b'\n');
                    }
                    Some(b'\\') | Some(b'"') => {
                        let c = self.bump().expect("peeked byte present");
                        out.push(c);
                    }
                    Some(b) if (b'0'..=b'7').contains(&b) => {
                        // up to three octal digits
                        let mut code: u16 = 0;
                        for _ in 0..3 {
                            match self.peek() {
                                Some(d) if (b'0'..=b'7').contains(&d) => {
                                    self.bump();
                                    code = code * 8 + (d - b'0') as u16;
                                }
                                _ => break,
                            }
                        }
                        out.push(code as u8);
                    }
                    Some(other) => {
                        // unknown escape: keep the character itself
                        self.bump();
                        out.push(other);
                    }
                    None => {
                        return Err(LispError::Shape("unterminated string".to_string()));
                    }
                },
                Some(b) => out.push(b),
            }
        }
        Ok(interp.heap.alloc(Val::Str(out)))
    }

    fn read_token(&mut self, interp: &mut Interp) -> Result<Handle, LispError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'(' || b == b')' || b == 0 {
                break;
            }
            self.pos += 1;
        }
        let token = &self.src[start..self.pos];
        if token.is_empty() {
            // a stray NUL byte: consume it and intern the empty name
            self.bump();
            return interp.intern("");
        }

        if token[0].is_ascii_digit() {
            // parse the leading decimal run; trailing bytes are ignored
            let mut n: i64 = 0;
            for &b in token {
                if !b.is_ascii_digit() {
                    break;
                }
                n = n.wrapping_mul(10).wrapping_add((b - b'0') as i64);
            }
            return Ok(interp.heap.alloc(Val::Int(n)));
        }

        let name = std::str::from_utf8(token)
            .map_err(|_| LispError::Shape("symbol name is not valid utf-8".to_string()))?;
        let name = if name.len() > MAX_SYMBOL_LEN {
            let mut end = MAX_SYMBOL_LEN;
            while !name.is_char_boundary(end) {
                end -= 1;
            }
            &name[..end]
        } else {
            name
        };
        interp.intern(name)
    }
}
