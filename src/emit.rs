//! Canonical emission: block-style YAML or flow-style JSON, written through
//! a narrow [`Writer`] sink.
//!
//! The emitter is a pure reader over a [`Tree`]; it never mutates and never
//! reads its own output back. Quoting, literal-block and escape decisions
//! are made per scalar from its text and style flags alone.

use crate::errors::{Result, TreeError};
use crate::node::{NodeId, NodeScalar, NodeType};
use crate::tree::Tree;

/// Output syntax for [`Emitter::emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitType {
    Yaml,
    Json,
}

/// Byte sink of the emitter.
///
/// `write_str` is infallible; a bounded sink records overflow instead and
/// reports it from `written`, so the emitter itself stays branch-free about
/// buffer space.
pub trait Writer {
    fn write_str(&mut self, s: &str);

    fn write_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf));
    }

    /// Finalize and return the written text. With `error_on_excess`, a sink
    /// that had to drop output fails with
    /// [`TreeError::EmitBufferTooSmall`]; otherwise the written prefix is
    /// returned.
    fn written(&self, error_on_excess: bool) -> Result<&str>;
}

/// Growable sink; never truncates.
#[derive(Debug, Default)]
pub struct StringWriter {
    buf: String,
}

impl StringWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Writer for StringWriter {
    fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn written(&self, _error_on_excess: bool) -> Result<&str> {
        Ok(&self.buf)
    }
}

/// Sink over a fixed caller buffer.
///
/// Chunks that do not fit entirely are dropped but still accounted for, so
/// `written` can report how many bytes a complete emission would need.
#[derive(Debug)]
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    /// Length of the continuous prefix actually written
    len: usize,
    /// Bytes the full emission needs, counting dropped chunks
    needed: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceWriter { buf, len: 0, needed: 0 }
    }
}

impl Writer for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) {
        let start = self.needed;
        self.needed += s.len();
        // once a chunk has been dropped, everything after it is too; the
        // output stays a continuous prefix
        if self.needed <= self.buf.len() {
            self.buf[start..self.needed].copy_from_slice(s.as_bytes());
            self.len = self.needed;
        }
    }

    fn written(&self, error_on_excess: bool) -> Result<&str> {
        if error_on_excess && self.needed > self.buf.len() {
            return Err(TreeError::EmitBufferTooSmall { needed: self.needed });
        }
        Ok(std::str::from_utf8(&self.buf[..self.len]).expect("sink only receives whole str chunks"))
    }
}

/// Recursive writer producing block YAML or flow JSON from a tree.
pub struct Emitter<W: Writer> {
    writer: W,
}

impl<W: Writer> Emitter<W> {
    pub fn new(writer: W) -> Self {
        Emitter { writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Emit the branch rooted at `id` and finalize the writer.
    pub fn emit(&mut self, kind: EmitType, tree: &Tree, id: NodeId, error_on_excess: bool) -> Result<&str> {
        match kind {
            EmitType::Yaml => self._do_visit(tree, id, 0, false)?,
            EmitType::Json => self._do_visit_json(tree, id)?,
        }
        self.writer.written(error_on_excess)
    }

    fn write_indent(&mut self, ilevel: usize) {
        for _ in 0..ilevel {
            self.writer.write_str("  ");
        }
    }

    fn _do_visit(&mut self, t: &Tree, id: NodeId, ilevel: usize, mut do_indent: bool) -> Result<()> {
        debug_assert!(t.is_root(id) || t.parent_is_map(id) || t.parent_is_seq(id));

        if t.is_doc(id) {
            if !t.is_root(id) {
                debug_assert!(t.parent(id).is_some_and(|p| t.is_stream(p)));
                self.writer.write_str("---");
            }
            if !t.has_val(id) {
                if let Some(tag) = t.val_tag(id) {
                    if !t.is_root(id) {
                        self.writer.write_char(' ');
                    }
                    self._write_tag(tag);
                }
                if t.has_val_anchor(id) {
                    if !t.is_root(id) {
                        self.writer.write_char(' ');
                    }
                    self.writer.write_char('&');
                    self.writer.write_str(t.val_anchor(id).expect("anchor flag implies a name"));
                }
            } else {
                debug_assert!(!t.has_key(id));
                if !t.is_root(id) {
                    self.writer.write_char(' ');
                }
                self._writev(t, id, ilevel);
            }
            self.writer.write_char('\n');
        } else if t.is_keyval(id) {
            if do_indent {
                self.write_indent(ilevel);
            }
            self._writek(t, id, ilevel);
            self.writer.write_str(": ");
            self._writev(t, id, ilevel);
            self.writer.write_char('\n');
            return Ok(());
        } else if t.is_val(id) {
            if do_indent {
                self.write_indent(ilevel);
            }
            self.writer.write_str("- ");
            self._writev(t, id, ilevel);
            self.writer.write_char('\n');
            return Ok(());
        } else if t.is_container(id) {
            let mut spc = false; // a space is pending
            let mut nl = false; // the children start on a fresh line

            if t.has_key(id) {
                if do_indent {
                    self.write_indent(ilevel);
                }
                self._writek(t, id, ilevel);
                self.writer.write_char(':');
                spc = true;
            } else if !t.is_root(id) {
                if do_indent {
                    self.write_indent(ilevel);
                }
                self.writer.write_char('-');
                spc = true;
            }

            if let Some(tag) = t.val_tag(id) {
                if spc {
                    self.writer.write_char(' ');
                }
                self._write_tag(tag);
                spc = true;
                nl = true;
            }
            if t.has_val_anchor(id) {
                if spc {
                    self.writer.write_char(' ');
                }
                self.writer.write_char('&');
                self.writer.write_str(t.val_anchor(id).expect("anchor flag implies a name"));
                spc = true;
                nl = true;
            }

            if t.has_children(id) {
                if t.has_key(id) {
                    nl = true;
                } else if !t.is_root(id) && !nl {
                    spc = true;
                }
            } else {
                if t.is_seq(id) {
                    self.writer.write_str(" []\n");
                } else {
                    self.writer.write_str(" {}\n");
                }
                return Ok(());
            }

            if spc && !nl {
                self.writer.write_char(' ');
            }
            do_indent = false;
            if nl {
                self.writer.write_char('\n');
                do_indent = true;
            }
        }

        // top-level containers do not add an indent level
        let next_level = if t.is_stream(id) || t.is_doc(id) || t.is_root(id) {
            ilevel
        } else {
            ilevel + 1
        };
        let mut child = t.first_child(id);
        while let Some(c) = child {
            self._do_visit(t, c, next_level, do_indent)?;
            do_indent = true;
            child = t.next_sibling(c);
        }
        Ok(())
    }

    fn _do_visit_json(&mut self, t: &Tree, id: NodeId) -> Result<()> {
        if t.is_stream(id) {
            return Err(TreeError::JsonFeatureUnsupported("streams"));
        }
        if t.is_keyval(id) {
            self._writek_json(t, id)?;
            self.writer.write_str(": ");
            self._writev_json(t, id)?;
        } else if t.is_val(id) {
            self._writev_json(t, id)?;
        } else if t.is_container(id) {
            if t.has_key(id) {
                self._writek_json(t, id)?;
                self.writer.write_str(": ");
            }
            if t.is_seq(id) {
                self.writer.write_char('[');
            } else if t.is_map(id) {
                self.writer.write_char('{');
            }
        }
        let first = t.first_child(id);
        let mut child = first;
        while let Some(c) = child {
            if child != first {
                self.writer.write_char(',');
            }
            self._do_visit_json(t, c)?;
            child = t.next_sibling(c);
        }
        if t.is_container(id) {
            if t.is_seq(id) {
                self.writer.write_char(']');
            } else if t.is_map(id) {
                self.writer.write_char('}');
            }
        }
        Ok(())
    }

    fn _writek(&mut self, t: &Tree, id: NodeId, ilevel: usize) {
        let mask = NodeType::VAL | NodeType::VALQUO | NodeType::VALANCH | NodeType::VALREF;
        self._write(t, t.key_scalar(id), t.kind(id) - mask, ilevel);
    }

    fn _writev(&mut self, t: &Tree, id: NodeId, ilevel: usize) {
        let mask = NodeType::KEY | NodeType::KEYQUO | NodeType::KEYANCH | NodeType::KEYREF;
        self._write(t, t.val_scalar(id), t.kind(id) - mask, ilevel);
    }

    fn _writek_json(&mut self, t: &Tree, id: NodeId) -> Result<()> {
        let mask = NodeType::VAL | NodeType::VALQUO | NodeType::VALANCH | NodeType::VALREF;
        self._write_json(t, t.key_scalar(id), t.kind(id) - mask)
    }

    fn _writev_json(&mut self, t: &Tree, id: NodeId) -> Result<()> {
        let mask = NodeType::KEY | NodeType::KEYQUO | NodeType::KEYANCH | NodeType::KEYREF;
        self._write_json(t, t.val_scalar(id), t.kind(id) - mask)
    }

    /// Write one side of a node: tag, then anchor or reference, then the
    /// scalar itself. `flags` has the other side masked out.
    fn _write(&mut self, t: &Tree, sc: NodeScalar, flags: NodeType, ilevel: usize) {
        if let Some(tag) = sc.tag {
            self._write_tag(t.arena().get(tag));
            self.writer.write_char(' ');
        }
        if flags.has_anchor() {
            debug_assert!(!flags.is_ref());
            let anchor = sc.anchor.expect("anchor flag implies a name");
            self.writer.write_char('&');
            self.writer.write_str(t.arena().get(anchor));
            self.writer.write_char(' ');
        } else if flags.is_ref() {
            let name = t.arena().get(sc.anchor.expect("ref flag implies a name"));
            // the merge key << is itself spelled without a star
            if name != "<<" {
                self.writer.write_char('*');
            }
            self.writer.write_str(name);
            return;
        }

        let scalar = sc.scalar.map(|s| t.arena().get(s));
        let has_newlines = scalar.is_some_and(|s| s.contains('\n'));
        let leading_ws = scalar.is_some_and(|s| s.starts_with([' ', '\t']));
        if !has_newlines || leading_ws {
            self._write_scalar(scalar, flags.is_quoted());
        } else {
            let s = scalar.expect("newline check implies a scalar");
            self._write_scalar_block(s, ilevel, flags.has_key());
        }
    }

    fn _write_tag(&mut self, tag: &str) {
        if !tag.starts_with('!') {
            self.writer.write_char('!');
        }
        self.writer.write_str(tag);
    }

    /// Emit a literal block scalar (`|`), choosing the chomping indicator
    /// from the number of trailing newlines. The caller terminates the last
    /// line, so only the extra trailing newlines are written here.
    fn _write_scalar_block(&mut self, s: &str, ilevel: usize, explicit_key: bool) {
        if explicit_key {
            self.writer.write_str("? ");
        }
        let trimmed = s.trim_end_matches('\n');
        let newlines_at_end = s.len() - trimmed.len();
        match newlines_at_end {
            0 => self.writer.write_str("|-\n"),
            1 => self.writer.write_str("|\n"),
            _ => self.writer.write_str("|+\n"),
        }
        let mut first = true;
        for line in trimmed.split('\n') {
            if !first {
                self.writer.write_char('\n');
            }
            first = false;
            self.write_indent(ilevel + 1);
            self.writer.write_str(line);
        }
        for _ in 1..newlines_at_end.max(1) {
            self.writer.write_char('\n');
        }
        if explicit_key {
            self.writer.write_char('\n');
        }
    }

    /// Emit a flow scalar, quoting when the text would otherwise be
    /// misread. An absent scalar prints as `~`, a present empty one as
    /// `''`.
    fn _write_scalar(&mut self, s: Option<&str>, was_quoted: bool) {
        let Some(s) = s else {
            self.writer.write_char('~');
            return;
        };
        if s.is_empty() {
            self.writer.write_str("''");
            return;
        }

        let needs_quotes = was_quoted
            || (!scalar_is_number(s)
                && (s.starts_with([' ', '\n', '\r', '\t'])
                    || s.starts_with(['*', '&'])
                    || s.starts_with("<<")
                    || s.ends_with([' ', '\n', '\r', '\t'])
                    || s.contains(['#', ':', '-', '?', ',', '\n', '{', '}', '[', ']', '\'', '"'])));
        if !needs_quotes {
            self.writer.write_str(s);
            return;
        }

        let has_dquotes = s.contains('"');
        let has_squotes = s.contains('\'');
        if !has_squotes && has_dquotes {
            self.writer.write_char('\'');
            self.writer.write_str(s);
            self.writer.write_char('\'');
        } else if has_squotes && !has_dquotes {
            self.writer.write_char('"');
            self.writer.write_str(s);
            self.writer.write_char('"');
        } else {
            // single-quote and escape by doubling
            self.writer.write_char('\'');
            for c in s.chars() {
                self.writer.write_char(c);
                if c == '\'' || c == '\n' {
                    self.writer.write_char(c);
                }
            }
            self.writer.write_char('\'');
        }
    }

    fn _write_json(&mut self, t: &Tree, sc: NodeScalar, flags: NodeType) -> Result<()> {
        if sc.tag.is_some() {
            return Err(TreeError::JsonFeatureUnsupported("tags"));
        }
        if flags.has_anchor() {
            return Err(TreeError::JsonFeatureUnsupported("anchors"));
        }
        self._write_scalar_json(sc.scalar.map(|s| t.arena().get(s)), flags.has_key(), flags.is_quoted());
        Ok(())
    }

    fn _write_scalar_json(&mut self, s: Option<&str>, as_key: bool, was_quoted: bool) {
        let s = s.unwrap_or("");
        if was_quoted {
            self.writer.write_char('"');
            self.writer.write_str(s);
            self.writer.write_char('"');
        } else if !as_key && (scalar_is_number(s) || s == "true" || s == "false" || s == "null") {
            self.writer.write_str(s);
        } else {
            // json only allows strings as keys
            self.writer.write_char('"');
            for (i, part) in s.split('"').enumerate() {
                if i > 0 {
                    self.writer.write_str("\\\"");
                }
                self.writer.write_str(part);
            }
            self.writer.write_char('"');
        }
    }
}

/// Whether a scalar reads as a numeric literal (decimal, float with
/// exponent, or a `0x`/`0o`/`0b` radix form).
fn scalar_is_number(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if body.is_empty() {
        return false;
    }
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        return !bin.is_empty() && bin.bytes().all(|b| b == b'0' || b == b'1');
    }
    if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        return !oct.is_empty() && oct.bytes().all(|b| (b'0'..=b'7').contains(&b));
    }
    let (mantissa, exponent) = match body.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    if int_part.is_empty() && frac_part.is_none_or(str::is_empty) {
        return false;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !frac_part.unwrap_or("").bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if let Some(e) = exponent {
        let e = e.strip_prefix(['+', '-']).unwrap_or(e);
        if e.is_empty() || !e.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    true
}

/// Emit the whole tree as block YAML into a fresh string.
pub fn emit_yaml(tree: &Tree) -> Result<String> {
    let mut emitter = Emitter::new(StringWriter::new());
    emitter.emit(EmitType::Yaml, tree, tree.root_id(), true)?;
    Ok(emitter.into_writer().into_string())
}

/// Emit the whole tree as flow JSON into a fresh string.
pub fn emit_json(tree: &Tree) -> Result<String> {
    let mut emitter = Emitter::new(StringWriter::new());
    emitter.emit(EmitType::Json, tree, tree.root_id(), true)?;
    Ok(emitter.into_writer().into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_shapes() {
        for n in ["42", "-42", "+1", "3.14", ".5", "2.", "1e9", "-1.5E-3", "0x2a", "0b101", "0o17"] {
            assert!(scalar_is_number(n), "{n} should read as a number");
        }
        for n in ["", "-", ".", "1.2.3", "0x", "4a", "e9", "1e", "1e+"] {
            assert!(!scalar_is_number(n), "{n} should not read as a number");
        }
    }

    #[test]
    fn slice_writer_reports_excess() {
        let mut buf = [0u8; 4];
        let mut w = SliceWriter::new(&mut buf);
        w.write_str("ab");
        w.write_str("cdef");
        assert_eq!(
            w.written(true),
            Err(TreeError::EmitBufferTooSmall { needed: 6 })
        );
        assert_eq!(w.written(false), Ok("ab"));
    }
}
