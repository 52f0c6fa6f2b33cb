//! # Key ↔ path codec
//!
//! Maps a [`StoreKey`] onto a relative file path through a template such as
//! `"{0}/{1}/{2}/foo-{2}-expectations.{file_extension}"`, and parses such
//! paths back into keys.
//!
//! The template is compiled once into literal anchors and positional
//! captures. `{file_extension}` is resolved at compile time, so it acts as a
//! literal anchor. `{{` and `}}` stand for literal braces.
//!
//! Encoding escapes a configured substring (usually `/`) inside each segment
//! so that a segment can never introduce extra path components. A segment
//! that already contains the escape sequence is refused, since decoding could
//! not tell it apart from an escaped one.
//!
//! Every path stays under the directory it is resolved against: templates
//! that are absolute or contain empty, `.` or `..` components are refused at
//! compile time, and keys whose segments would form such a component are
//! refused at encode time.
//!
//! Templates that drop a position still encode and decode without complaint;
//! [`PathCodec::verify_that_key_to_filepath_operation_is_reversible`] is the
//! check that reports them, and backends are expected to run it once at setup.
use std::collections::{BTreeSet, HashSet};

use crate::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::key::StoreKey;

const EXTENSION_PLACEHOLDER: &str = "file_extension";

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Segment(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Escape {
    replaced: String,
    replacement: String,
}

/// Compiled, bidirectional key/path mapping.
#[derive(Debug, Clone)]
pub struct PathCodec {
    template: String,
    key_length: usize,
    parts: Vec<TemplatePart>,
    // Some position occurs more than once, so a match depends on earlier captures
    repeats_positions: bool,
    escape: Option<Escape>,
}

impl PathCodec {
    /// Compile `template` for keys of `key_length` segments.
    ///
    /// Fails on unbalanced braces, unknown placeholders, positions at or past
    /// `key_length`, and `{file_extension}` without an extension.
    pub fn new(template: &str, key_length: usize, file_extension: Option<&str>) -> Result<Self> {
        let parts = compile(template, key_length, file_extension)?;
        let mut seen = BTreeSet::new();
        let repeats_positions = parts.iter().any(|part| match part {
            TemplatePart::Segment(i) => !seen.insert(*i),
            TemplatePart::Literal(_) => false,
        });
        Ok(Self {
            template: template.to_string(),
            key_length,
            parts,
            repeats_positions,
            escape: None,
        })
    }

    /// Escape `replaced` as `replacement` inside segments.
    pub fn with_escape(mut self, replaced: &str, replacement: &str) -> Self {
        self.escape = Some(Escape {
            replaced: replaced.to_string(),
            replacement: replacement.to_string(),
        });
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Positions the template substitutes, in ascending order.
    pub fn referenced_positions(&self) -> BTreeSet<usize> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TemplatePart::Segment(i) => Some(*i),
                TemplatePart::Literal(_) => None,
            })
            .collect()
    }

    /// Positions in `0..key_length` the template never mentions.
    pub fn missing_positions(&self) -> Vec<usize> {
        let referenced = self.referenced_positions();
        (0..self.key_length)
            .filter(|i| !referenced.contains(i))
            .collect()
    }

    /// Render `key` as a relative path.
    pub fn encode(&self, key: &StoreKey) -> Result<String> {
        if key.len() != self.key_length {
            return Err(StorageSystemError::KeyLengthMismatch {
                expected: self.key_length,
                actual: key.len(),
            }
            .into());
        }

        // The guard looks at the original segments, before any substitution.
        let escaped: Vec<String> = match &self.escape {
            Some(escape) => {
                if let Some(segment) = key.iter().find(|s| s.contains(&escape.replacement)) {
                    return Err(StorageSystemError::AmbiguousKeySegment {
                        segment: segment.clone(),
                        replacement: escape.replacement.clone(),
                    }
                    .into());
                }
                let escaped: Vec<String> = key
                    .iter()
                    .map(|s| s.replace(&escape.replaced, &escape.replacement))
                    .collect();
                // Escaping can still create the sequence across a boundary,
                // e.g. "a_/" with "/" -> "__" reads back as "a/_".
                if let Some((segment, _)) = key
                    .iter()
                    .zip(&escaped)
                    .find(|(original, escaped)| {
                        escaped.replace(&escape.replacement, &escape.replaced) != **original
                    })
                {
                    return Err(StorageSystemError::AmbiguousKeySegment {
                        segment: segment.clone(),
                        replacement: escape.replacement.clone(),
                    }
                    .into());
                }
                escaped
            }
            None => key.segments().to_vec(),
        };

        let mut path = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => path.push_str(text),
                TemplatePart::Segment(i) => path.push_str(&escaped[*i]),
            }
        }

        if let Some(component) = unsafe_component(&path) {
            return Err(StorageSystemError::invalid_key(format!(
                "key {key} maps to '{path}', which has a {component:?} path component"
            ))
            .into());
        }
        Ok(path)
    }

    /// Parse a relative path (with `/` separators) back into a key.
    ///
    /// Returns `None` when the path does not follow the template, or when it
    /// is not the exact path this codec would produce for the recovered key.
    /// Positions the template never references come back as empty segments.
    pub fn decode(&self, path: &str) -> Option<StoreKey> {
        let mut captures: Vec<Option<&str>> = vec![None; self.key_length];
        let mut dead_ends = HashSet::new();
        if !self.match_parts(0, path, 0, &mut captures, &mut dead_ends) {
            return None;
        }

        let segments = captures
            .into_iter()
            .map(|capture| {
                let raw = capture.unwrap_or_default();
                match &self.escape {
                    Some(escape) => raw.replace(&escape.replacement, &escape.replaced),
                    None => raw.to_string(),
                }
            })
            .collect();
        let key = StoreKey::from_segments_unchecked(segments);

        // Only canonical paths belong to the key space.
        match self.encode(&key) {
            Ok(encoded) if encoded == path => Some(key),
            _ => None,
        }
    }

    /// Round-trip probe keys through encode and decode.
    ///
    /// Fails with [`StorageSystemError::NotReversible`] when the template
    /// leaves out a position, or when any probe comes back changed. Probe
    /// segment `i` embeds the index `i`, so swapped positions show up too.
    /// When escaping is configured a second probe carries the escaped text.
    pub fn verify_that_key_to_filepath_operation_is_reversible(&self) -> Result<()> {
        let probes = self.probe_keys()?;

        let missing = self.missing_positions();
        if !missing.is_empty() {
            let probe = &probes[0];
            let recovered = self
                .encode(probe)
                .ok()
                .and_then(|path| self.decode(&path));
            return Err(StorageSystemError::NotReversible {
                key: probe.to_string(),
                recovered: recovered.map(|k| k.to_string()),
                reason: format!(
                    "template '{}' never references key position(s) {:?}",
                    self.template, missing
                ),
            }
            .into());
        }

        for probe in &probes {
            let path = self.encode(probe)?;
            let recovered = self.decode(&path);
            if recovered.as_ref() != Some(probe) {
                return Err(StorageSystemError::NotReversible {
                    key: probe.to_string(),
                    recovered: recovered.map(|k| k.to_string()),
                    reason: format!("path '{path}' does not decode to the original key"),
                }
                .into());
            }
        }
        Ok(())
    }

    fn probe_keys(&self) -> Result<Vec<StoreKey>> {
        const STEMS: [&str; 3] = ["key", "probe", "QZ"];

        let clashes = |segment: &str| match &self.escape {
            Some(escape) => segment.contains(&escape.replacement),
            None => false,
        };

        // The index is written in decimal first, then as letters in case the
        // escape sequence contains digits.
        let renderers: [fn(usize) -> String; 3] = [
            |i| i.to_string(),
            |i| index_letters(i, b'a'),
            |i| index_letters(i, b'A'),
        ];

        for render in renderers {
            for stem in STEMS {
                let mut probes = vec![StoreKey::from_segments_unchecked(
                    (0..self.key_length).map(|i| format!("{stem}{}", render(i))).collect(),
                )];
                if let Some(escape) = &self.escape {
                    probes.push(StoreKey::from_segments_unchecked(
                        (0..self.key_length)
                            .map(|i| format!("{stem}{}{}{stem}", render(i), escape.replaced))
                            .collect(),
                    ));
                }
                if probes.iter().all(|probe| !probe.iter().any(|s| clashes(s.as_str()))) {
                    return Ok(probes);
                }
            }
        }

        Err(StorageSystemError::NotReversible {
            key: String::from("<none>"),
            recovered: None,
            reason: String::from("no probe key avoids the replacement string"),
        }
        .into())
    }

    // Backtracking match; captures are greedy and a repeated position must
    // capture the same text every time.
    //
    // Without repeated positions the outcome from (part, offset) does not
    // depend on earlier captures, so failed states are remembered and the
    // search is polynomial in the path length. Templates that repeat a
    // position skip that table and can backtrack exponentially in the number
    // of adjacent placeholders.
    fn match_parts<'p>(
        &self,
        index: usize,
        input: &'p str,
        pos: usize,
        captures: &mut Vec<Option<&'p str>>,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> bool {
        let Some(part) = self.parts.get(index) else {
            return pos == input.len();
        };
        if !self.repeats_positions && dead_ends.contains(&(index, pos)) {
            return false;
        }

        let matched = match part {
            TemplatePart::Literal(text) => {
                input[pos..].starts_with(text.as_str())
                    && self.match_parts(index + 1, input, pos + text.len(), captures, dead_ends)
            }
            TemplatePart::Segment(i) => match captures[*i] {
                Some(previous) => {
                    input[pos..].starts_with(previous)
                        && self.match_parts(index + 1, input, pos + previous.len(), captures, dead_ends)
                }
                None => self.match_segment(*i, index, input, pos, captures, dead_ends),
            },
        };

        if !matched && !self.repeats_positions {
            dead_ends.insert((index, pos));
        }
        matched
    }

    fn match_segment<'p>(
        &self,
        position: usize,
        index: usize,
        input: &'p str,
        pos: usize,
        captures: &mut Vec<Option<&'p str>>,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> bool {
        // A capture never contains the escaped text, which bounds the longest try.
        let limit = match &self.escape {
            Some(escape) => input[pos..]
                .find(escape.replaced.as_str())
                .map_or(input.len(), |offset| {
                    (pos + offset + escape.replaced.len()).saturating_sub(1)
                }),
            None => input.len(),
        };
        let anchor = match self.parts.get(index + 1) {
            Some(TemplatePart::Literal(text)) => Some(text.as_str()),
            _ => None,
        };

        for end in (pos + 1..=limit).rev() {
            if !input.is_char_boundary(end) {
                continue;
            }
            if anchor.is_some_and(|text| !input[end..].starts_with(text)) {
                continue;
            }
            captures[position] = Some(&input[pos..end]);
            if self.match_parts(index + 1, input, end, captures, dead_ends) {
                return true;
            }
        }
        captures[position] = None;
        false
    }
}

// First empty, `.` or `..` component of a relative path, if any.
fn unsafe_component(path: &str) -> Option<&str> {
    path.split('/')
        .find(|component| component.is_empty() || *component == "." || *component == "..")
}

// 0 -> "a", 25 -> "z", 26 -> "ba"
fn index_letters(mut index: usize, base: u8) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((base + (index % 26) as u8) as char);
        index /= 26;
        if index == 0 {
            break;
        }
    }
    letters.iter().rev().collect()
}

fn compile(template: &str, key_length: usize, file_extension: Option<&str>) -> Result<Vec<TemplatePart>> {
    let invalid = |reason: String| StorageSystemError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(invalid("unmatched '}'".to_string()).into()),
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(invalid("nested '{' in placeholder".to_string()).into()),
                        Some(ch) => name.push(ch),
                        None => return Err(invalid("unterminated placeholder".to_string()).into()),
                    }
                }

                if name == EXTENSION_PLACEHOLDER {
                    let extension = file_extension.ok_or_else(|| {
                        invalid("uses {file_extension} but no file_extension is configured".to_string())
                    })?;
                    literal.push_str(extension);
                } else if !name.is_empty() && name.chars().all(|ch| ch.is_ascii_digit()) {
                    let position: usize = name
                        .parse()
                        .map_err(|_| invalid(format!("placeholder {{{name}}} is out of range")))?;
                    if position >= key_length {
                        return Err(invalid(format!(
                            "placeholder {{{position}}} exceeds key_length {key_length}"
                        ))
                        .into());
                    }
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(TemplatePart::Segment(position));
                } else {
                    return Err(invalid(format!("unknown placeholder {{{name}}}")).into());
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    // Segment text is checked when encoding; a plain stand-in shows the
    // template's own layout.
    let layout: String = parts
        .iter()
        .map(|part| match part {
            TemplatePart::Literal(text) => text.as_str(),
            TemplatePart::Segment(_) => "x",
        })
        .collect();
    if layout.starts_with('/') {
        return Err(invalid("must be a relative path".to_string()).into());
    }
    if let Some(component) = unsafe_component(&layout) {
        return Err(invalid(format!("has a {component:?} path component")).into());
    }
    Ok(parts)
}
