//! Minimal slot templates.
//!
//! A template is plain text with `{slot}` placeholders. `{{` and `}}`
//! produce literal braces. Templates are compiled once against the set of
//! slots their stage can fill, so a typo in a configured template is caught
//! at startup instead of leaking into a prompt.

use crate::error::TemplateError;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile `source`, checking every slot against `allowed` and that every
    /// slot in `required` appears at least once.
    pub fn compile(
        name: &str,
        source: &str,
        allowed: &[&str],
        required: &[&str],
    ) -> Result<Self, TemplateError> {
        let segments = parse(name, source)?;

        for segment in &segments {
            if let Segment::Slot(slot) = segment {
                if !allowed.contains(&slot.as_str()) {
                    return Err(TemplateError::UnknownSlot {
                        template: name.to_string(),
                        slot: slot.clone(),
                    });
                }
            }
        }

        let template = Self {
            name: name.to_string(),
            segments,
        };

        for slot in required {
            if !template.slots().any(|s| s == *slot) {
                return Err(TemplateError::MissingSlot {
                    template: name.to_string(),
                    slot: slot.to_string(),
                });
            }
        }

        Ok(template)
    }

    /// Slot names in order of appearance (repeats included).
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Render with the given slot values. Slots without a value render empty.
    pub fn render(&self, values: &[(&str, String)]) -> String {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    if let Some((_, value)) = values.iter().find(|(k, _)| k == slot) {
                        out.push_str(value);
                    }
                }
            }
        }

        trace!("Rendered {} template ({} chars)", self.name, out.len());
        out
    }
}

fn parse(name: &str, source: &str) -> Result<Vec<Segment>, TemplateError> {
    let unbalanced = |offset: usize| TemplateError::Unbalanced {
        template: name.to_string(),
        offset,
    };

    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                text.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut slot = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        return Err(unbalanced(offset));
                    }
                    slot.push(c);
                }
                if !closed || slot.is_empty() {
                    return Err(unbalanced(offset));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Slot(slot));
            }
            '}' => return Err(unbalanced(offset)),
            c => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(segments)
}
