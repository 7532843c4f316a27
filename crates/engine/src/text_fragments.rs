//! Positioned text fragment extraction
//!
//! Walks a decoded page content stream and records where text-showing
//! operators place their strings. This deliberately tracks only the
//! axis-aligned subset of the text state machine (the downstream layout
//! reconstructor is a single-column heuristic): rotation and per-glyph
//! kerning are ignored, and simple-font bytes are decoded as Latin-1.

use lopdf::content::Content;
use lopdf::Object;

/// One run of text placed by a single show operator.
///
/// `x`/`y` are the baseline origin in page points (PDF origin, bottom
/// left); `height` is the effective font size at that point.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    x: f32,
    y: f32,
    font_size: f32,
    size_scale: f32,
    leading: f32,
}

impl TextState {
    fn reset() -> Self {
        Self { x: 0.0, y: 0.0, font_size: 0.0, size_scale: 1.0, leading: 0.0 }
    }

    fn next_line(&mut self) {
        self.y -= self.leading;
    }

    fn effective_height(&self) -> f32 {
        (self.font_size * self.size_scale).abs()
    }
}

fn operand_float(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(|obj| obj.as_float().ok())
}

fn decode_string(object: &Object) -> Option<String> {
    match object {
        // Latin-1 pass-through; embedded-font cmaps are out of scope here.
        Object::String(bytes, _) => Some(bytes.iter().map(|&b| b as char).collect()),
        _ => None,
    }
}

fn decode_tj_array(operands: &[Object]) -> Option<String> {
    let array = operands.first()?.as_array().ok()?;
    let mut text = String::new();
    for element in array {
        if let Some(part) = decode_string(element) {
            text.push_str(&part);
        }
    }
    Some(text)
}

fn push_fragment(fragments: &mut Vec<TextFragment>, state: &TextState, text: String) {
    if text.is_empty() {
        return;
    }
    fragments.push(TextFragment {
        text,
        x: state.x,
        y: state.y,
        height: state.effective_height(),
    });
}

/// Extract text fragments from raw (already decompressed) content bytes.
pub fn extract(content: &[u8]) -> Result<Vec<TextFragment>, lopdf::Error> {
    let content = Content::decode(content)?;
    let mut fragments = Vec::new();
    let mut state = TextState::reset();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => state = TextState { font_size: state.font_size, ..TextState::reset() },
            "Tf" => {
                if let Some(size) = operand_float(operands, 1) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operand_float(operands, 0) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) =
                    (operand_float(operands, 0), operand_float(operands, 1))
                {
                    state.x += tx;
                    state.y += ty;
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) =
                    (operand_float(operands, 0), operand_float(operands, 1))
                {
                    state.leading = -ty;
                    state.x += tx;
                    state.y += ty;
                }
            }
            "Tm" => {
                // [a b c d e f]: take the translation and the vertical
                // scale; rotated text falls outside the heuristic.
                if let (Some(d), Some(e), Some(f)) = (
                    operand_float(operands, 3),
                    operand_float(operands, 4),
                    operand_float(operands, 5),
                ) {
                    state.size_scale = if d == 0.0 { 1.0 } else { d };
                    state.x = e;
                    state.y = f;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(decode_string) {
                    push_fragment(&mut fragments, &state, text);
                }
            }
            "TJ" => {
                if let Some(text) = decode_tj_array(operands) {
                    push_fragment(&mut fragments, &state, text);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(decode_string) {
                    push_fragment(&mut fragments, &state, text);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(decode_string) {
                    push_fragment(&mut fragments, &state, text);
                }
            }
            _ => {}
        }
    }

    Ok(fragments)
}
