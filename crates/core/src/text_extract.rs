//! Text layout reconstruction
//!
//! Turns the unordered bag of positioned text fragments the rasterizer
//! reports for a page into a readable string with line and paragraph
//! breaks. This is a heuristic, not a layout engine: it assumes roughly
//! axis-aligned horizontal text in a single column.

use markpdf_engine::TextFragment;

/// Reconstruct ordered lines and paragraphs from positioned fragments.
///
/// Fragments are walked top of page first (descending baseline y).
/// Fragments whose baselines sit within 1.5 glyph heights of the current
/// line's reference baseline are grouped onto that line, then sorted by
/// ascending x and joined with single spaces. A vertical gap larger than
/// twice the threshold additionally inserts a blank line as a paragraph
/// break.
pub fn reconstruct_layout(fragments: &[TextFragment]) -> String {
    if fragments.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&TextFragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y));

    let line_height_threshold = sorted[0].height * 1.5;

    let mut output = String::new();
    let mut current_line: Vec<&TextFragment> = Vec::new();
    let mut current_y = sorted[0].y;

    for fragment in sorted {
        if (fragment.y - current_y).abs() > line_height_threshold {
            flush_line(&mut output, &mut current_line);
            output.push('\n');
            if current_y - fragment.y > 2.0 * line_height_threshold {
                output.push('\n');
            }
            current_y = fragment.y;
        }
        current_line.push(fragment);
    }
    flush_line(&mut output, &mut current_line);

    output
}

fn flush_line(output: &mut String, line: &mut Vec<&TextFragment>) {
    line.sort_by(|a, b| a.x.total_cmp(&b.x));
    for (i, fragment) in line.iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        output.push_str(&fragment.text);
    }
    line.clear();
}
