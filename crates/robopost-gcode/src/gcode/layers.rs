//! Splitting a G-code document into layers
//!
//! Slicers mark the start of each layer with a `;LAYER:<n>` comment line.
//! Everything before the first marker (start G-code, settings comments)
//! forms its own leading block.

/// Comment prefix that starts a new layer
pub const LAYER_MARKER: &str = ";LAYER:";

/// Split a document into blocks, starting a new block at every layer marker
///
/// Joining the blocks again gives back the original text.
pub fn split_layers(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if line.starts_with(LAYER_MARKER) && !current.is_empty() {
            blocks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Concatenate blocks back into a document
pub fn join_layers(blocks: &[String]) -> String {
    blocks.concat()
}
