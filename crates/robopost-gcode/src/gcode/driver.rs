//! Whole-document driver
//!
//! Feeds every line of every layer through one [`StateTransitionEmitter`]
//! in document order, then wraps the result in the pins-off header and
//! footer. Any malformed line aborts the run: no partial output is returned.

use robopost_core::{PinState, Result};
use robopost_settings::PostProcessConfig;

use super::command::{footer, header};
use super::emitter::{StateTransitionEmitter, TransformStats};

/// Runs the transform over a sequence of layers
#[derive(Debug, Clone)]
pub struct SequenceDriver {
    emitter: StateTransitionEmitter,
}

impl SequenceDriver {
    /// Create a driver for one document
    pub fn new(config: PostProcessConfig) -> Self {
        Self {
            emitter: StateTransitionEmitter::new(config),
        }
    }

    /// Pin state after the lines processed so far
    pub fn state(&self) -> PinState {
        self.emitter.state()
    }

    /// Counters collected so far
    pub fn stats(&self) -> &TransformStats {
        self.emitter.stats()
    }

    /// Process the lines of one layer, keeping their line terminators
    pub fn process_block(&mut self, layer: usize, block: &str) -> Result<String> {
        let mut out = String::with_capacity(block.len());

        for (index, line) in block.split_inclusive('\n').enumerate() {
            let processed = self
                .emitter
                .process_line(line)
                .map_err(|e| e.at(layer, index + 1))?;
            out.push_str(&processed);
        }

        tracing::debug!(
            "Layer {} processed, state now [{}]",
            layer,
            self.emitter.state()
        );
        Ok(out)
    }

    /// Process all layers and add the header and footer
    ///
    /// An empty input produces an empty output.
    pub fn run(&mut self, blocks: Vec<String>) -> Result<Vec<String>> {
        let mut output = Vec::with_capacity(blocks.len());
        for (layer, block) in blocks.iter().enumerate() {
            output.push(self.process_block(layer, block)?);
        }

        let config = self.emitter.config();
        if let Some(first) = output.first_mut() {
            first.insert_str(0, &header(config));
        }
        if let Some(last) = output.last_mut() {
            last.push_str(&footer(config));
        }

        let stats = self.emitter.stats();
        tracing::info!(
            "Processed {} layers: {} motion lines, {} pin commands, {} dwells",
            output.len(),
            stats.motion_lines,
            stats.pin_commands,
            stats.dwells
        );

        Ok(output)
    }
}

/// Transform a document given as layers
pub fn transform(blocks: Vec<String>, config: &PostProcessConfig) -> Result<Vec<String>> {
    SequenceDriver::new(config.clone()).run(blocks)
}
