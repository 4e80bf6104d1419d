//! Pixel rewrite through the mapping tables.

use equalize_common::{Channel, EqualizeResult, Image, ImageView, CHANNEL_COUNT};
use rayon::prelude::*;

use crate::mapper::MappingTable;

/// Writes `output[px][c] = map[c][input[px][c]]` for every pixel.
///
/// Each output row depends only on the matching input row and the read-only
/// table, so rows are processed in parallel with no synchronization. The
/// output buffer is private until every row is written, then returned whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemapStage;

impl RemapStage {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, input: &ImageView<'_>, table: &MappingTable) -> EqualizeResult<Image> {
        input.validate()?;

        let layout = input.layout();
        let bpp = layout.bytes_per_pixel();
        let row_bytes = input.row_bytes();
        let src = input.as_bytes();
        let red = table.channel(Channel::Red);
        let green = table.channel(Channel::Green);
        let blue = table.channel(Channel::Blue);

        let mut output = vec![0u8; src.len()];
        output
            .par_chunks_mut(row_bytes)
            .zip(src.par_chunks(row_bytes))
            .for_each(|(dst_row, src_row)| {
                for (dst, px) in dst_row.chunks_exact_mut(bpp).zip(src_row.chunks_exact(bpp)) {
                    dst[0] = red[px[0] as usize];
                    dst[1] = green[px[1] as usize];
                    dst[2] = blue[px[2] as usize];
                    // Alpha passes through untouched
                    dst[CHANNEL_COUNT..].copy_from_slice(&px[CHANNEL_COUNT..]);
                }
            });

        Image::from_raw(input.width(), input.height(), layout, output)
    }
}
