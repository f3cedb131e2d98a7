//! Framing and overlap-add reconstruction
//!
//! Slices a mono buffer into overlapping Hann-windowed frames and
//! reassembles processed frames into a continuous signal. The input is
//! zero-padded at both ends so every sample is covered by at least one
//! full window; reconstruction divides by the accumulated squared-window
//! sum, which makes frames → overlap_add an identity (within float
//! tolerance) when no spectral modification is applied.

/// A single analysis frame: `fft_size` samples with the analysis window
/// already applied, tagged with its start offset in the source buffer.
/// Offsets are negative for frames that begin in the start padding.
pub struct Frame {
    pub start: isize,
    pub samples: Vec<f32>,
}

/// Splits buffers into windowed frames and reassembles them
pub struct Framer {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f32>,
}

impl Framer {
    /// Create a framer for the given FFT size and hop size.
    ///
    /// Hop must divide the FFT size (75% overlap = fft_size / 4) so the
    /// constant-overlap-add condition holds.
    pub fn new(fft_size: usize, hop_size: usize) -> Self {
        Self {
            fft_size,
            hop_size,
            window: hann_window(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Iterate over windowed frames covering `buffer`, including the
    /// zero-padded boundary frames. Restartable by calling again.
    pub fn frames<'a>(&'a self, buffer: &'a [f32]) -> impl Iterator<Item = Frame> + 'a {
        let pad = (self.fft_size - self.hop_size) as isize;
        let len = buffer.len() as isize;
        let hop = self.hop_size as isize;
        // Frame starts run from -pad up to the last start below len
        let n_frames = if buffer.is_empty() {
            0
        } else {
            ((len + pad + hop - 1) / hop) as usize
        };

        (0..n_frames)
            .map(move |i| -pad + i as isize * hop)
            .map(move |start| {
                let mut samples = vec![0.0f32; self.fft_size];
                for (i, slot) in samples.iter_mut().enumerate() {
                    let idx = start + i as isize;
                    if idx >= 0 && idx < len {
                        *slot = buffer[idx as usize] * self.window[i];
                    }
                }
                Frame { start, samples }
            })
    }

    /// Iterate over windowed frames that lie entirely inside `buffer`,
    /// with no boundary padding. Used for noise profiling, where a
    /// partially zero-filled frame would bias the statistics low.
    pub fn interior_frames<'a>(&'a self, buffer: &'a [f32]) -> impl Iterator<Item = Vec<f32>> + 'a {
        (0..)
            .map(move |i| i * self.hop_size)
            .take_while(move |&start| start + self.fft_size <= buffer.len())
            .map(move |start| {
                buffer[start..start + self.fft_size]
                    .iter()
                    .zip(&self.window)
                    .map(|(s, w)| s * w)
                    .collect()
            })
    }

    /// Reassemble processed frames into a buffer of `output_len` samples
    pub fn overlap_add<I>(&self, frames: I, output_len: usize) -> Vec<f32>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut acc = OverlapAdd::new(self, output_len);
        for frame in frames {
            acc.add_frame(frame.start, &frame.samples);
        }
        acc.finish()
    }
}

/// Streaming overlap-add accumulator.
///
/// Frames arrive already carrying the analysis window; the synthesis
/// window is applied here and the result normalized by the squared
/// window sum, so attenuated and untouched frames reconstruct alike.
pub struct OverlapAdd<'a> {
    framer: &'a Framer,
    output: Vec<f32>,
    window_sum: Vec<f32>,
}

impl<'a> OverlapAdd<'a> {
    pub fn new(framer: &'a Framer, output_len: usize) -> Self {
        Self {
            framer,
            output: vec![0.0; output_len],
            window_sum: vec![0.0; output_len],
        }
    }

    /// Accumulate one processed frame at its original offset. Samples
    /// falling in the padded regions are dropped here, which trims the
    /// output back to the source length.
    pub fn add_frame(&mut self, start: isize, samples: &[f32]) {
        for (i, &sample) in samples.iter().enumerate() {
            let idx = start + i as isize;
            if idx < 0 || idx >= self.output.len() as isize {
                continue;
            }
            let w = self.framer.window[i];
            self.output[idx as usize] += sample * w;
            self.window_sum[idx as usize] += w * w;
        }
    }

    pub fn finish(mut self) -> Vec<f32> {
        for (sample, ws) in self.output.iter_mut().zip(&self.window_sum) {
            if *ws > 1e-8 {
                *sample /= ws;
            }
        }
        self.output
    }
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}
