//! Waveform strip for drawing under the thumbnails

/// Peak used when the decoder cannot report one (20000 on a 16-bit scale)
pub const DEFAULT_PEAK: f64 = 20000.0 / 32768.0;

/// Sample frames averaged into one visualization value
///
/// One thumbnail is `thumb_px` wide and covers `samples_per_frame` sample
/// frames, so each pixel gets `samples_per_frame / thumb_px` of them.
pub fn bucket_frames(samples_per_frame: u64, thumb_px: u16) -> usize {
    (samples_per_frame / u64::from(thumb_px.max(1))).max(1) as usize
}

/// Average absolute magnitude per bucket, normalized by `peak`
///
/// `samples` is interleaved with `channels` channels; a trailing partial
/// bucket is averaged over what it has.
pub fn compute(samples: &[f32], channels: u16, bucket_frames: usize, peak: f64) -> Vec<f32> {
    let peak = if peak > 0.0 { peak } else { DEFAULT_PEAK };
    let width = bucket_frames.max(1) * channels.max(1) as usize;

    samples
        .chunks(width)
        .map(|bucket| {
            let sum: f64 = bucket.iter().map(|s| f64::from(s.abs())).sum();
            (sum / bucket.len() as f64 / peak) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_width_never_zero() {
        assert_eq!(bucket_frames(1470, 128), 11);
        assert_eq!(bucket_frames(100, 128), 1);
        assert_eq!(bucket_frames(0, 0), 1);
    }

    #[test]
    fn test_average_magnitude_normalized() {
        let samples = [0.5, -0.5, 0.25, -0.25, 1.0, 1.0];
        let vis = compute(&samples, 2, 1, 0.5);
        assert_eq!(vis, vec![1.0, 0.5, 2.0]);
    }

    #[test]
    fn test_partial_bucket_and_zero_peak() {
        let samples = [0.25f32, 0.25, 0.25];
        let vis = compute(&samples, 1, 2, 0.0);
        assert_eq!(vis.len(), 2);
        assert!((f64::from(vis[0]) - 0.25 / DEFAULT_PEAK).abs() < 1e-6);
        assert!((vis[0] - vis[1]).abs() < 1e-6);
    }
}
