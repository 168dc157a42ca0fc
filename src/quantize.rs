//! Median-cut color quantization in RGB space.

use crate::color::Rgb;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    R,
    G,
    B,
}

impl Channel {
    fn of(self, pixel: &Rgb) -> u8 {
        match self {
            Channel::R => pixel.r,
            Channel::G => pixel.g,
            Channel::B => pixel.b,
        }
    }
}

/// Widest channel of a bucket and its range. Ties prefer r, then g, then b.
fn widest_channel(bucket: &[Rgb]) -> (Channel, u8) {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for p in bucket {
        for (i, v) in [p.r, p.g, p.b].into_iter().enumerate() {
            min[i] = min[i].min(v);
            max[i] = max[i].max(v);
        }
    }

    let r_range = max[0].saturating_sub(min[0]);
    let g_range = max[1].saturating_sub(min[1]);
    let b_range = max[2].saturating_sub(min[2]);
    let widest = r_range.max(g_range).max(b_range);

    if widest == r_range {
        (Channel::R, r_range)
    } else if widest == g_range {
        (Channel::G, g_range)
    } else {
        (Channel::B, b_range)
    }
}

/// Distinct colors in first-seen order.
fn distinct_colors(pixels: &[Rgb]) -> Vec<Rgb> {
    let mut seen = HashSet::new();
    pixels.iter().copied().filter(|p| seen.insert(*p)).collect()
}

fn bucket_mean(bucket: &[Rgb]) -> Rgb {
    let n = bucket.len() as u64;
    let (r, g, b) = bucket.iter().fold((0u64, 0u64, 0u64), |acc, p| {
        (acc.0 + p.r as u64, acc.1 + p.g as u64, acc.2 + p.b as u64)
    });
    // Round half up.
    let mean = |sum: u64| ((2 * sum + n) / (2 * n)).min(255) as u8;
    Rgb::new(mean(r), mean(g), mean(b))
}

/// Reduces `pixels` to at most `max_colors` representative colors.
///
/// Buckets are split at the pixel-count median of their widest channel,
/// always choosing the bucket with the largest such range. Ties go to the
/// lowest bucket index, so the output is fully determined by the input order.
pub fn quantize(pixels: &[Rgb], max_colors: usize) -> Vec<Rgb> {
    if pixels.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let distinct = distinct_colors(pixels);
    if max_colors >= distinct.len() {
        return distinct;
    }

    let mut buckets: Vec<Vec<Rgb>> = vec![pixels.to_vec()];

    while buckets.len() < max_colors {
        let mut best: Option<(usize, Channel, u8)> = None;
        for (idx, bucket) in buckets.iter().enumerate() {
            if bucket.len() <= 1 {
                continue;
            }
            let (channel, range) = widest_channel(bucket);
            if best.map_or(true, |(_, _, best_range)| range > best_range) {
                best = Some((idx, channel, range));
            }
        }

        let Some((idx, channel, _)) = best else {
            break;
        };

        let mut bucket = std::mem::take(&mut buckets[idx]);
        bucket.sort_by_key(|p| channel.of(p));
        let upper = bucket.split_off(bucket.len() / 2);
        buckets[idx] = bucket;
        buckets.insert(idx + 1, upper);
    }

    let mut seen = HashSet::new();
    buckets
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| bucket_mean(b))
        .filter(|c| seen.insert(*c))
        .collect()
}
