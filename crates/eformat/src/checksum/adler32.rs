//! Adler-32, computed byte-wise (in little-endian memory order) over a
//! 32-bit-word buffer, with a multi-threaded variant for large buffers.

const MOD_ADLER: u32 = 65521;

/// Adler-32 over `data`, starting from the canonical initial state.
pub fn adler32(data: &[u32]) -> u32 {
    adler32_init(1, data)
}

/// Resumes an Adler-32 computation from a previously returned checksum.
///
/// `init` is the full 32-bit Adler state (`b << 16 | a`) from a prior call,
/// or `1` to start fresh. `data` is checksummed in little-endian byte order,
/// matching the wire layout used everywhere else in this crate.
pub fn adler32_init(init: u32, data: &[u32]) -> u32 {
    let mut a = init & 0xffff;
    let mut b = (init >> 16) & 0xffff;
    for word in data {
        for byte in word.to_le_bytes() {
            a = (a + byte as u32) % MOD_ADLER;
            b = (b + a) % MOD_ADLER;
        }
    }
    (b << 16) | a
}

/// Combines two Adler-32 checksums as if computed over concatenated data:
/// `adler1` over the first `len1_bytes` bytes, `adler2` over the following
/// `len2_bytes` (computed independently, starting from the canonical `1`).
fn combine(adler1: u32, adler2: u32, len2_bytes: u64) -> u32 {
    let base = MOD_ADLER as u64;
    let rem = len2_bytes % base;
    let mut sum1 = (adler1 & 0xffff) as u64;
    let mut sum2 = (rem * sum1) % base;
    sum1 += ((adler2 & 0xffff) as u64) + base - 1;
    sum2 += (((adler1 >> 16) & 0xffff) as u64) + (((adler2 >> 16) & 0xffff) as u64) + base - rem;
    if sum1 >= base {
        sum1 -= base;
    }
    if sum1 >= base {
        sum1 -= base;
    }
    if sum2 >= base << 1 {
        sum2 -= base << 1;
    }
    if sum2 >= base {
        sum2 -= base;
    }
    (sum1 as u32) | ((sum2 as u32) << 16)
}

/// Knobs for the multi-threaded Adler-32 path.
#[derive(Debug, Clone, Copy)]
pub struct Adler32Config {
    /// Below this many bytes, always compute single-threaded.
    pub threshold_bytes: usize,
    /// Number of worker chunks to split into once above the threshold.
    pub threads: usize,
}

impl Default for Adler32Config {
    fn default() -> Self {
        Self {
            threshold_bytes: 1 << 20,
            threads: 4,
        }
    }
}

/// Adler-32 over `data`, splitting the work across [`Adler32Config::threads`]
/// scoped worker threads when the buffer is at least `threshold_bytes` long.
pub fn adler32_mt(data: &[u32], config: Adler32Config) -> u32 {
    let size_bytes = data.len() * 4;
    if config.threads <= 1 || size_bytes < config.threshold_bytes {
        return adler32(data);
    }

    let nchunks = config.threads.min(data.len().max(1));
    let base = data.len() / nchunks;
    let extra = data.len() % nchunks;
    let mut bounds = Vec::with_capacity(nchunks + 1);
    let mut pos = 0;
    bounds.push(0);
    for i in 0..nchunks {
        pos += base + usize::from(i < extra);
        bounds.push(pos);
    }

    let partials: Vec<(u32, u64)> = crossbeam::scope(|scope| {
        let mut handles = Vec::with_capacity(nchunks);
        for w in bounds.windows(2) {
            let (start, end) = (w[0], w[1]);
            let chunk = &data[start..end];
            handles.push(scope.spawn(move |_| (adler32(chunk), (chunk.len() * 4) as u64)));
        }
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .expect("adler32 worker thread panicked");

    partials
        .into_iter()
        .fold(None, |acc, (checksum, len_bytes)| match acc {
            None => Some(checksum),
            Some(running) => Some(combine(running, checksum, len_bytes)),
        })
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_data_is_canonical_initial_state() {
        assert_eq!(adler32(&[]), 1);
    }

    #[test]
    fn known_vector() {
        // Well-known test vector: adler32(b"Wikipedia") == 0x11E60398.
        let mut a = 1u32;
        let mut b = 0u32;
        for &byte in b"Wikipedia" {
            a = (a + byte as u32) % MOD_ADLER;
            b = (b + a) % MOD_ADLER;
        }
        assert_eq!((b << 16) | a, 0x11E60398);
    }

    #[test]
    fn init_resumes_equivalent_to_one_shot() {
        let data = [1u32, 2, 3, 4, 5, 6, 7, 8];
        let one_shot = adler32(&data);
        let half = data.len() / 2;
        let resumed_state = adler32_init(1, &data[..half]);
        let resumed = adler32_init(resumed_state, &data[half..]);
        assert_eq!(one_shot, resumed);
    }

    #[test]
    fn combine_matches_sequential_resume() {
        let data = [42u32, 7, 99, 1000, 55555, 2, 3, 4];
        let half = data.len() / 2;
        let a1 = adler32(&data[..half]);
        let a2 = adler32(&data[half..]);
        let combined = combine(a1, a2, (data.len() - half) as u64 * 4);
        assert_eq!(combined, adler32(&data));
    }

    #[test]
    fn multi_threaded_matches_single_threaded() {
        let data: Vec<u32> = (0..10_000u32).collect();
        let mt = adler32_mt(
            &data,
            Adler32Config {
                threshold_bytes: 0,
                threads: 8,
            },
        );
        assert_eq!(mt, adler32(&data));
    }

    #[test]
    fn below_threshold_is_single_threaded_path() {
        let data: Vec<u32> = (0..16u32).collect();
        let mt = adler32_mt(
            &data,
            Adler32Config {
                threshold_bytes: usize::MAX,
                threads: 8,
            },
        );
        assert_eq!(mt, adler32(&data));
    }
}
