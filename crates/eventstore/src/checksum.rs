//! Adler-32 over raw record bytes, with a multi-threaded variant for whole
//! files. Same algorithm as [`eformat::checksum::adler32`], but byte-sliced
//! rather than word-sliced since a container file's payload isn't
//! necessarily 32-bit aligned the way a fragment buffer is.

const MOD_ADLER: u32 = 65521;

pub fn adler32(data: &[u8]) -> u32 {
    adler32_init(1, data)
}

pub fn adler32_init(init: u32, data: &[u8]) -> u32 {
    let mut a = init & 0xffff;
    let mut b = (init >> 16) & 0xffff;
    for &byte in data {
        a = (a + byte as u32) % MOD_ADLER;
        b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
}

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

#[derive(Debug, Clone, Copy)]
pub struct Adler32Config {
    pub threshold_bytes: usize,
    pub threads: usize,
}

impl Default for Adler32Config {
    fn default() -> Self {
        Self { threshold_bytes: 1 << 20, threads: 4 }
    }
}

/// Adler-32 over `data`, splitting across [`Adler32Config::threads`] scoped
/// worker threads once `data` is at least `threshold_bytes` long.
pub fn adler32_mt(data: &[u8], config: Adler32Config) -> u32 {
    if config.threads <= 1 || data.len() < config.threshold_bytes {
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
            handles.push(scope.spawn(move |_| (adler32(chunk), chunk.len() as u64)));
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
