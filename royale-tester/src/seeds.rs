use anyhow::{Result, bail};
use royale_engine::RngBundle;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens: decimal, `0x`-prefixed hex, negative integers (by
/// magnitude), or `random` for a fresh entropy seed.
pub fn resolve_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.eq_ignore_ascii_case("random") {
            let seed = RngBundle::from_entropy().seed();
            log::info!("drew entropy seed {seed}");
            seeds.push(seed);
            continue;
        }
        if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
            match u64::from_str_radix(hex, 16) {
                Ok(value) => seeds.push(value),
                Err(_) => bail!("invalid hex seed `{token}`"),
            }
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            seeds.push(value);
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            seeds.push(value.unsigned_abs());
            continue;
        }
        bail!("invalid seed `{token}`");
    }
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    Ok(seeds)
}

/// Expand each base seed into `iterations` consecutive match seeds.
pub fn expand_iterations(seeds: &[u64], iterations: usize) -> Vec<u64> {
    let iterations = u64::try_from(iterations.max(1)).unwrap_or(1);
    seeds
        .iter()
        .flat_map(|seed| (0..iterations).map(move |offset| seed.wrapping_add(offset)))
        .collect()
}
