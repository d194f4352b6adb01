use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{EncodeInput, Tokenizer};

/// XLM-RoBERTa `<pad>` id.
pub const PAD_ID: u32 = 1;

/// Tokenize one text, truncated or padded to exactly `max_len`.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    if ids.len() < max_len { let pad = max_len - ids.len(); ids.extend(std::iter::repeat(PAD_ID).take(pad)); mask.extend(std::iter::repeat(0).take(pad)); }
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}

/// Right-pad token rows to the longest row. Returns flat ids, flat mask and the
/// padded width.
pub fn pad_batch(rows: Vec<(Vec<u32>, Vec<u32>)>) -> (Vec<u32>, Vec<u32>, usize) {
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0);
    let mut flat_ids = Vec::with_capacity(rows.len() * width);
    let mut flat_mask = Vec::with_capacity(rows.len() * width);
    for (ids, mask) in rows {
        let pad = width - ids.len();
        flat_ids.extend(ids);
        flat_ids.extend(std::iter::repeat(PAD_ID).take(pad));
        flat_mask.extend(mask);
        flat_mask.extend(std::iter::repeat(0).take(pad));
    }
    (flat_ids, flat_mask, width)
}

/// Encode `(query, passage)` pairs into `[B, T]` id and mask tensors. Truncation
/// is whatever the tokenizer was configured with.
pub fn tokenize_pairs_on_device(tokenizer: &Tokenizer, pairs: &[(String, String)], device: &Device) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(pairs.len());
    for (query, passage) in pairs {
        let input: EncodeInput = (query.as_str(), passage.as_str()).into();
        let enc = tokenizer.encode(input, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        rows.push((enc.get_ids().to_vec(), enc.get_attention_mask().to_vec()));
    }
    let batch = rows.len();
    let (ids, mask, width) = pad_batch(rows);
    let input_ids = Tensor::from_vec(ids, (batch, width), device)?;
    let attention_mask = Tensor::from_vec(mask, (batch, width), device)?;
    Ok((input_ids, attention_mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_batch_pads_to_longest_row() {
        let (ids, mask, width) = pad_batch(vec![(vec![0, 5, 2], vec![1, 1, 1]), (vec![0, 2], vec![1, 1])]);
        assert_eq!(width, 3);
        assert_eq!(ids, vec![0, 5, 2, 0, 2, PAD_ID]);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 0]);
    }
}
