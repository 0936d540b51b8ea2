//! 重新开始时的洗牌
//!
//! 先整体随机排列，再至多做一次纠正交换，保证新一轮的第一个单词
//! 不是上一轮最后练习的单词。不做拒绝采样，必然终止。

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::WordEntry;

/// 打乱顺序，`avoid_first` 为上一轮最后练习的英文
pub fn reshuffle<R: Rng + ?Sized>(words: &mut [WordEntry], avoid_first: Option<&str>, rng: &mut R) {
    words.shuffle(rng);

    let Some(avoid) = avoid_first else {
        return;
    };
    if words.len() < 2 || words[0].english() != avoid {
        return;
    }

    // 只和内容不同的位置交换，重复单词也不会换回同一个词
    let candidates: Vec<usize> = (1..words.len())
        .filter(|&i| words[i].english() != avoid)
        .collect();

    if let Some(&swap_with) = candidates.choose(rng) {
        words.swap(0, swap_with);
    }
}
