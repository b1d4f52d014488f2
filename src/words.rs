// Word frequency over book titles

use jieba_rs::Jieba;
use std::collections::{HashMap, HashSet};

use crate::config::WordOptions;
use crate::ir::WordCount;

/// Splits a title into words
pub trait Segmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

impl Segmenter for Jieba {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.cut(text, true)
    }
}

pub struct WordCounter<S: Segmenter> {
    segmenter: S,
    stop_words: HashSet<String>,
    min_count: usize,
}

impl WordCounter<Jieba> {
    /// Counter backed by jieba's bundled dictionary
    pub fn jieba(options: &WordOptions) -> Self {
        Self::new(Jieba::new(), options)
    }
}

impl<S: Segmenter> WordCounter<S> {
    pub fn new(segmenter: S, options: &WordOptions) -> Self {
        Self {
            segmenter,
            stop_words: options.stop_words.iter().cloned().collect(),
            min_count: options.min_count,
        }
    }

    /// Count words of two or more characters across `titles`.
    ///
    /// Punctuation is stripped before segmentation and stop words are
    /// dropped. Words seen fewer than `min_count` times are left out. The
    /// result is ordered by descending count, ties in first-seen order.
    pub fn count<'t, I>(&self, titles: I) -> Vec<WordCount>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for title in titles {
            let cleaned: String = title.chars().filter(|c| !is_punctuation(*c)).collect();
            for word in self.segmenter.segment(&cleaned) {
                let word = word.trim();
                if word.chars().count() < 2 || self.stop_words.contains(word) {
                    continue;
                }
                let entry = counts.entry(word.to_string()).or_insert_with(|| {
                    order.push(word.to_string());
                    0
                });
                *entry += 1;
            }
        }

        let mut words: Vec<WordCount> = order
            .into_iter()
            .filter_map(|name| {
                let value = counts.get(&name).copied().unwrap_or(0);
                (value >= self.min_count).then_some(WordCount { name, value })
            })
            .collect();
        words.sort_by(|a, b| b.value.cmp(&a.value));
        words
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '，' | '。' | '！' | '？' | '、' | '；' | '：' | '“' | '”' | '‘' | '’' | '（' | '）'
                | '《' | '》' | '【' | '】' | '…' | '—' | '·' | '～' | '\u{3000}' | '\u{a0}'
        )
}
