//! 文本分块模块
//!
//! 把超过单次请求字符上限的文本切分为有序的分块。优先在句子边界切分，
//! 其次是子句标点，再次是单词之间的空白，实在找不到边界时才按上限硬切。
//!
//! 分块按顺序拼接后与原文完全一致：不丢字符、不重复、不调换顺序。
//! 长度以 Unicode 字符计，不会切在 UTF-8 序列中间。

/// 句末标点
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…', '。', '！', '？'];

/// 无需空白即可作为句子边界的全角句末标点
const CJK_TERMINATORS: &[char] = &['。', '！', '？'];

/// 子句标点
const CLAUSE_MARKS: &[char] = &[',', ';', ':', '，', '；', '：', '、'];

/// 全角子句标点
const CJK_CLAUSE_MARKS: &[char] = &['，', '；', '：', '、'];

/// 可以跟在句末标点之后的闭合引号和括号
const CLOSING_MARKS: &[char] = &['"', '\'', ')', ']', '}', '”', '’', '」', '』', '）', '》'];

/// 一个分块
///
/// `text` 是原文中一段连续的子串。发送给上游的只有去掉首尾空白后的 `body()`，
/// 首尾空白在重组时原样放回，保证换行和段落结构不被上游吞掉。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 分块序号，从 0 开始，决定重组顺序
    pub index: usize,
    /// 原文子串
    pub text: String,
    body_start: usize,
    body_end: usize,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed_end = text.trim_end().len();
        let (body_start, body_end) = if trimmed_end == 0 {
            (0, 0)
        } else {
            (text.len() - text.trim_start().len(), trimmed_end)
        };

        Self {
            index,
            text,
            body_start,
            body_end,
        }
    }

    /// 需要翻译的正文
    pub fn body(&self) -> &str {
        &self.text[self.body_start..self.body_end]
    }

    /// 正文之前的空白
    pub fn leading(&self) -> &str {
        &self.text[..self.body_start]
    }

    /// 正文之后的空白；纯空白分块的全部内容都在这里
    pub fn trailing(&self) -> &str {
        &self.text[self.body_end..]
    }

    /// 是否只有空白
    pub fn is_blank(&self) -> bool {
        self.body_start == self.body_end
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// 把译文放回该分块的空白之间
    pub fn wrap(&self, translated: &str) -> String {
        let mut out =
            String::with_capacity(self.leading().len() + translated.len() + self.trailing().len());
        out.push_str(self.leading());
        out.push_str(translated);
        out.push_str(self.trailing());
        out
    }
}

/// 切分点的质量，越大越好
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Hard,
    Word,
    Clause,
    Sentence,
}

/// 把文本切分为每块不超过 `max_size` 个字符的有序分块
///
/// 文本不超过上限时返回唯一的一块；空文本返回空列表。
/// `max_size` 为 0 时按 1 处理。
pub fn split(text: &str, max_size: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let max_size = max_size.max(1);
    let (offsets, chars): (Vec<usize>, Vec<char>) = text.char_indices().unzip();
    let total = chars.len();
    let byte_at = |i: usize| if i == total { text.len() } else { offsets[i] };

    let mut chunks = Vec::new();
    let mut start = 0;

    while total - start > max_size {
        let cut = find_cut(&chars, start, start + max_size);
        chunks.push(Chunk::new(chunks.len(), &text[byte_at(start)..byte_at(cut)]));
        start = cut;
    }
    chunks.push(Chunk::new(chunks.len(), &text[byte_at(start)..]));

    chunks
}

/// 在 `(start, limit]` 中选择切分点：最强的边界类型中最靠后的一个
///
/// 调用方保证 `limit < chars.len()`。
fn find_cut(chars: &[char], start: usize, limit: usize) -> usize {
    let mut best = (Boundary::Hard, limit);

    for i in (start + 1..=limit).rev() {
        let boundary = classify(chars, start, i);
        if boundary > best.0 {
            best = (boundary, i);
            if boundary == Boundary::Sentence {
                break;
            }
        }
    }

    best.1
}

/// 判断在 `chars[i - 1]` 和 `chars[i]` 之间切分属于哪种边界
fn classify(chars: &[char], start: usize, i: usize) -> Boundary {
    let prev = chars[i - 1];
    let next = chars[i];

    if prev.is_whitespace() && !next.is_whitespace() {
        let mut run_start = i - 1;
        while run_start > start && chars[run_start - 1].is_whitespace() {
            run_start -= 1;
        }

        if chars[run_start..i].contains(&'\n') {
            return Boundary::Sentence;
        }

        return match last_mark(chars, start, run_start) {
            Some(c) if SENTENCE_TERMINATORS.contains(&c) => Boundary::Sentence,
            Some(c) if CLAUSE_MARKS.contains(&c) => Boundary::Clause,
            _ => Boundary::Word,
        };
    }

    if !next.is_whitespace() {
        if CJK_TERMINATORS.contains(&prev) {
            return Boundary::Sentence;
        }
        if CJK_CLAUSE_MARKS.contains(&prev) {
            return Boundary::Clause;
        }
    }

    if prev == '\n' {
        Boundary::Word
    } else {
        Boundary::Hard
    }
}

/// 取 `end` 之前最后一个非闭合引号的字符，不越过 `start`
fn last_mark(chars: &[char], start: usize, end: usize) -> Option<char> {
    let mut j = end;
    while j > start {
        let c = chars[j - 1];
        if !CLOSING_MARKS.contains(&c) {
            return Some(c);
        }
        j -= 1;
    }
    None
}
