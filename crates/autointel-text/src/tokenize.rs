/// A word token. `surface` keeps the original casing (entity heuristics need it),
/// `norm` is lower-cased with punctuation and possessive suffixes stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub norm: String,
    /// Position in the full (unfiltered) token stream.
    pub index: usize,
    pub sentence: usize,
    pub starts_sentence: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TokenizedText {
    pub sentences: Vec<String>,
    pub tokens: Vec<Token>,
}

impl TokenizedText {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSING_MARKS: [char; 6] = ['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];

/// Splits text into sentences on terminal punctuation followed by whitespace
/// (or end of text) and on blank lines. Decimal points such as "4.5" do not split.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let boundary = if SENTENCE_TERMINATORS.contains(&ch) {
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if SENTENCE_TERMINATORS.contains(&next) || CLOSING_MARKS.contains(&next) {
                    end = next_idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                None => Some(end),
                Some(&(_, next)) if next.is_whitespace() => Some(end),
                _ => None,
            }
        } else if ch == '\n' {
            match chars.peek() {
                Some(&(_, '\n')) | Some(&(_, '\r')) => Some(idx),
                _ => None,
            }
        } else {
            None
        };

        if let Some(end) = boundary {
            push_sentence(&mut sentences, &text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed);
    }
}

/// Tokenizes `text` into sentences and word tokens.
pub fn tokenize(text: &str) -> TokenizedText {
    let mut output = TokenizedText::default();

    for (sentence_idx, sentence) in split_sentences(text).into_iter().enumerate() {
        let mut first = true;
        for word in words(sentence) {
            let norm = normalize_word(word);
            if norm.is_empty() {
                continue;
            }
            let index = output.tokens.len();
            output.tokens.push(Token {
                surface: word.to_string(),
                norm,
                index,
                sentence: sentence_idx,
                starts_sentence: first,
            });
            first = false;
        }
        output.sentences.push(sentence.to_string());
    }

    output
}

/// Yields maximal runs of alphanumeric characters, allowing apostrophes inside a word.
fn words(sentence: &str) -> impl Iterator<Item = &str> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_alnum_end = 0;

    for (idx, ch) in sentence.char_indices() {
        if ch.is_alphanumeric() {
            if start.is_none() {
                start = Some(idx);
            }
            last_alnum_end = idx + ch.len_utf8();
        } else if is_apostrophe(ch) && start.is_some() {
            continue;
        } else if let Some(begin) = start.take() {
            spans.push(&sentence[begin..last_alnum_end]);
        }
    }
    if let Some(begin) = start {
        spans.push(&sentence[begin..last_alnum_end]);
    }

    spans.into_iter()
}

fn is_apostrophe(ch: char) -> bool {
    ch == '\'' || ch == '\u{2019}'
}

/// Lower-cases a word, unifies apostrophes and drops a possessive "'s".
pub fn normalize_word(word: &str) -> String {
    let mut lowered: String = word
        .chars()
        .map(|c| if is_apostrophe(c) { '\'' } else { c })
        .flat_map(char::to_lowercase)
        .collect();
    if lowered.ends_with("'s") {
        lowered.truncate(lowered.len() - 2);
    }
    lowered.trim_matches('\'').to_string()
}

/// Normalizes a phrase the same way record text is normalized.
pub fn normalize_phrase(phrase: &str) -> Vec<String> {
    words(phrase)
        .map(normalize_word)
        .filter(|norm| !norm.is_empty())
        .collect()
}
