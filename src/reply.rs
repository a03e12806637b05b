//! Tagged-line parser for the model's translation reply
//!
//! The prompt asks for exactly three lines:
//!
//! ```text
//! English: hello
//! Pinyin: nǐ hǎo
//! Chinese: 你好
//! ```
//!
//! Untagged lines are ignored and a later tag overrides an earlier one, since
//! models sometimes echo the example before answering. A reply that leaves any
//! field out is rejected rather than turned into a partial entry.

use thiserror::Error;
use worksheet_pdf::Entry;

const ENGLISH_TAG: &str = "English:";
const PINYIN_TAG: &str = "Pinyin:";
const CHINESE_TAG: &str = "Chinese:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("reply has no usable `{0}` line")]
    MissingField(&'static str),
}

/// One recognised line of the reply
#[derive(Debug, Clone, PartialEq, Eq)]
enum TaggedLine<'a> {
    English(&'a str),
    Pinyin(&'a str),
    Chinese(&'a str),
}

impl<'a> TaggedLine<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(ENGLISH_TAG) {
            Some(TaggedLine::English(rest.trim()))
        } else if let Some(rest) = line.strip_prefix(PINYIN_TAG) {
            Some(TaggedLine::Pinyin(rest.trim()))
        } else {
            line.strip_prefix(CHINESE_TAG)
                .map(|rest| TaggedLine::Chinese(rest.trim()))
        }
    }
}

/// Parse the model's reply into an entry.
pub fn parse_reply(text: &str) -> Result<Entry, ReplyError> {
    let mut english = None;
    let mut pinyin = None;
    let mut chinese = None;

    for tagged in text.lines().filter_map(TaggedLine::parse) {
        match tagged {
            TaggedLine::English(value) => english = Some(value),
            TaggedLine::Pinyin(value) => pinyin = Some(value),
            TaggedLine::Chinese(value) => chinese = Some(value),
        }
    }

    let english = english
        .filter(|v| !v.is_empty())
        .ok_or(ReplyError::MissingField("English"))?;
    let pinyin: Vec<String> = pinyin
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if pinyin.is_empty() {
        return Err(ReplyError::MissingField("Pinyin"));
    }
    let chinese: Vec<String> = chinese
        .unwrap_or_default()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(String::from)
        .collect();
    if chinese.is_empty() {
        return Err(ReplyError::MissingField("Chinese"));
    }

    Ok(Entry {
        english: english.to_string(),
        pinyin,
        chinese,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_reply() {
        let entry = parse_reply("English: hi\nPinyin: nǐ hǎo\nChinese: 你好").unwrap();
        assert_eq!(entry, Entry::new("hi", &["nǐ", "hǎo"], &["你", "好"]));
    }

    #[test]
    fn missing_chinese_line_is_rejected() {
        assert_eq!(
            parse_reply("English: hi\nPinyin: nǐ hǎo"),
            Err(ReplyError::MissingField("Chinese"))
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        assert_eq!(
            parse_reply("English:\nPinyin: nǐ\nChinese: 你"),
            Err(ReplyError::MissingField("English"))
        );
        assert_eq!(
            parse_reply("English: hi\nPinyin:   \nChinese: 你"),
            Err(ReplyError::MissingField("Pinyin"))
        );
    }

    #[test]
    fn chatter_and_indentation_are_ignored() {
        let reply = "Sure! Here is the translation.\n\n    English: cat\n    Pinyin:  māo \n    Chinese: 猫\n\nHope this helps.";
        let entry = parse_reply(reply).unwrap();
        assert_eq!(entry, Entry::new("cat", &["māo"], &["猫"]));
    }

    #[test]
    fn echoed_example_is_overridden_by_the_answer() {
        let reply = "English: hello\nPinyin: nǐ hǎo\nChinese: 你好\n\nEnglish: thank you\nPinyin: xiè xie\nChinese: 谢谢";
        let entry = parse_reply(reply).unwrap();
        assert_eq!(entry, Entry::new("thank you", &["xiè", "xie"], &["谢", "谢"]));
    }

    #[test]
    fn spaces_between_characters_are_dropped() {
        let entry = parse_reply("English: China\nPinyin: zhōng guó\nChinese: 中 国").unwrap();
        assert_eq!(entry.chinese, vec!["中", "国"]);
    }

    #[test]
    fn crlf_line_endings() {
        let entry = parse_reply("English: hi\r\nPinyin: nǐ hǎo\r\nChinese: 你好\r\n").unwrap();
        assert_eq!(entry.pinyin, vec!["nǐ", "hǎo"]);
    }

    #[test]
    fn tags_are_case_sensitive_prefixes() {
        assert_eq!(
            parse_reply("english: hi\npinyin: nǐ\nchinese: 你"),
            Err(ReplyError::MissingField("English"))
        );
    }
}
