//! SubRip (.srt) text codec.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;

use crate::subtitle::SubtitleBlock;

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})$").expect("valid timestamp regex")
});

pub fn format_timestamp(time: Duration) -> String {
    let ms = time.as_millis();
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

pub fn parse_timestamp(ts: &str) -> Result<Duration> {
    let caps = TIMESTAMP
        .captures(ts.trim())
        .ok_or_else(|| anyhow!("invalid timestamp {:?}", ts))?;

    let field = |i: usize| -> Result<u64> {
        Ok(caps[i].parse::<u64>()?)
    };
    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    // "5" after the comma means 500ms
    let frac = &caps[4];
    let millis = field(4)? * 10u64.pow(3 - frac.len() as u32);

    let total = hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| anyhow!("timestamp out of range {:?}", ts))?;

    Ok(Duration::from_millis(total))
}

/// Blank lines would end the block early, so they are dropped from content.
fn legal_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn compose(blocks: &[SubtitleBlock]) -> String {
    let mut out = String::new();

    for block in blocks {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            block.index,
            format_timestamp(block.start),
            format_timestamp(block.end),
            legal_content(&block.content)
        ));
    }

    out
}

pub fn parse(text: &str) -> Result<Vec<SubtitleBlock>> {
    let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut blocks = Vec::new();
    let mut lines = text.lines().enumerate().peekable();

    loop {
        // skip separators
        while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}
        let Some((line_no, index_line)) = lines.next() else {
            break;
        };

        let index: usize = index_line
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid block index {:?}", line_no + 1, index_line))?;

        let (time_no, time_line) = lines
            .next()
            .ok_or_else(|| anyhow!("block {}: missing time line", index))?;
        let (start, end) = time_line
            .split_once("-->")
            .ok_or_else(|| anyhow!("line {}: expected \"start --> end\"", time_no + 1))?;
        let start = parse_timestamp(start)
            .with_context(|| format!("block {}: bad start time", index))?;
        // players may append position hints after the end time
        let end = end.split_whitespace().next().unwrap_or_default();
        let end = parse_timestamp(end).with_context(|| format!("block {}: bad end time", index))?;

        let mut content = Vec::new();
        while let Some((_, line)) = lines.next_if(|(_, line)| !line.trim().is_empty()) {
            content.push(line);
        }

        blocks.push(SubtitleBlock::new(index, start, end, content.join("\n")));
    }

    Ok(blocks)
}

/// Summary used by the `check` command.
#[derive(Debug, PartialEq, Eq)]
pub struct Report {
    pub blocks: usize,
    pub span: Duration,
    pub contiguous: bool,
}

pub fn report(blocks: &[SubtitleBlock]) -> Result<Report> {
    if blocks.is_empty() {
        bail!("no subtitle blocks");
    }

    let first = blocks.iter().map(|b| b.start).min().unwrap_or_default();
    let last = blocks.iter().map(|b| b.end).max().unwrap_or_default();
    let contiguous = blocks.iter().zip(1..).all(|(b, i)| b.index == i);

    Ok(Report {
        blocks: blocks.len(),
        span: last.saturating_sub(first),
        contiguous,
    })
}
