//! Heuristic recovery of structured items from generated text.
//!
//! Generated analyses are free text. These functions scan them for list
//! markers, known label prefixes and `Team vs Team` pairs. Nothing here is a
//! real parser: results are best-effort, and a short result is flagged as
//! low-yield so the caller can backfill from the analysis' raw sample.

use crate::models::{ExtractedEvent, ExtractedNews, ExtractionResult, Relevance};
use crate::utils::excerpt;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fewer items than this marks an extraction as low-yield.
pub const MIN_ITEMS: usize = 5;
pub const NEWS_CAP: usize = 15;
pub const EVENTS_CAP: usize = 10;
pub const BULLETS_CAP: usize = 8;

const DESCRIPTION_MAX: usize = 200;
const FALLBACK_EXCERPT: usize = 300;

/// Marker lines must be longer than this, in characters.
const MIN_MARKER_LINE: usize = 10;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\-\*•]\s*").expect("marker regex"));

static MARKER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\-\*•\.\)\s]+").expect("marker prefix regex"));

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[\*\-•]|\d+\.)").expect("bullet regex"));

/// A leading `Título:` / `Título original:` label.
static TITLE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:título|title)(?:\s+original)?\s*:\s*").expect("title label regex")
});

/// Attribute labels. A line opening with one of these describes the current
/// item rather than starting a new one.
static ATTRIBUTE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:por que é relevante[^:]*|relevance|relevância|impacto potencial[^:]*|impact|nível de urgência[^:]*|urgency|público-alvo[^:]*|audience)\s*:\s*",
    )
    .expect("attribute label regex")
});

static URGENCY_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:nível de urgência[^:]*|urgency)\s*:").expect("urgency regex"));

/// The `vs` / `v` / `x` between two team names.
static PAIR_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+(?:vs?\.?|x)[ \t]+").expect("pair separator regex"));

/// Words that never belong to a team name, even capitalized at the start of
/// a sentence.
const NAME_STOPWORDS: [&str; 22] = [
    "o", "a", "os", "as", "e", "no", "na", "nos", "nas", "do", "da", "dos", "das", "de", "em",
    "com", "para", "hoje", "amanhã", "jogo", "clássico", "destaque",
];

/// Longest team name kept, in words.
const MAX_NAME_WORDS: usize = 4;

fn strip_emphasis(s: &str) -> String {
    s.replace("**", "").replace("__", "").trim().to_string()
}

fn is_marker_line(line: &str) -> bool {
    MARKER.is_match(line) && line.chars().count() > MIN_MARKER_LINE
}

/// Split a raw word into its leading punctuation, core and trailing
/// punctuation.
fn word_core(word: &str) -> (bool, &str, bool) {
    let core = word.trim_matches(|c: char| !c.is_alphanumeric());
    let leading = !word.starts_with(core);
    let trailing = !word.ends_with(core);
    (leading, core, trailing)
}

fn name_word_ok(core: &str, first: bool) -> bool {
    let Some(c) = core.chars().next() else {
        return false;
    };
    if NAME_STOPWORDS.contains(&core.to_lowercase().as_str()) {
        return false;
    }
    // Only the word touching the separator may start lowercase ("paiN").
    c.is_alphabetic() && (first || c.is_uppercase())
}

/// Team name ending right before a separator, read backwards.
fn name_before(left: &str) -> Option<String> {
    let mut words = Vec::new();
    for (i, raw) in left.split_whitespace().rev().enumerate() {
        let (leading, core, trailing) = word_core(raw);
        if (i > 0 && trailing) || !name_word_ok(core, i == 0) || words.len() == MAX_NAME_WORDS {
            break;
        }
        words.push(core);
        if leading {
            break;
        }
    }
    words.reverse();
    (!words.is_empty()).then(|| words.join(" "))
}

/// Team name starting right after a separator.
fn name_after(right: &str) -> Option<String> {
    let mut words = Vec::new();
    for (i, raw) in right.split_whitespace().enumerate() {
        let (leading, core, trailing) = word_core(raw);
        if (i > 0 && leading) || !name_word_ok(core, i == 0) || words.len() == MAX_NAME_WORDS {
            break;
        }
        words.push(core);
        if trailing {
            break;
        }
    }
    (!words.is_empty()).then(|| words.join(" "))
}

/// Relevance implied by an urgency hint such as `Nível de urgência: Alto`.
pub fn relevance_hint(text: &str) -> Option<Relevance> {
    let lower = text.to_lowercase();
    if lower.contains("alt") || lower.contains("high") {
        Some(Relevance::High)
    } else if lower.contains("méd") || lower.contains("med") {
        Some(Relevance::Medium)
    } else if lower.contains("baix") || lower.contains("low") {
        Some(Relevance::Low)
    } else {
        None
    }
}

fn attribute_line(content: &str, current: &mut ExtractedNews) -> bool {
    if !ATTRIBUTE_LABEL.is_match(content) {
        return false;
    }
    if URGENCY_LABEL.is_match(content) {
        let value = ATTRIBUTE_LABEL.replace(content, "");
        if let Some(r) = relevance_hint(&value) {
            current.relevance = r;
        }
    }
    true
}

fn finish_news(mut item: ExtractedNews) -> ExtractedNews {
    item.description = item.description.map(|d| excerpt(&d, DESCRIPTION_MAX));
    item
}

/// News items from a curated news analysis.
///
/// A marker line opens an item; its title is the line without the marker,
/// a leading title label and emphasis. The plain lines that follow are joined
/// into the description. Attribute lines only adjust the relevance tag.
pub fn extract_news(text: &str) -> ExtractionResult<ExtractedNews> {
    let mut items: Vec<ExtractedNews> = Vec::new();
    let mut current: Option<ExtractedNews> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if is_marker_line(line) {
            let content = strip_emphasis(&MARKER_PREFIX.replace(line, ""));
            if let Some(cur) = current.as_mut() {
                if attribute_line(&content, cur) {
                    continue;
                }
            }
            let title = strip_emphasis(&TITLE_LABEL.replace(&content, ""));
            if let Some(done) = current.take() {
                items.push(finish_news(done));
            }
            current = Some(ExtractedNews {
                title: (!title.is_empty()).then_some(title),
                description: None,
                source: None,
                category: Some("Curado".to_string()),
                relevance: Relevance::High,
            });
            continue;
        }

        // Short list lines carry nothing worth keeping.
        if MARKER.is_match(line) {
            continue;
        }
        let Some(cur) = current.as_mut() else {
            continue;
        };
        let content = strip_emphasis(line);
        if line.starts_with("**") || attribute_line(&content, cur) {
            continue;
        }
        if content.is_empty() {
            continue;
        }
        cur.description = Some(match cur.description.take() {
            Some(desc) => format!("{desc} {content}"),
            None => content,
        });
    }
    if let Some(done) = current {
        items.push(finish_news(done));
    }

    items.truncate(NEWS_CAP);
    ExtractionResult {
        low_yield: items.len() < MIN_ITEMS,
        items,
    }
}

/// Matchups found anywhere in a curated events analysis.
///
/// Names are read outwards from each separator and stop at punctuation,
/// connector words or a lowercase word.
pub fn extract_events(text: &str) -> ExtractionResult<ExtractedEvent> {
    let items: Vec<ExtractedEvent> = text
        .lines()
        .flat_map(|line| {
            PAIR_SEPARATOR
                .find_iter(line)
                .filter_map(|sep| {
                    let home = name_before(&line[..sep.start()])?;
                    let away = name_after(&line[sep.end()..])?;
                    (!home.eq_ignore_ascii_case(&away)).then_some((home, away))
                })
                .collect::<Vec<_>>()
        })
        .map(|(home, away)| ExtractedEvent {
            home_team: Some(home),
            away_team: Some(away),
            league: Some("Curado por IA".to_string()),
            date: Some("Hoje/Amanhã".to_string()),
            time: Some("A definir".to_string()),
            sport: Some("Futebol/Diversos".to_string()),
            relevance: Relevance::High,
        })
        .take(EVENTS_CAP)
        .collect();
    ExtractionResult {
        low_yield: items.len() < MIN_ITEMS,
        items,
    }
}

/// Bullet lines of a market or strategy analysis, markers and emphasis
/// removed. Falls back to an excerpt of the whole text.
pub fn extract_bullets(text: &str) -> Vec<String> {
    let bullets: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| BULLET.is_match(l))
        .map(|l| strip_emphasis(&MARKER_PREFIX.replace(l, "")))
        .filter(|l| l.chars().count() > MIN_MARKER_LINE)
        .take(BULLETS_CAP)
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    if text.trim().is_empty() {
        return vec!["Análise não disponível".to_string()];
    }
    vec![format!("{}...", text.trim().chars().take(FALLBACK_EXCERPT).collect::<String>())]
}

/// Replace a low-yield extraction with the raw sample when the sample,
/// truncated to `cap`, is longer.
///
/// The resulting length is `max(extracted, min(sample, cap))`.
pub fn backfill<T>(result: ExtractionResult<T>, mut sample: Vec<T>, cap: usize) -> Vec<T> {
    let mut items = result.items;
    items.truncate(cap);
    if !result.low_yield {
        return items;
    }
    sample.truncate(cap);
    if sample.len() > items.len() { sample } else { items }
}
