//! Fashion knowledge base and reply generation for the stub service.
//!
//! Replies are picked by keyword category routing plus a lexical relevance
//! score (token overlap normalized like a cosine similarity over binary
//! bags). No model inference is involved; the bundled service is fully
//! deterministic.

use once_cell::sync::Lazy;
use std::collections::HashSet;

const TRENDS: &[&str] = &[
    "Oversized blazers are in style this season.",
    "Pastel colors are trending for spring.",
    "Sustainable fashion is becoming increasingly popular.",
    "Vintage and retro styles are making a comeback.",
    "Minimalist and capsule wardrobes are trending for their sustainability.",
];

const STYLES: &[(&str, &str)] = &[
    (
        "casual",
        "Casual style is all about comfort and simplicity. Think jeans, t-shirts, and sneakers. It's perfect for everyday wear.",
    ),
    (
        "formal",
        "Formal wear typically includes suits, dress shirts, formal shoes, and accessories like ties and cufflinks. For women, this could mean elegant dresses or pantsuits.",
    ),
    (
        "business",
        "Business attire is professional and polished. For men, this means dress shirts, slacks, and blazers. For women, it could be blouses, pencil skirts, or tailored pants.",
    ),
    (
        "bohemian",
        "Bohemian style features flowy fabrics, earthy tones, and eclectic patterns. Think maxi dresses, fringed vests, and layered jewelry.",
    ),
    (
        "athleisure",
        "Athleisure combines athletic wear with casual clothing. It includes items like yoga pants, hoodies, and sneakers that are both comfortable and stylish.",
    ),
];

const COLORS: &[&str] = &[
    "Neutral colors like beige, white, and gray are versatile and timeless.",
    "Bold colors can make a statement and add personality to your outfit.",
    "Earthy tones like olive green, terracotta, and mustard are great for a natural look.",
    "Jewel tones such as emerald, sapphire, and amethyst add richness to any outfit.",
];

const ACCESSORIES: &[&str] = &[
    "Statement jewelry can elevate any outfit.",
    "A good quality watch is a timeless accessory.",
    "Scarves can add color and texture to your look.",
    "A classic leather belt can tie an outfit together.",
    "Sunglasses are both stylish and practical for sunny days.",
];

const OUTFITS: &[&str] = &[
    "For a casual day out, try pairing light wash jeans with a white t-shirt and sneakers.",
    "A little black dress is perfect for any formal occasion and can be dressed up or down with accessories.",
    "For a business casual look, pair tailored trousers with a blouse and a blazer.",
    "Layering is key for transitional weather - try a denim jacket over a summer dress.",
];

const FALLBACKS: &[&str] = &[
    "I'm a fashion assistant. I can help you with fashion trends, styles, colors, and accessories.",
    "I'm not sure I understand. Could you rephrase your question about fashion?",
    "I'm here to help with fashion advice. Could you tell me more about what you're looking for?",
    "I specialize in fashion advice. You can ask me about trends, styles, colors, or outfit ideas.",
];

const GREETING_REPLY: &str =
    "Hello! I'm your fashion assistant. How can I help you with fashion today?";

const EMPTY_REPLY: &str =
    "I didn't receive any message. Could you please ask me something about fashion?";

/// Score above which a knowledge entry counts as a match.
const MATCH_THRESHOLD: f32 = 0.3;

/// Trend matches below this score return the full trends list instead.
const TREND_CONFIDENCE: f32 = 0.5;

/// Knowledge category, routed to by keywords in the user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Trends,
    Colors,
    Accessories,
    Outfits,
}

impl Category {
    fn entries(self) -> &'static [&'static str] {
        match self {
            Category::Trends => TRENDS,
            Category::Colors => COLORS,
            Category::Accessories => ACCESSORIES,
            Category::Outfits => OUTFITS,
        }
    }

    fn detect(tokens: &HashSet<String>) -> Option<Category> {
        if tokens.contains("trend") || tokens.contains("trends") || tokens.contains("trending") {
            Some(Category::Trends)
        } else if tokens.contains("color") || tokens.contains("colors") || tokens.contains("colour")
        {
            Some(Category::Colors)
        } else if tokens.contains("accessory") || tokens.contains("accessories") {
            Some(Category::Accessories)
        } else if tokens.contains("outfit") || tokens.contains("wear") || tokens.contains("dress") {
            Some(Category::Outfits)
        } else {
            None
        }
    }
}

/// Every searchable entry with its category, built once.
static SEARCH_INDEX: Lazy<Vec<(Category, &'static str)>> = Lazy::new(|| {
    let mut index = Vec::new();
    for category in [
        Category::Trends,
        Category::Colors,
        Category::Accessories,
        Category::Outfits,
    ] {
        for entry in category.entries() {
            index.push((category, *entry));
        }
    }
    // Style descriptions are searchable too; direct name mentions are
    // handled separately in generate_response.
    for &(_, description) in STYLES {
        index.push((Category::Outfits, description));
    }
    index
});

/// A generated reply plus diagnostics for the response metadata.
#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub response: String,
    pub matcher: &'static str,
    pub score: Option<f32>,
}

impl GeneratedReply {
    fn new(response: impl Into<String>, matcher: &'static str, score: Option<f32>) -> Self {
        Self {
            response: response.into(),
            matcher,
            score,
        }
    }
}

/// Generate a reply for one user message. The conversation history is
/// accepted by the endpoint but does not influence matching.
pub fn generate_response(message: &str) -> GeneratedReply {
    let message = message.trim();
    if message.is_empty() {
        return GeneratedReply::new(EMPTY_REPLY, "empty", None);
    }

    let tokens = tokenize(message);

    if ["hello", "hi", "hey"].iter().any(|g| tokens.contains(*g)) {
        return GeneratedReply::new(GREETING_REPLY, "greeting", None);
    }

    let category = Category::detect(&tokens);

    if let Some((matched_category, entry, score)) = best_match(&tokens, category) {
        if score > MATCH_THRESHOLD {
            if matched_category == Category::Trends && score < TREND_CONFIDENCE {
                let all_trends = format!(
                    "Here are some current fashion trends: {}",
                    TRENDS.join(" ")
                );
                return GeneratedReply::new(all_trends, "trends", Some(score));
            }
            return GeneratedReply::new(entry, "knowledge", Some(score));
        }
    }

    // Direct mention of a named style.
    if category.is_none() {
        let lowered = message.to_lowercase();
        for &(name, description) in STYLES {
            if lowered.contains(name) {
                return GeneratedReply::new(description, "style", None);
            }
        }
    }

    // No good match: pick the most relevant canned fallback.
    let fallback = FALLBACKS
        .iter()
        .copied()
        .max_by(|a, b| {
            overlap_score(&tokens, a)
                .partial_cmp(&overlap_score(&tokens, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(FALLBACKS[0]);

    GeneratedReply::new(fallback, "fallback", None)
}

/// Best-scoring entry, restricted to `category` when one was detected.
fn best_match(
    tokens: &HashSet<String>,
    category: Option<Category>,
) -> Option<(Category, &'static str, f32)> {
    SEARCH_INDEX
        .iter()
        .filter(|(cat, _)| category.is_none_or(|c| c == *cat))
        .map(|(cat, entry)| (*cat, *entry, overlap_score(tokens, entry)))
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Token overlap normalized by both set sizes, a lexical stand-in for
/// cosine similarity.
fn overlap_score(query: &HashSet<String>, entry: &str) -> f32 {
    let entry_tokens = tokenize(entry);
    if query.is_empty() || entry_tokens.is_empty() {
        return 0.0;
    }

    let shared = query.intersection(&entry_tokens).count() as f32;
    shared / ((query.len() as f32).sqrt() * (entry_tokens.len() as f32).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_recognized() {
        let reply = generate_response("hey there");
        assert_eq!(reply.response, GREETING_REPLY);
        assert_eq!(reply.matcher, "greeting");
    }

    #[test]
    fn empty_message_prompts_for_input() {
        let reply = generate_response("   ");
        assert_eq!(reply.response, EMPTY_REPLY);
        assert_eq!(reply.matcher, "empty");
    }

    #[test]
    fn weak_trend_match_returns_full_trend_list() {
        let reply = generate_response("any trends this season?");
        assert!(reply
            .response
            .starts_with("Here are some current fashion trends:"));
        assert_eq!(reply.matcher, "trends");
    }

    #[test]
    fn color_question_routes_to_color_entries() {
        let reply = generate_response("what colors are in?");
        assert!(COLORS.contains(&reply.response.as_str()));
        assert_eq!(reply.matcher, "knowledge");
    }

    #[test]
    fn named_style_returns_its_description() {
        let reply = generate_response("my vibe is bohemian");
        assert!(reply.response.contains("flowy fabrics"));
        assert_eq!(reply.matcher, "style");
    }

    #[test]
    fn off_topic_question_falls_back() {
        let reply = generate_response("how do I replace a bicycle tyre?");
        assert!(FALLBACKS.contains(&reply.response.as_str()));
        assert_eq!(reply.matcher, "fallback");
    }

    #[test]
    fn overlap_score_is_zero_for_disjoint_tokens() {
        let query = tokenize("quantum entanglement");
        assert_eq!(overlap_score(&query, "scarves add color"), 0.0);
    }

    #[test]
    fn overlap_score_is_one_for_identical_text() {
        let query = tokenize("statement jewelry");
        let score = overlap_score(&query, "statement jewelry");
        assert!((score - 1.0).abs() < f32::EPSILON);
    }
}
