//! Pre-retrieval query triage.
//!
//! Classifies an incoming query into a fast-path category before any
//! embedding call is made, so greetings, thanks, and other chit-chat never
//! pay for retrieval. Classification is an ordered table of
//! (category, predicate) rules evaluated first-match-wins over the trimmed,
//! lowercased query. The order is a policy choice, not an accident: pricing
//! is checked before the generic agreement words so that "the pricing looks
//! great" lands on pricing, not affirmative.
//!
//! The predicates are deterministic regexes; no ML model, no network calls.
//! Each category owns a fixed set of canned reply templates, picked
//! uniformly at random — tests inject an index picker instead.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Fast-path label assigned to a query. Exactly one category (possibly
/// [`TriageCategory::None`]) is assigned per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageCategory {
    Pricing,
    Thanks,
    Greeting,
    Affirmative,
    Negative,
    Test,
    Creator,
    Short,
    /// No fast path matched; the query proceeds to retrieval.
    None,
}

struct Rule {
    category: TriageCategory,
    matches: fn(&str) -> bool,
}

/// Evaluation order per the triage contract: pricing, thanks, greeting,
/// affirmative, negative, test, creator, short. First match wins.
static RULES: &[Rule] = &[
    Rule {
        category: TriageCategory::Pricing,
        matches: |q| PRICING_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Thanks,
        matches: |q| THANKS_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Greeting,
        matches: |q| GREETING_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Affirmative,
        matches: |q| AFFIRMATIVE_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Negative,
        matches: |q| NEGATIVE_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Test,
        matches: |q| TEST_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Creator,
        matches: |q| CREATOR_RE.is_match(q),
    },
    Rule {
        category: TriageCategory::Short,
        matches: |q| q.chars().count() <= 3,
    },
];

static PRICING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(price|prices|priced|pricing|cost|costs|fee|fees|rate|rates|charge|charges|subscription)\b|how\s+much|price\s+of").unwrap()
});

static THANKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(thanks|thank\s+you|thank\s+u|thx|ty|appreciate|appreciated|grateful)\b")
        .unwrap()
});

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(hi|hiya|hello|hey|howdy|greetings|good\s+(morning|afternoon|evening))\b|how\s+are\s+you|how\s+r\s+u|what'?s\s+up").unwrap()
});

// Whole-message matches only. A "contains" rule here would swallow phrases
// like "not sure" before the negative rule ever runs.
static AFFIRMATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ok|okay|k|sure|yes|yep|yeah|yup|y|great|good|cool|nice|fine|alright|awesome|perfect|sounds\s+good|got\s+it)[\s.!?]*$").unwrap()
});

static NEGATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(no|nope|nah)[\s.!?]*$|\b(not\s+sure|not\s+really|don'?t\s+know)\b").unwrap()
});

static TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(test|testing|ping|pong)\b").unwrap());

static CREATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"who\s+(created|built|made|developed|designed)|your\s+(creator|developer|maker|author)|who'?s\s+behind|who\s+is\s+behind").unwrap()
});

/// Classify a query. Pure and total: empty and arbitrarily odd strings
/// classify without error (the empty string is [`TriageCategory::Short`]).
pub fn classify(query: &str) -> TriageCategory {
    let q = query.trim().to_lowercase();
    for rule in RULES {
        if (rule.matches)(&q) {
            return rule.category;
        }
    }
    TriageCategory::None
}

/// Canned reply templates per category. `None` for
/// [`TriageCategory::None`], which has no fast path.
fn templates(category: TriageCategory) -> Option<&'static [&'static str]> {
    match category {
        TriageCategory::Pricing => Some(&[
            "Plan pricing is listed on the pricing page, which always has the current numbers. Tell me which plan you're looking at and I can help you compare.",
            "You'll find every plan and its price on the pricing page. Want help picking the right one?",
            "Pricing depends on the plan. Which one are you curious about?",
        ]),
        TriageCategory::Thanks => Some(&[
            "You're welcome! Anything else you'd like to know?",
            "Happy to help! Ask away if anything else comes up.",
            "Anytime! What else can I help you with?",
        ]),
        TriageCategory::Greeting => Some(&[
            "Hi there! Ask me anything about the site.",
            "Hello! What would you like to know?",
            "Hey! I answer questions about this site — fire away.",
        ]),
        TriageCategory::Affirmative => Some(&[
            "Great — what would you like to know next?",
            "Glad to hear it! Anything else I can help with?",
            "Sounds good. Ask me whenever you're ready.",
        ]),
        TriageCategory::Negative => Some(&[
            "No problem — feel free to ask me anything about the site.",
            "That's okay. If a question comes up later, I'm here.",
            "Alright. Let me know what you'd like to explore.",
        ]),
        TriageCategory::Test => Some(&[
            "Pong! I'm up and running.",
            "All systems go — ask me a real question whenever you're ready.",
            "Loud and clear. What would you like to know?",
        ]),
        TriageCategory::Creator => Some(&[
            "I was built by the team behind this site to answer questions about it.",
            "The site's developers put me together to help visitors find answers faster.",
            "I'm this site's assistant, built by the folks who run it.",
        ]),
        TriageCategory::Short => Some(&[
            "Could you give me a bit more detail? A full question helps me find the right answer.",
            "I need a little more to go on — what would you like to know?",
            "That's pretty brief! Try asking a complete question about the site.",
        ]),
        TriageCategory::None => None,
    }
}

/// Pick a canned reply for a category, uniformly at random.
///
/// Any template in the set is an acceptable reply; callers must not depend
/// on which one comes back.
pub fn canned_response(category: TriageCategory) -> Option<&'static str> {
    canned_response_with(category, |n| rand::rng().random_range(0..n))
}

/// Like [`canned_response`], but with an injected index picker (called with
/// the template count) so tests can pin the selection.
pub fn canned_response_with<F>(category: TriageCategory, pick: F) -> Option<&'static str>
where
    F: Fn(usize) -> usize,
{
    let set = templates(category)?;
    Some(set[pick(set.len()) % set.len()])
}
